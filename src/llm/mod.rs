//! Remote interpretation service
//!
//! The rule-based classifier handles everything it can. The remote service
//! answers free-form questions and helps complete partial commands.

pub mod client;
pub mod context;
pub mod parser;

pub use client::{ChatClient, ChatRequest, Interpreter};
pub use context::StudyContext;
pub use parser::{parse_reply, StructuredReply};
