//! Per-session conversation flow: idle or awaiting a follow-up

pub mod engine;
pub mod store;

pub use engine::{ConversationEngine, Interpretation};
pub use store::{SessionContext, SessionStore};
