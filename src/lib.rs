//! Study Buddy - conversational command core for a study planner
//!
//! Natural-language requests are classified into intents, their
//! parameters extracted, and the resulting actions dispatched against the
//! application state. Incomplete requests are carried across turns.

pub mod command;
pub mod core;
pub mod llm;
pub mod session;
