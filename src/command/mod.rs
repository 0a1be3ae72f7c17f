//! Command pipeline
//!
//! Turns an utterance into an executed action:
//! text -> IntentClassifier -> ParsedCommand -> Action -> ActionDispatcher -> ActionResult

pub mod action;
pub mod classifier;
pub mod dispatcher;
pub mod extract;
pub mod history;
pub mod intent;
pub mod params;
pub mod result;
pub mod state;

pub use action::{Action, MissingParams};
pub use classifier::{AppContext, IntentClassifier};
pub use dispatcher::ActionDispatcher;
pub use history::{ActionHistory, HistoryEntry};
pub use intent::Intent;
pub use params::{ParamKey, ParamValue, Params, ParsedCommand, Timeframe, Utterance};
pub use result::{ActionResult, ActionStatus, ActionType, UiStep, UiTransition};
pub use state::{AppState, InMemoryAppState};
