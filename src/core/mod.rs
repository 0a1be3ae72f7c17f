pub mod calendar;
pub mod config;
pub mod error;
pub mod types;

pub use calendar::{Clock, FixedClock, SystemClock, TimePeriod};
pub use config::AssistantConfig;
pub use error::{AssistError, Result};
