//! Append-only record of dispatched commands

use crate::command::params::ParsedCommand;
use crate::command::result::ActionResult;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub command: ParsedCommand,
    pub raw_text: String,
    pub timestamp: NaiveDateTime,
    /// False when the command was rejected before any handler ran
    pub executed: bool,
    pub result: ActionResult,
}

/// Unbounded; callers that need a cap should trim externally
#[derive(Debug, Clone, Default)]
pub struct ActionHistory {
    entries: Vec<HistoryEntry>,
}

impl ActionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
