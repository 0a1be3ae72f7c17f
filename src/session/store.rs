//! Pending follow-ups, keyed by session id

use crate::command::params::{ParamKey, ParsedCommand};
use ahash::AHashMap;
use chrono::NaiveDateTime;

/// A partially specified command waiting for the user's answer
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub original_message: String,
    pub partial_command: ParsedCommand,
    pub missing: Vec<ParamKey>,
    pub questions: Vec<String>,
    pub timestamp: NaiveDateTime,
}

/// Holds one entry per session that is awaiting a follow-up
///
/// A session with no entry is idle. Entries never expire on their own.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    pending: AHashMap<String, SessionContext>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, session_id: &str) -> Option<&SessionContext> {
        self.pending.get(session_id)
    }

    pub fn is_awaiting(&self, session_id: &str) -> bool {
        self.pending.contains_key(session_id)
    }

    /// Store or replace the pending command for a session
    pub fn insert(&mut self, session_id: &str, context: SessionContext) {
        self.pending.insert(session_id.to_string(), context);
    }

    pub fn remove(&mut self, session_id: &str) -> Option<SessionContext> {
        self.pending.remove(session_id)
    }

    /// Drop every pending command
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::intent::Intent;
    use crate::command::params::Params;
    use chrono::NaiveDate;

    fn context(message: &str) -> SessionContext {
        let ts = NaiveDate::from_ymd_opt(2026, 10, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        SessionContext {
            original_message: message.into(),
            partial_command: ParsedCommand::new(Intent::AddEvent, Params::new(), 0.6, ts),
            missing: vec![ParamKey::Title],
            questions: vec!["What is the event called?".into()],
            timestamp: ts,
        }
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut store = SessionStore::new();
        store.insert("a", context("first"));
        store.insert("b", context("second"));

        assert!(store.is_awaiting("a"));
        assert_eq!(store.remove("a").unwrap().original_message, "first");
        assert!(!store.is_awaiting("a"));
        assert!(store.is_awaiting("b"));
    }

    #[test]
    fn test_insert_replaces() {
        let mut store = SessionStore::new();
        store.insert("a", context("first"));
        store.insert("a", context("again"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().original_message, "again");

        store.clear();
        assert!(store.is_empty());
    }
}
