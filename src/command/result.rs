//! Outcome of dispatching a command

use crate::core::types::{GroupId, PeerId, TaskId};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    Error,
    Partial,
    NoAction,
}

/// What kind of change the host should expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    DataModified,
    ViewChanged,
    ModalOpened,
    NotificationSent,
    ComponentOpened,
    UiUpdated,
    Multiple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Tasks,
    Calendar,
    Schedule,
    Progress,
    Priorities,
    Deadlines,
    Peers,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modal {
    Goals,
    JoinGroup,
    CreateGroup,
    TimeEstimate,
}

/// One step of UI navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiStep {
    OpenView { view: View },
    OpenModal { modal: Modal },
    SelectTask { task_id: TaskId },
    SelectPeer { peer_id: PeerId },
    SelectGroup { group_id: GroupId },
}

/// A UI step the host should perform after applying the result
///
/// The dispatcher never sleeps; `delay_ms` is a hint for hosts that want
/// state updates to settle before navigating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UiTransition {
    #[serde(flatten)]
    pub step: UiStep,
    pub delay_ms: u64,
}

impl UiTransition {
    pub fn now(step: UiStep) -> Self {
        Self { step, delay_ms: 0 }
    }

    pub fn deferred(step: UiStep, delay_ms: u64) -> Self {
        Self { step, delay_ms }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub status: ActionStatus,
    pub action_type: ActionType,
    pub message: String,
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<UiTransition>,
    pub timestamp: NaiveDateTime,
}

impl ActionResult {
    pub fn new(
        status: ActionStatus,
        action_type: ActionType,
        message: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            status,
            action_type,
            message: message.into(),
            data: Map::new(),
            transitions: Vec::new(),
            timestamp,
        }
    }

    pub fn success(action_type: ActionType, message: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self::new(ActionStatus::Success, action_type, message, timestamp)
    }

    /// A recoverable failure reported to the user as a notification
    pub fn error(message: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self::new(ActionStatus::Error, ActionType::NotificationSent, message, timestamp)
    }

    pub fn partial(message: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self::new(ActionStatus::Partial, ActionType::NotificationSent, message, timestamp)
    }

    pub fn no_action(message: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self::new(ActionStatus::NoAction, ActionType::NotificationSent, message, timestamp)
    }

    /// Attach a data entry; values that fail to serialize are skipped
    pub fn with_data(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.data.insert(key.to_string(), value);
        }
        self
    }

    pub fn with_transition(mut self, transition: UiTransition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}
