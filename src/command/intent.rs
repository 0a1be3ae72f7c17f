//! The closed set of things a user can ask for

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified purpose of an utterance
///
/// Declaration order is significant: when two intents score the same, the
/// one declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CreateTask,
    UpdateTask,
    CompleteTask,
    EstimateTime,
    SetPriority,
    AddEvent,
    ViewSchedule,
    Reschedule,
    SetReminder,
    ViewProgress,
    ViewPriorities,
    ViewDeadlines,
    TrackGoals,
    FindPeers,
    JoinGroup,
    CreateGroup,
    GetTasks,
    GetCalendar,
    Search,
    Greeting,
    Help,
    /// Could not determine intent
    Unknown,
}

impl Intent {
    /// Every intent, in declaration order
    pub const ALL: [Intent; 22] = [
        Intent::CreateTask,
        Intent::UpdateTask,
        Intent::CompleteTask,
        Intent::EstimateTime,
        Intent::SetPriority,
        Intent::AddEvent,
        Intent::ViewSchedule,
        Intent::Reschedule,
        Intent::SetReminder,
        Intent::ViewProgress,
        Intent::ViewPriorities,
        Intent::ViewDeadlines,
        Intent::TrackGoals,
        Intent::FindPeers,
        Intent::JoinGroup,
        Intent::CreateGroup,
        Intent::GetTasks,
        Intent::GetCalendar,
        Intent::Search,
        Intent::Greeting,
        Intent::Help,
        Intent::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CreateTask => "create_task",
            Intent::UpdateTask => "update_task",
            Intent::CompleteTask => "complete_task",
            Intent::EstimateTime => "estimate_time",
            Intent::SetPriority => "set_priority",
            Intent::AddEvent => "add_event",
            Intent::ViewSchedule => "view_schedule",
            Intent::Reschedule => "reschedule",
            Intent::SetReminder => "set_reminder",
            Intent::ViewProgress => "view_progress",
            Intent::ViewPriorities => "view_priorities",
            Intent::ViewDeadlines => "view_deadlines",
            Intent::TrackGoals => "track_goals",
            Intent::FindPeers => "find_peers",
            Intent::JoinGroup => "join_group",
            Intent::CreateGroup => "create_group",
            Intent::GetTasks => "get_tasks",
            Intent::GetCalendar => "get_calendar",
            Intent::Search => "search",
            Intent::Greeting => "greeting",
            Intent::Help => "help",
            Intent::Unknown => "unknown",
        }
    }

    /// Parse the wire name; anything unrecognised is `Unknown`
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|i| i.as_str() == name)
            .unwrap_or(Intent::Unknown)
    }

    /// Intents that only read state
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Intent::ViewSchedule
                | Intent::ViewProgress
                | Intent::ViewPriorities
                | Intent::ViewDeadlines
                | Intent::GetTasks
                | Intent::GetCalendar
                | Intent::Search
        )
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_matches_declaration_order() {
        assert_eq!(Intent::ALL[0], Intent::CreateTask);
        assert_eq!(Intent::ALL[21], Intent::Unknown);
    }

    #[test]
    fn test_wire_name_round_trips_through_serde() {
        for intent in Intent::ALL {
            let json = serde_json::to_string(&intent).unwrap();
            assert_eq!(json, format!("\"{}\"", intent.as_str()));
        }
    }

    #[test]
    fn test_from_name_is_lenient() {
        assert_eq!(Intent::from_name("create-task"), Intent::CreateTask);
        assert_eq!(Intent::from_name(" View Schedule "), Intent::ViewSchedule);
        assert_eq!(Intent::from_name("dance"), Intent::Unknown);
    }
}
