//! Typed per-intent actions
//!
//! A [`ParsedCommand`] carries a loose parameter bag. Before anything is
//! executed it is lifted into an [`Action`], where each variant holds only
//! the fields its intent understands and required fields are not optional.

use crate::command::intent::Intent;
use crate::command::params::{ParamKey, ParsedCommand, Timeframe};
use crate::core::error::AssistError;
use crate::core::types::{Difficulty, FocusLevel, Priority};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub course: Option<String>,
    pub estimated_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskChanges {
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub course: Option<String>,
    pub estimated_hours: Option<f64>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.due_date.is_none()
            && self.priority.is_none()
            && self.course.is_none()
            && self.estimated_hours.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub duration_hours: Option<f64>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeerFilter {
    pub course: Option<String>,
    pub topic: Option<String>,
    pub availability: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    CreateTask(NewTask),
    UpdateTask { task_name: String, changes: TaskChanges },
    CompleteTask { task_name: String },
    EstimateTime {
        task_name: String,
        difficulty: Option<Difficulty>,
        focus: Option<FocusLevel>,
    },
    SetPriority { task_name: String, priority: Priority },
    AddEvent(NewEvent),
    ViewSchedule {
        date: Option<NaiveDate>,
        timeframe: Option<Timeframe>,
    },
    Reschedule {
        task_name: String,
        date: NaiveDate,
        time: Option<NaiveTime>,
    },
    SetReminder {
        title: String,
        date: NaiveDate,
        time: Option<NaiveTime>,
    },
    ViewProgress { timeframe: Option<Timeframe> },
    ViewPriorities,
    ViewDeadlines { timeframe: Option<Timeframe> },
    TrackGoals { course: Option<String> },
    FindPeers(PeerFilter),
    JoinGroup { group_name: String },
    CreateGroup {
        group_name: Option<String>,
        course: Option<String>,
    },
    GetTasks { course: Option<String> },
    GetCalendar { date: Option<NaiveDate> },
    Search { query: String },
    Greeting,
    Help,
    Unknown,
}

/// Required parameters absent from a command, with a question for each
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingParams {
    pub missing: Vec<ParamKey>,
    pub questions: Vec<String>,
}

impl MissingParams {
    pub fn names(&self) -> Vec<String> {
        self.missing.iter().map(|k| k.as_str().to_string()).collect()
    }
}

impl From<MissingParams> for AssistError {
    fn from(missing: MissingParams) -> Self {
        AssistError::MissingParameters(missing.names())
    }
}

/// Parameters an intent cannot run without, in the order they are asked for
pub fn required_params(intent: Intent) -> &'static [ParamKey] {
    match intent {
        Intent::CreateTask => &[ParamKey::Title, ParamKey::DueDate, ParamKey::Priority],
        Intent::UpdateTask | Intent::CompleteTask | Intent::EstimateTime => &[ParamKey::TaskName],
        Intent::SetPriority => &[ParamKey::TaskName, ParamKey::Priority],
        Intent::AddEvent => &[ParamKey::Title, ParamKey::Date, ParamKey::Time],
        Intent::Reschedule => &[ParamKey::TaskName, ParamKey::Date],
        Intent::SetReminder => &[ParamKey::Title, ParamKey::Date],
        Intent::JoinGroup => &[ParamKey::GroupName],
        Intent::Search => &[ParamKey::Query],
        _ => &[],
    }
}

/// Clarifying question for a missing parameter
pub fn question_for(intent: Intent, key: ParamKey) -> &'static str {
    match (intent, key) {
        (Intent::AddEvent, ParamKey::Title) => "What is the event called?",
        (Intent::SetReminder, ParamKey::Title) => "What should I remind you about?",
        (_, ParamKey::Title) => "What should I call the task?",
        (_, ParamKey::DueDate) => "When is it due?",
        (Intent::Reschedule, ParamKey::Date) => "What day should I move it to?",
        (_, ParamKey::Date) => "What day is it on?",
        (_, ParamKey::Time) => "What time does it start?",
        (_, ParamKey::Priority) => "How important is it: high, medium, or low?",
        (_, ParamKey::TaskName) => "Which task do you mean?",
        (_, ParamKey::GroupName) => "Which group would you like to join?",
        (_, ParamKey::Query) => "What should I search for?",
        _ => "Could you tell me a bit more?",
    }
}

/// Missing required parameters of a command, or `None` when it can run
pub fn missing_params(command: &ParsedCommand) -> Option<MissingParams> {
    let missing: Vec<ParamKey> = required_params(command.intent)
        .iter()
        .copied()
        .filter(|key| !command.parameters.contains(*key))
        .collect();
    if missing.is_empty() {
        return None;
    }
    let questions = missing
        .iter()
        .map(|key| question_for(command.intent, *key).to_string())
        .collect();
    Some(MissingParams { missing, questions })
}

impl Action {
    /// Lift a parsed command into its typed action
    pub fn from_command(command: &ParsedCommand) -> Result<Self, MissingParams> {
        if let Some(missing) = missing_params(command) {
            return Err(missing);
        }
        let p = &command.parameters;
        let text = |key: ParamKey| p.text(key).map(str::to_string);
        // Only reached after the required-parameter check.
        let required = |key: ParamKey| text(key).unwrap_or_default();

        let action = match command.intent {
            Intent::CreateTask => match (p.date(ParamKey::DueDate), p.priority()) {
                (Some(due_date), Some(priority)) => Action::CreateTask(NewTask {
                    title: required(ParamKey::Title),
                    due_date,
                    priority,
                    course: text(ParamKey::Course),
                    estimated_hours: p.hours(),
                }),
                (due, priority) => {
                    return Err(malformed(
                        command.intent,
                        &[(ParamKey::DueDate, due.is_some()), (ParamKey::Priority, priority.is_some())],
                    ))
                }
            },
            Intent::UpdateTask => Action::UpdateTask {
                task_name: required(ParamKey::TaskName),
                changes: TaskChanges {
                    due_date: p.date(ParamKey::DueDate),
                    priority: p.priority(),
                    course: text(ParamKey::Course),
                    estimated_hours: p.hours(),
                },
            },
            Intent::CompleteTask => Action::CompleteTask {
                task_name: required(ParamKey::TaskName),
            },
            Intent::EstimateTime => Action::EstimateTime {
                task_name: required(ParamKey::TaskName),
                difficulty: p.difficulty(),
                focus: p.focus(),
            },
            Intent::SetPriority => match p.priority() {
                Some(priority) => Action::SetPriority {
                    task_name: required(ParamKey::TaskName),
                    priority,
                },
                None => return Err(malformed(command.intent, &[(ParamKey::Priority, false)])),
            },
            Intent::AddEvent => match (p.date(ParamKey::Date), p.time()) {
                (Some(date), Some(start)) => Action::AddEvent(NewEvent {
                    title: required(ParamKey::Title),
                    date,
                    start,
                    duration_hours: p.hours(),
                    priority: p.priority(),
                }),
                (date, start) => {
                    return Err(malformed(
                        command.intent,
                        &[(ParamKey::Date, date.is_some()), (ParamKey::Time, start.is_some())],
                    ))
                }
            },
            Intent::ViewSchedule => Action::ViewSchedule {
                date: p.date(ParamKey::Date),
                timeframe: p.timeframe(),
            },
            Intent::Reschedule => match p.date(ParamKey::Date) {
                Some(date) => Action::Reschedule {
                    task_name: required(ParamKey::TaskName),
                    date,
                    time: p.time(),
                },
                None => return Err(malformed(command.intent, &[(ParamKey::Date, false)])),
            },
            Intent::SetReminder => match p.date(ParamKey::Date) {
                Some(date) => Action::SetReminder {
                    title: required(ParamKey::Title),
                    date,
                    time: p.time(),
                },
                None => return Err(malformed(command.intent, &[(ParamKey::Date, false)])),
            },
            Intent::ViewProgress => Action::ViewProgress {
                timeframe: p.timeframe(),
            },
            Intent::ViewPriorities => Action::ViewPriorities,
            Intent::ViewDeadlines => Action::ViewDeadlines {
                timeframe: p.timeframe(),
            },
            Intent::TrackGoals => Action::TrackGoals {
                course: text(ParamKey::Course),
            },
            Intent::FindPeers => Action::FindPeers(PeerFilter {
                course: text(ParamKey::Course),
                topic: text(ParamKey::Topic),
                availability: text(ParamKey::Availability),
            }),
            Intent::JoinGroup => Action::JoinGroup {
                group_name: required(ParamKey::GroupName),
            },
            Intent::CreateGroup => Action::CreateGroup {
                group_name: text(ParamKey::GroupName),
                course: text(ParamKey::Course),
            },
            Intent::GetTasks => Action::GetTasks {
                course: text(ParamKey::Course),
            },
            Intent::GetCalendar => Action::GetCalendar {
                date: p.date(ParamKey::Date),
            },
            Intent::Search => Action::Search {
                query: required(ParamKey::Query),
            },
            Intent::Greeting => Action::Greeting,
            Intent::Help => Action::Help,
            Intent::Unknown => Action::Unknown,
        };
        Ok(action)
    }

    pub fn intent(&self) -> Intent {
        match self {
            Action::CreateTask(_) => Intent::CreateTask,
            Action::UpdateTask { .. } => Intent::UpdateTask,
            Action::CompleteTask { .. } => Intent::CompleteTask,
            Action::EstimateTime { .. } => Intent::EstimateTime,
            Action::SetPriority { .. } => Intent::SetPriority,
            Action::AddEvent(_) => Intent::AddEvent,
            Action::ViewSchedule { .. } => Intent::ViewSchedule,
            Action::Reschedule { .. } => Intent::Reschedule,
            Action::SetReminder { .. } => Intent::SetReminder,
            Action::ViewProgress { .. } => Intent::ViewProgress,
            Action::ViewPriorities => Intent::ViewPriorities,
            Action::ViewDeadlines { .. } => Intent::ViewDeadlines,
            Action::TrackGoals { .. } => Intent::TrackGoals,
            Action::FindPeers(_) => Intent::FindPeers,
            Action::JoinGroup { .. } => Intent::JoinGroup,
            Action::CreateGroup { .. } => Intent::CreateGroup,
            Action::GetTasks { .. } => Intent::GetTasks,
            Action::GetCalendar { .. } => Intent::GetCalendar,
            Action::Search { .. } => Intent::Search,
            Action::Greeting => Intent::Greeting,
            Action::Help => Intent::Help,
            Action::Unknown => Intent::Unknown,
        }
    }
}

// A required key was present but held a value of the wrong shape.
fn malformed(intent: Intent, checks: &[(ParamKey, bool)]) -> MissingParams {
    let missing: Vec<ParamKey> = checks.iter().filter(|(_, ok)| !ok).map(|(k, _)| *k).collect();
    let questions = missing
        .iter()
        .map(|key| question_for(intent, *key).to_string())
        .collect();
    MissingParams { missing, questions }
}
