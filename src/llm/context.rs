//! Gather study context for interpreter prompts
//!
//! Builds a short summary of the student's open work so the remote
//! interpreter can answer questions and resolve references.

use crate::command::params::{ParamKey, ParsedCommand};
use crate::command::state::AppState;
use crate::core::calendar::{describe_date, describe_datetime};
use chrono::NaiveDateTime;

/// Limit on tasks listed in a prompt
const MAX_TASKS: usize = 10;

const QA_INSTRUCTION: &str = "You are a friendly study assistant. Help the student plan their \
study and answer questions about their tasks and schedule. Use the context below and the \
current date and time. Never ask clarifying questions; answer as helpfully as you can.";

const STRUCTURED_INSTRUCTION: &str = "You complete partially specified commands for a study \
planner. Reply with a single JSON object and nothing else.";

/// Snapshot of application state for a prompt
#[derive(Debug, Clone, PartialEq)]
pub struct StudyContext {
    pub now: NaiveDateTime,
    /// One line per open task, soonest first
    pub open_tasks: Vec<String>,
    pub completed: usize,
    pub events_today: Vec<String>,
}

impl StudyContext {
    pub fn from_state(state: &dyn AppState, now: NaiveDateTime) -> Self {
        let mut open: Vec<_> = state.tasks().iter().filter(|t| !t.completed).collect();
        open.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(b.priority.cmp(&a.priority)));

        let open_tasks = open
            .iter()
            .take(MAX_TASKS)
            .map(|t| match &t.course {
                Some(course) => format!(
                    "{} ({}) due {}, {} priority",
                    t.name,
                    course,
                    describe_date(t.due_date),
                    t.priority
                ),
                None => format!("{} due {}, {} priority", t.name, describe_date(t.due_date), t.priority),
            })
            .collect();

        let events_today = state
            .schedule()
            .events_on(now.date())
            .iter()
            .map(|e| format!("{} at {}", e.title, e.start_time.format("%H:%M")))
            .collect();

        Self {
            now,
            open_tasks,
            completed: state.tasks().iter().filter(|t| t.completed).count(),
            events_today,
        }
    }

    pub fn empty(now: NaiveDateTime) -> Self {
        Self {
            now,
            open_tasks: Vec::new(),
            completed: 0,
            events_today: Vec::new(),
        }
    }

    pub fn summary(&self) -> String {
        let mut s = format!("Current date and time: {}\n", describe_datetime(self.now));

        if self.open_tasks.is_empty() {
            s.push_str("\nNo open tasks.\n");
        } else {
            s.push_str("\nOpen tasks:\n");
            for task in &self.open_tasks {
                s.push_str(&format!("- {}\n", task));
            }
        }
        if self.completed > 0 {
            s.push_str(&format!("Completed tasks: {}\n", self.completed));
        }

        if !self.events_today.is_empty() {
            s.push_str(&format!("\nToday: {}\n", self.events_today.join(", ")));
        }

        s
    }
}

/// Prompt for free-form questions the classifier could not place
pub fn qa_prompt(message: &str, context: &StudyContext) -> String {
    format!(
        "{}\n\n{}\nStudent: {}",
        QA_INSTRUCTION,
        context.summary(),
        message.trim()
    )
}

/// Prompt asking the interpreter to fill the gaps of a partial command
pub fn follow_up_prompt(
    original: &str,
    command: &ParsedCommand,
    missing: &[ParamKey],
    follow_up: &str,
) -> String {
    let known = serde_json::to_string(&command.parameters).unwrap_or_else(|_| "{}".into());
    let missing: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();

    format!(
        "{STRUCTURED_INSTRUCTION}\n\n\
         Current date and time: {now}\n\
         Original request: {original}\n\
         Intent: {intent}\n\
         Known parameters: {known}\n\
         Missing parameters: {missing}\n\
         Follow-up answer: {follow_up}\n\n\
         Dates are YYYY-MM-DD, times are HH:MM (24 hour), priority is high, medium or low, \
         duration is in hours.\n\
         OUTPUT FORMAT:\n\
         {{\"intent\": \"{intent}\", \"parameters\": {{...}}, \"missing\": [...]}}",
        now = describe_datetime(command.timestamp),
        original = original.trim(),
        intent = command.intent,
        missing = missing.join(", "),
        follow_up = follow_up.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::intent::Intent;
    use crate::command::params::{ParamValue, Params};
    use crate::command::state::InMemoryAppState;
    use crate::core::types::{Priority, Task};
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 14)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_empty_context() {
        let ctx = StudyContext::empty(now());
        let summary = ctx.summary();
        assert!(summary.contains("Wednesday, October 14, 2026 at 03:30 PM"));
        assert!(summary.contains("No open tasks"));
    }

    #[test]
    fn test_context_from_state_orders_by_due_date() {
        let today = now().date();
        let mut done = Task::new("Reading", today, Priority::Low, now());
        done.completed = true;
        let state = InMemoryAppState::new().with_tasks(vec![
            Task::new("Essay", today + Duration::days(3), Priority::High, now()),
            Task::new("Lab Report", today + Duration::days(1), Priority::Medium, now())
                .with_course("CHEM 101"),
            done,
        ]);

        let ctx = StudyContext::from_state(&state, now());
        assert_eq!(ctx.open_tasks.len(), 2);
        assert!(ctx.open_tasks[0].starts_with("Lab Report (CHEM 101)"));
        assert_eq!(ctx.completed, 1);
    }

    #[test]
    fn test_qa_prompt_carries_date_and_message() {
        let prompt = qa_prompt("  how should I study for finals? ", &StudyContext::empty(now()));
        assert!(prompt.starts_with("You are a friendly study assistant"));
        assert!(prompt.contains("Current date and time: Wednesday"));
        assert!(prompt.ends_with("Student: how should I study for finals?"));
    }

    #[test]
    fn test_follow_up_prompt_lists_missing() {
        let params = Params::new().with(ParamKey::Duration, ParamValue::Hours(6.0));
        let command = ParsedCommand::new(Intent::AddEvent, params, 0.7, now());
        let prompt = follow_up_prompt(
            "schedule a 6 hour study session",
            &command,
            &[ParamKey::Title, ParamKey::Date, ParamKey::Time],
            "Biology, Friday at 3pm",
        );
        assert!(prompt.contains("Intent: add_event"));
        assert!(prompt.contains("Known parameters: {\"duration\":6.0}"));
        assert!(prompt.contains("Missing parameters: title, date, time"));
        assert!(prompt.contains("Follow-up answer: Biology, Friday at 3pm"));
    }
}
