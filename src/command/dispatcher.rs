//! Action dispatch
//!
//! Maps a classified command onto application state:
//! ParsedCommand -> Action -> handler -> ActionResult
//!
//! Handlers validate before they mutate, so a command that is missing
//! something never half-executes. Unrecognised input goes to the remote
//! interpreter; if that is unavailable the user gets a canned list of
//! things they can say instead of a transport error.

use crate::command::action::{Action, MissingParams, NewEvent, NewTask, PeerFilter, TaskChanges};
use crate::command::extract;
use crate::command::history::{ActionHistory, HistoryEntry};
use crate::command::params::{ParsedCommand, Timeframe};
use crate::command::result::{ActionResult, ActionType, Modal, UiStep, UiTransition, View};
use crate::command::state::AppState;
use crate::core::calendar::{describe_date, month_bounds, week_bounds, Clock, TimePeriod};
use crate::core::config::AssistantConfig;
use crate::core::error::{AssistError, Result};
use crate::core::types::{Difficulty, EventKind, FocusLevel, Priority, ScheduleEntry, Task};
use crate::llm::client::{ChatRequest, Interpreter};
use crate::llm::context::{qa_prompt, StudyContext};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;
use std::sync::Arc;

/// Commands offered when nothing else worked
pub const EXAMPLE_COMMANDS: &[&str] = &[
    "remind me to finish the calculus homework tomorrow",
    "schedule a study session on Friday at 3pm",
    "what's my schedule tomorrow",
    "mark the essay as done",
    "show my priorities",
    "find a study partner for CS 101",
];

const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
const DEFAULT_TRANSITION_DELAY_MS: u64 = 300;
const MAX_LISTED: usize = 5;

pub struct ActionDispatcher {
    interpreter: Option<Arc<dyn Interpreter>>,
    clock: Arc<dyn Clock>,
    history: ActionHistory,
    timeout: std::time::Duration,
    transition_delay_ms: u64,
}

impl ActionDispatcher {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            interpreter: None,
            clock,
            history: ActionHistory::new(),
            timeout: DEFAULT_TIMEOUT,
            transition_delay_ms: DEFAULT_TRANSITION_DELAY_MS,
        }
    }

    pub fn from_config(config: &AssistantConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            timeout: config.interpreter.timeout(),
            transition_delay_ms: config.ui.transition_delay_ms,
            ..Self::new(clock)
        }
    }

    pub fn with_interpreter(mut self, interpreter: Arc<dyn Interpreter>) -> Self {
        self.interpreter = Some(interpreter);
        self
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn interpreter(&self) -> Option<&Arc<dyn Interpreter>> {
        self.interpreter.as_ref()
    }

    pub fn timeout(&self) -> std::time::Duration {
        self.timeout
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Execute a command against `state` and record it in the history
    pub async fn execute(
        &mut self,
        command: &ParsedCommand,
        raw_text: &str,
        session_id: &str,
        state: &mut dyn AppState,
    ) -> ActionResult {
        let now = self.clock.now();
        let (result, executed) = match Action::from_command(command) {
            Ok(action) => {
                let result = self
                    .run(action, raw_text, session_id, state, now)
                    .await
                    .unwrap_or_else(|e| failure_result(&e, now));
                (result, true)
            }
            Err(missing) => (missing_result(&missing, now), false),
        };

        tracing::info!(
            intent = %command.intent,
            status = ?result.status,
            executed,
            "dispatched"
        );

        self.history.record(HistoryEntry {
            command: command.clone(),
            raw_text: raw_text.to_string(),
            timestamp: now,
            executed,
            result: result.clone(),
        });
        result
    }

    async fn run(
        &self,
        action: Action,
        raw_text: &str,
        session_id: &str,
        state: &mut dyn AppState,
        now: NaiveDateTime,
    ) -> Result<ActionResult> {
        let today = now.date();
        match action {
            Action::CreateTask(new) => self.create_task(new, state, now),
            Action::UpdateTask { task_name, changes } => update_task(&task_name, changes, state, now),
            Action::CompleteTask { task_name } => complete_task(&task_name, state, now),
            Action::EstimateTime { task_name, difficulty, focus } => {
                let result = estimate_time(&task_name, difficulty, focus, state, now)?;
                Ok(result.with_transition(self.deferred(UiStep::OpenModal { modal: Modal::TimeEstimate })))
            }
            Action::SetPriority { task_name, priority } => set_priority(&task_name, priority, state, now),
            Action::AddEvent(event) => self.add_event(event, state, now),
            Action::ViewSchedule { date, timeframe } => Ok(view_schedule(date, timeframe, state, now)),
            Action::Reschedule { task_name, date, time } => reschedule(&task_name, date, time, state, now),
            Action::SetReminder { title, date, time } => set_reminder(title, date, time, state, now),
            Action::ViewProgress { timeframe } => Ok(view_progress(timeframe, state, now)),
            Action::ViewPriorities => Ok(view_priorities(state, now)),
            Action::ViewDeadlines { timeframe } => Ok(view_deadlines(timeframe, state, now)),
            Action::TrackGoals { course } => Ok(track_goals(course, state, now)),
            Action::FindPeers(filter) => Ok(find_peers(&filter, state, now)),
            Action::JoinGroup { group_name } => self.join_group(&group_name, state, now),
            Action::CreateGroup { group_name, course } => Ok(create_group(group_name, course, now)),
            Action::GetTasks { course } => Ok(get_tasks(course, state, now)),
            Action::GetCalendar { date } => Ok(ActionResult::success(
                ActionType::ComponentOpened,
                "Opening your calendar.",
                now,
            )
            .with_data("date", date.unwrap_or(today))
            .with_transition(UiTransition::now(UiStep::OpenView { view: View::Calendar }))),
            Action::Search { query } => Ok(search(&query, state, now)),
            Action::Greeting => Ok(greeting(now)),
            Action::Help => Ok(help(now)),
            Action::Unknown => Ok(self.interpret_unknown(raw_text, session_id, state, now).await),
        }
    }

    fn deferred(&self, step: UiStep) -> UiTransition {
        UiTransition::deferred(step, self.transition_delay_ms)
    }

    fn create_task(&self, new: NewTask, state: &mut dyn AppState, now: NaiveDateTime) -> Result<ActionResult> {
        let mut task = Task::new(new.title, new.due_date, new.priority, now);
        task.course = new.course;
        task.estimated_time = new.estimated_hours;

        let message = format!(
            "Added \"{}\" due {} ({} priority).",
            task.name,
            describe_day(task.due_date, now.date()),
            task.priority
        );
        let id = task.id;
        let result = ActionResult::success(ActionType::DataModified, message, now)
            .with_data("task", &task)
            .with_transition(self.deferred(UiStep::SelectTask { task_id: id }));
        state.append_task(task)?;
        Ok(result)
    }

    fn add_event(&self, event: NewEvent, state: &mut dyn AppState, now: NaiveDateTime) -> Result<ActionResult> {
        let length = hours_to_duration(event.duration_hours.unwrap_or(1.0));
        let entry = ScheduleEntry {
            kind: event_kind(&event.title),
            title: event.title,
            start_time: event.start,
            end_time: end_time(event.start, length),
            priority: event.priority.unwrap_or(Priority::Medium),
        };

        let message = format!(
            "Scheduled \"{}\" on {} from {} to {}.",
            entry.title,
            describe_day(event.date, now.date()),
            entry.start_time.format("%H:%M"),
            entry.end_time.format("%H:%M")
        );
        let result = ActionResult::success(ActionType::DataModified, message, now)
            .with_data("date", event.date)
            .with_data("event", &entry)
            .with_transition(self.deferred(UiStep::OpenView { view: View::Calendar }));
        state.merge_schedule_entry(event.date, entry)?;
        Ok(result)
    }

    fn join_group(&self, name: &str, state: &mut dyn AppState, now: NaiveDateTime) -> Result<ActionResult> {
        let needle = name.to_lowercase();
        let group = state
            .groups()
            .iter()
            .find(|g| {
                let group = g.name.to_lowercase();
                group.contains(&needle) || needle.contains(&group)
            })
            .ok_or_else(|| AssistError::GroupNotFound(name.to_string()))?;

        Ok(ActionResult::success(
            ActionType::ModalOpened,
            format!("Opening \"{}\" so you can join.", group.name),
            now,
        )
        .with_data("group", group)
        .with_transition(UiTransition::now(UiStep::SelectGroup { group_id: group.id }))
        .with_transition(self.deferred(UiStep::OpenModal { modal: Modal::JoinGroup })))
    }

    /// Ask the remote interpreter; degrade to the canned reply on any failure
    async fn interpret_unknown(
        &self,
        raw_text: &str,
        session_id: &str,
        state: &dyn AppState,
        now: NaiveDateTime,
    ) -> ActionResult {
        if raw_text.trim().is_empty() {
            return failure_result(&AssistError::InvalidInput("the message is empty".into()), now);
        }
        let Some(interpreter) = &self.interpreter else {
            return canned_fallback(now);
        };

        let context = StudyContext::from_state(state, now);
        let request = ChatRequest::new(qa_prompt(raw_text, &context), session_id);

        match tokio::time::timeout(self.timeout, interpreter.ask(&request)).await {
            Ok(Ok(answer)) if !answer.trim().is_empty() => {
                ActionResult::success(ActionType::NotificationSent, answer, now)
                    .with_data("source", "interpreter")
            }
            Ok(Ok(_)) => {
                tracing::warn!("interpreter returned an empty answer");
                canned_fallback(now)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "interpreter request failed");
                canned_fallback(now)
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "interpreter timed out");
                canned_fallback(now)
            }
        }
    }
}

// === RESULTS ===

fn missing_result(missing: &MissingParams, now: NaiveDateTime) -> ActionResult {
    ActionResult::error(
        format!("I need a bit more information. {}", missing.questions.join(" ")),
        now,
    )
    .with_data("missing", missing.names())
    .with_data("questions", &missing.questions)
}

fn failure_result(err: &AssistError, now: NaiveDateTime) -> ActionResult {
    let message = match err {
        AssistError::TaskNotFound(name) => format!("I couldn't find a task matching \"{}\".", name),
        AssistError::EventNotFound(name) => format!("I couldn't find an event matching \"{}\".", name),
        AssistError::GroupNotFound(name) => format!("I couldn't find a group called \"{}\".", name),
        AssistError::MissingParameters(names) => format!("I still need: {}.", names.join(", ")),
        AssistError::InvalidInput(reason) => format!("That didn't work: {}.", reason),
        other => {
            tracing::warn!(error = %other, "handler failed");
            "Something went wrong. Please try again.".to_string()
        }
    };
    ActionResult::error(message, now)
}

pub fn canned_fallback(now: NaiveDateTime) -> ActionResult {
    let mut message = String::from("I'm not sure how to help with that. Try something like:");
    for example in EXAMPLE_COMMANDS {
        message.push_str(&format!("\n- {}", example));
    }
    ActionResult::partial(message, now).with_data("examples", EXAMPLE_COMMANDS)
}

// === TASK HANDLERS ===

/// A task by exact name, else by substring match either way
fn find_task<'a>(tasks: &'a [Task], name: &str) -> Result<&'a Task> {
    if let Some(task) = tasks.iter().find(|t| t.name.eq_ignore_ascii_case(name)) {
        return Ok(task);
    }
    extract::resolve_task_name(name, Some(tasks))
        .and_then(|resolved| tasks.iter().find(|t| t.name == resolved))
        .ok_or_else(|| AssistError::TaskNotFound(name.to_string()))
}

fn open_count(state: &dyn AppState) -> usize {
    state.tasks().iter().filter(|t| !t.completed).count()
}

fn update_task(
    name: &str,
    changes: TaskChanges,
    state: &mut dyn AppState,
    now: NaiveDateTime,
) -> Result<ActionResult> {
    let mut task = find_task(state.tasks(), name)?.clone();
    if changes.is_empty() {
        return Ok(ActionResult::no_action(
            format!("What would you like to change about \"{}\"?", task.name),
            now,
        ));
    }

    let mut described = Vec::new();
    if let Some(due) = changes.due_date {
        task.due_date = due;
        described.push(format!("due {}", describe_day(due, now.date())));
    }
    if let Some(priority) = changes.priority {
        task.priority = priority;
        described.push(format!("{} priority", priority));
    }
    if let Some(course) = changes.course {
        described.push(format!("course {}", course));
        task.course = Some(course);
    }
    if let Some(hours) = changes.estimated_hours {
        task.estimated_time = Some(hours);
        described.push(format!("estimate {}", format_hours(hours)));
    }

    let message = format!("Updated \"{}\": {}.", task.name, described.join(", "));
    let result = ActionResult::success(ActionType::DataModified, message, now).with_data("task", &task);
    state.update_task(task)?;
    Ok(result)
}

fn complete_task(name: &str, state: &mut dyn AppState, now: NaiveDateTime) -> Result<ActionResult> {
    let task = find_task(state.tasks(), name)?;
    if task.completed {
        return Ok(ActionResult::no_action(
            format!("\"{}\" is already marked as done.", task.name),
            now,
        ));
    }
    let (id, task_name) = (task.id, task.name.clone());
    state.complete_task(id)?;

    let remaining = open_count(state);
    let tail = match remaining {
        0 => "Nothing left on your list!".to_string(),
        n => format!("{} left.", plural(n, "task")),
    };
    Ok(ActionResult::success(
        ActionType::DataModified,
        format!("Marked \"{}\" as done. {}", task_name, tail),
        now,
    )
    .with_data("taskId", id)
    .with_data("remaining", remaining))
}

/// Hours for a task, rounded to the nearest half hour
pub fn estimate_hours(difficulty: Difficulty, focus: FocusLevel) -> f64 {
    (difficulty.base_hours() * focus.multiplier() * 2.0).round() / 2.0
}

fn estimate_time(
    name: &str,
    difficulty: Option<Difficulty>,
    focus: Option<FocusLevel>,
    state: &mut dyn AppState,
    now: NaiveDateTime,
) -> Result<ActionResult> {
    let mut task = find_task(state.tasks(), name)?.clone();
    let difficulty = difficulty.or(task.difficulty).unwrap_or(Difficulty::Medium);
    let focus = focus.or(task.focus).unwrap_or(FocusLevel::Medium);
    let hours = estimate_hours(difficulty, focus);

    task.difficulty = Some(difficulty);
    task.focus = Some(focus);
    let task = task.with_estimate(hours);

    let message = format!(
        "\"{}\" should take about {} ({} difficulty, {} focus).",
        task.name,
        format_hours(hours),
        difficulty.as_str(),
        focus.as_str()
    );
    let result = ActionResult::success(ActionType::DataModified, message, now)
        .with_data("hours", hours)
        .with_data("taskId", task.id);
    state.update_task(task)?;
    Ok(result)
}

fn set_priority(
    name: &str,
    priority: Priority,
    state: &mut dyn AppState,
    now: NaiveDateTime,
) -> Result<ActionResult> {
    let mut task = find_task(state.tasks(), name)?.clone();
    if task.priority == priority {
        return Ok(ActionResult::no_action(
            format!("\"{}\" is already {} priority.", task.name, priority),
            now,
        ));
    }
    task.priority = priority;
    let message = format!("Set \"{}\" to {} priority.", task.name, priority);
    let result = ActionResult::success(ActionType::DataModified, message, now).with_data("task", &task);
    state.update_task(task)?;
    Ok(result)
}

fn reschedule(
    name: &str,
    date: NaiveDate,
    time: Option<NaiveTime>,
    state: &mut dyn AppState,
    now: NaiveDateTime,
) -> Result<ActionResult> {
    let day = describe_day(date, now.date());

    let known = find_task(state.tasks(), name).ok().cloned();
    if let Some(mut task) = known {
        task.due_date = date;
        let message = format!("Moved \"{}\" to {}.", task.name, day);
        let result = ActionResult::success(ActionType::DataModified, message, now).with_data("task", &task);
        state.update_task(task)?;
        return Ok(result);
    }

    let (from, title) = state
        .schedule()
        .find_by_title(name)
        .map(|(d, e)| (d, e.title.clone()))
        .ok_or_else(|| AssistError::TaskNotFound(name.to_string()))?;
    let mut entry = state.take_schedule_entry(from, &title)?;
    if let Some(start) = time {
        let length = entry.end_time - entry.start_time;
        entry.start_time = start;
        entry.end_time = end_time(start, length);
    }

    let message = format!(
        "Moved \"{}\" to {} at {}.",
        entry.title,
        day,
        entry.start_time.format("%H:%M")
    );
    let result = ActionResult::success(ActionType::DataModified, message, now)
        .with_data("date", date)
        .with_data("event", &entry);
    state.merge_schedule_entry(date, entry)?;
    Ok(result)
}

fn set_reminder(
    title: String,
    date: NaiveDate,
    time: Option<NaiveTime>,
    state: &mut dyn AppState,
    now: NaiveDateTime,
) -> Result<ActionResult> {
    let at = time.unwrap_or_else(|| NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default());
    let entry = ScheduleEntry {
        title,
        start_time: at,
        end_time: at,
        kind: EventKind::Reminder,
        priority: Priority::Medium,
    };
    let message = format!(
        "I'll remind you about \"{}\" on {} at {}.",
        entry.title,
        describe_day(date, now.date()),
        at.format("%H:%M")
    );
    let result = ActionResult::success(ActionType::DataModified, message, now)
        .with_data("date", date)
        .with_data("reminder", &entry);
    state.merge_schedule_entry(date, entry)?;
    Ok(result)
}

// === VIEWS ===

/// Inclusive date range covered by a timeframe
pub fn timeframe_bounds(timeframe: Timeframe, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match timeframe {
        Timeframe::Today => (today, today),
        Timeframe::Tomorrow => {
            let t = today + Duration::days(1);
            (t, t)
        }
        Timeframe::ThisWeek => week_bounds(today),
        Timeframe::NextWeek => week_bounds(today + Duration::days(7)),
        Timeframe::ThisMonth => month_bounds(today),
    }
}

fn timeframe_label(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::Today => "today",
        Timeframe::Tomorrow => "tomorrow",
        Timeframe::ThisWeek => "this week",
        Timeframe::NextWeek => "next week",
        Timeframe::ThisMonth => "this month",
    }
}

fn view_schedule(
    date: Option<NaiveDate>,
    timeframe: Option<Timeframe>,
    state: &dyn AppState,
    now: NaiveDateTime,
) -> ActionResult {
    let today = now.date();
    let (from, to, label) = match (timeframe, date) {
        (Some(tf), _) => {
            let (from, to) = timeframe_bounds(tf, today);
            (from, to, timeframe_label(tf).to_string())
        }
        (None, Some(d)) => (d, d, describe_day(d, today)),
        (None, None) => (today, today, "today".to_string()),
    };

    let events = state.schedule().events_between(from, to);
    let message = if events.is_empty() {
        format!("You have no events scheduled for {}.", label)
    } else {
        let mut s = format!("Here's your schedule for {}:", label);
        for (day, event) in &events {
            let when = if from == to {
                String::new()
            } else {
                format!("{} ", describe_date(*day))
            };
            s.push_str(&format!(
                "\n- {}{}-{} {}",
                when,
                event.start_time.format("%H:%M"),
                event.end_time.format("%H:%M"),
                event.title
            ));
        }
        s
    };

    let listed: Vec<_> = events
        .iter()
        .map(|(day, event)| json!({"date": day, "event": event}))
        .collect();
    ActionResult::success(ActionType::ViewChanged, message, now)
        .with_data("from", from)
        .with_data("to", to)
        .with_data("events", listed)
        .with_transition(UiTransition::now(UiStep::OpenView { view: View::Schedule }))
}

fn view_progress(timeframe: Option<Timeframe>, state: &dyn AppState, now: NaiveDateTime) -> ActionResult {
    let bounds = timeframe.map(|tf| timeframe_bounds(tf, now.date()));
    let in_scope: Vec<&Task> = state
        .tasks()
        .iter()
        .filter(|t| bounds.map_or(true, |(from, to)| t.due_date >= from && t.due_date <= to))
        .collect();
    let total = in_scope.len();
    let done = in_scope.iter().filter(|t| t.completed).count();
    let scope = timeframe.map(|tf| format!(" due {}", timeframe_label(tf))).unwrap_or_default();

    let (message, percent) = if total == 0 {
        (format!("You don't have any tasks{} yet.", scope), 0)
    } else {
        let percent = (done as f64 * 100.0 / total as f64).round() as u32;
        (
            format!("You've completed {} of {}{} ({}%).", done, plural(total, "task"), scope, percent),
            percent,
        )
    };

    ActionResult::success(ActionType::ViewChanged, message, now)
        .with_data("completed", done)
        .with_data("total", total)
        .with_data("percent", percent)
        .with_transition(UiTransition::now(UiStep::OpenView { view: View::Progress }))
}

fn open_tasks_by_priority(state: &dyn AppState) -> Vec<&Task> {
    let mut open: Vec<&Task> = state.tasks().iter().filter(|t| !t.completed).collect();
    open.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.due_date.cmp(&b.due_date)));
    open
}

fn view_priorities(state: &dyn AppState, now: NaiveDateTime) -> ActionResult {
    let open = open_tasks_by_priority(state);
    if open.is_empty() {
        return ActionResult::no_action("You have no open tasks. Nice work!", now);
    }

    let mut message = String::from("Your top priorities:");
    for (i, task) in open.iter().take(MAX_LISTED).enumerate() {
        message.push_str(&format!(
            "\n{}. {} ({}, due {})",
            i + 1,
            task.name,
            task.priority,
            describe_day(task.due_date, now.date())
        ));
    }
    let names: Vec<&str> = open.iter().take(MAX_LISTED).map(|t| t.name.as_str()).collect();
    ActionResult::success(ActionType::ViewChanged, message, now)
        .with_data("tasks", names)
        .with_transition(UiTransition::now(UiStep::OpenView { view: View::Priorities }))
}

fn view_deadlines(timeframe: Option<Timeframe>, state: &dyn AppState, now: NaiveDateTime) -> ActionResult {
    let today = now.date();
    let until = match timeframe {
        Some(tf) => timeframe_bounds(tf, today).1,
        None => today + Duration::days(7),
    };
    let label = timeframe.map(timeframe_label).unwrap_or("in the next week");

    // Overdue work is always included
    let mut due: Vec<&Task> = state
        .tasks()
        .iter()
        .filter(|t| !t.completed && t.due_date <= until)
        .collect();
    due.sort_by_key(|t| t.due_date);

    if due.is_empty() {
        return ActionResult::no_action(format!("No deadlines {}.", label), now);
    }

    let mut message = format!("Deadlines {}:", label);
    for task in due.iter().take(MAX_LISTED) {
        let marker = if task.due_date < today { " (overdue)" } else { "" };
        message.push_str(&format!(
            "\n- {} due {}{}",
            task.name,
            describe_day(task.due_date, today),
            marker
        ));
    }
    let listed: Vec<_> = due
        .iter()
        .map(|t| json!({"name": t.name, "dueDate": t.due_date, "overdue": t.due_date < today}))
        .collect();
    ActionResult::success(ActionType::ViewChanged, message, now)
        .with_data("deadlines", listed)
        .with_transition(UiTransition::now(UiStep::OpenView { view: View::Deadlines }))
}

fn same_course(a: &str, b: &str) -> bool {
    let squash = |s: &str| s.split_whitespace().collect::<String>().to_uppercase();
    squash(a) == squash(b)
}

fn track_goals(course: Option<String>, state: &dyn AppState, now: NaiveDateTime) -> ActionResult {
    let tasks: Vec<&Task> = state
        .tasks()
        .iter()
        .filter(|t| match (&course, &t.course) {
            (Some(wanted), Some(have)) => same_course(wanted, have),
            (Some(_), None) => false,
            (None, _) => true,
        })
        .collect();
    let done = tasks.iter().filter(|t| t.completed).count();
    let scope = course.as_deref().map(|c| format!(" in {}", c)).unwrap_or_default();

    ActionResult::success(
        ActionType::ModalOpened,
        format!(
            "Opening your goals. You've completed {} of {}{}.",
            done,
            plural(tasks.len(), "task"),
            scope
        ),
        now,
    )
    .with_data("completed", done)
    .with_data("total", tasks.len())
    .with_data("course", course)
    .with_transition(UiTransition::now(UiStep::OpenModal { modal: Modal::Goals }))
}

fn find_peers(filter: &PeerFilter, state: &dyn AppState, now: NaiveDateTime) -> ActionResult {
    let contains = |items: &[String], wanted: &str| {
        let wanted = wanted.to_lowercase();
        items.iter().any(|item| item.to_lowercase().contains(&wanted))
    };
    let matches: Vec<_> = state
        .peers()
        .iter()
        .filter(|p| {
            filter
                .course
                .as_deref()
                .map_or(true, |c| p.courses.iter().any(|pc| same_course(pc, c)))
                && filter.topic.as_deref().map_or(true, |t| contains(p.topics.as_slice(), t))
                && filter
                    .availability
                    .as_deref()
                    .map_or(true, |a| contains(p.availability.as_slice(), a))
        })
        .collect();

    if matches.is_empty() {
        return ActionResult::no_action("I couldn't find any study partners matching that.", now);
    }

    let names: Vec<&str> = matches.iter().map(|p| p.name.as_str()).collect();
    let mut result = ActionResult::success(
        ActionType::ViewChanged,
        format!("Found {}: {}.", plural(matches.len(), "study partner"), names.join(", ")),
        now,
    )
    .with_data("peers", &names)
    .with_transition(UiTransition::now(UiStep::OpenView { view: View::Peers }));
    if let [only] = matches.as_slice() {
        result = result.with_transition(UiTransition::now(UiStep::SelectPeer { peer_id: only.id }));
    }
    result
}

fn create_group(name: Option<String>, course: Option<String>, now: NaiveDateTime) -> ActionResult {
    let message = match &name {
        Some(name) => format!("Let's set up \"{}\".", name),
        None => "Let's set up a new study group.".to_string(),
    };
    ActionResult::success(ActionType::ModalOpened, message, now)
        .with_data("groupName", name)
        .with_data("course", course)
        .with_transition(UiTransition::now(UiStep::OpenModal { modal: Modal::CreateGroup }))
}

fn get_tasks(course: Option<String>, state: &dyn AppState, now: NaiveDateTime) -> ActionResult {
    let mut open: Vec<&Task> = state
        .tasks()
        .iter()
        .filter(|t| !t.completed)
        .filter(|t| match (&course, &t.course) {
            (Some(wanted), Some(have)) => same_course(wanted, have),
            (Some(_), None) => false,
            (None, _) => true,
        })
        .collect();
    open.sort_by_key(|t| t.due_date);

    let message = if open.is_empty() {
        "You have no open tasks.".to_string()
    } else {
        let mut s = format!("You have {}:", plural(open.len(), "open task"));
        for task in &open {
            s.push_str(&format!("\n- {} (due {})", task.name, describe_day(task.due_date, now.date())));
        }
        s
    };
    ActionResult::success(ActionType::ViewChanged, message, now)
        .with_data("tasks", &open)
        .with_transition(UiTransition::now(UiStep::OpenView { view: View::Tasks }))
}

fn search(query: &str, state: &dyn AppState, now: NaiveDateTime) -> ActionResult {
    let needle = query.to_lowercase();
    let mut hits = Vec::new();
    for task in state.tasks() {
        let course_hit = task.course.as_deref().is_some_and(|c| c.to_lowercase().contains(&needle));
        if task.name.to_lowercase().contains(&needle) || course_hit {
            hits.push(json!({"type": "task", "name": task.name, "dueDate": task.due_date}));
        }
    }
    let (from, to) = (NaiveDate::MIN, NaiveDate::MAX);
    for (date, event) in state.schedule().events_between(from, to) {
        if event.title.to_lowercase().contains(&needle) {
            hits.push(json!({"type": "event", "name": event.title, "date": date}));
        }
    }

    if hits.is_empty() {
        return ActionResult::no_action(format!("Nothing matched \"{}\".", query), now);
    }
    ActionResult::success(
        ActionType::UiUpdated,
        format!("Found {} for \"{}\".", plural(hits.len(), "result"), query),
        now,
    )
    .with_data("query", query)
    .with_data("results", hits)
    .with_transition(UiTransition::now(UiStep::OpenView { view: View::Search }))
}

fn greeting(now: NaiveDateTime) -> ActionResult {
    use chrono::Timelike;
    let opener = match TimePeriod::from_hour(now.hour()) {
        TimePeriod::Morning => "Good morning!",
        TimePeriod::Afternoon => "Good afternoon!",
        TimePeriod::Evening => "Good evening!",
        TimePeriod::Night => "Hi there, burning the midnight oil?",
    };
    ActionResult::success(
        ActionType::NotificationSent,
        format!("{} What can I help you with?", opener),
        now,
    )
}

fn help(now: NaiveDateTime) -> ActionResult {
    let mut message = String::from(
        "I can manage your tasks, schedule, priorities and study groups. For example:",
    );
    for example in EXAMPLE_COMMANDS {
        message.push_str(&format!("\n- {}", example));
    }
    ActionResult::success(ActionType::NotificationSent, message, now).with_data("examples", EXAMPLE_COMMANDS)
}

// === FORMATTING ===

fn describe_day(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        _ => describe_date(date),
    }
}

const MINUTES_PER_DAY: i64 = 24 * 60;

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("1 {}", word)
    } else {
        format!("{} {}s", n, word)
    }
}

fn format_hours(hours: f64) -> String {
    if hours == 1.0 {
        "1 hour".to_string()
    } else if hours.fract() == 0.0 {
        format!("{} hours", hours as i64)
    } else {
        format!("{:.1} hours", hours)
    }
}

/// Lengths that do not fit a `Duration` are clamped to a full day
fn hours_to_duration(hours: f64) -> Duration {
    let minutes = (hours * 60.0).round();
    if !minutes.is_finite() || minutes >= MINUTES_PER_DAY as f64 {
        return Duration::minutes(MINUTES_PER_DAY);
    }
    Duration::try_minutes(minutes.max(0.0) as i64).unwrap_or_else(|| Duration::minutes(MINUTES_PER_DAY))
}

/// `start + length`, clamped to the end of the day
fn end_time(start: NaiveTime, length: Duration) -> NaiveTime {
    let (end, overflow) = start.overflowing_add_signed(length);
    if overflow != 0 {
        NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(end)
    } else {
        end
    }
}

fn event_kind(title: &str) -> EventKind {
    let title = title.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| title.contains(w));
    if has(&["exam", "midterm", "final", "quiz"]) {
        EventKind::Exam
    } else if has(&["class", "lecture", "lab", "seminar"]) {
        EventKind::Class
    } else if has(&["meeting", "sync", "office hours"]) {
        EventKind::Meeting
    } else if has(&["study", "review", "revision"]) {
        EventKind::Study
    } else {
        EventKind::Event
    }
}
