//! Conversation state machine
//!
//! Each session is either idle or awaiting a follow-up. A command that is
//! complete is dispatched straight away; one that is missing required
//! parameters is parked in the [`SessionStore`] and the next utterance on
//! that session is read as the answer.

use crate::command::action::missing_params;
use crate::command::classifier::{confidence, AppContext, IntentClassifier};
use crate::command::dispatcher::ActionDispatcher;
use crate::command::extract;
use crate::command::history::ActionHistory;
use crate::command::intent::Intent;
use crate::command::params::{ParamKey, ParamValue, Params, ParsedCommand, Utterance};
use crate::command::result::ActionResult;
use crate::command::state::AppState;
use crate::core::calendar::Clock;
use crate::core::config::AssistantConfig;
use crate::llm::client::{ChatRequest, Interpreter, DEFAULT_SESSION};
use crate::llm::context::follow_up_prompt;
use crate::llm::parser::{parse_reply, StructuredReply};
use crate::session::store::{SessionContext, SessionStore};
use serde::Serialize;
use std::sync::Arc;

/// What the engine made of one utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub command: ParsedCommand,
    pub ready_to_execute: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<ParamKey>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<String>,
    /// Present when the command was dispatched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ActionResult>,
}

impl Interpretation {
    fn executed(command: ParsedCommand, result: ActionResult) -> Self {
        Self {
            command,
            ready_to_execute: true,
            missing: Vec::new(),
            questions: Vec::new(),
            result: Some(result),
        }
    }

    fn rejected(command: ParsedCommand) -> Self {
        Self {
            command,
            ready_to_execute: false,
            missing: Vec::new(),
            questions: Vec::new(),
            result: None,
        }
    }

    pub fn is_awaiting_follow_up(&self) -> bool {
        !self.ready_to_execute && !self.missing.is_empty()
    }
}

pub struct ConversationEngine<S: AppState> {
    classifier: IntentClassifier,
    dispatcher: ActionDispatcher,
    sessions: SessionStore,
    state: S,
}

impl<S: AppState> ConversationEngine<S> {
    pub fn new(state: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            classifier: IntentClassifier::default(),
            dispatcher: ActionDispatcher::new(clock),
            sessions: SessionStore::new(),
            state,
        }
    }

    pub fn from_config(config: &AssistantConfig, state: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            classifier: IntentClassifier::with_config(config.classifier.clone()),
            dispatcher: ActionDispatcher::from_config(config, clock),
            sessions: SessionStore::new(),
            state,
        }
    }

    pub fn with_interpreter(self, interpreter: Arc<dyn Interpreter>) -> Self {
        Self {
            dispatcher: self.dispatcher.with_interpreter(interpreter),
            ..self
        }
    }

    pub fn with_dispatcher(self, dispatcher: ActionDispatcher) -> Self {
        Self { dispatcher, ..self }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn history(&self) -> &ActionHistory {
        self.dispatcher.history()
    }

    pub fn clear_history(&mut self) {
        self.dispatcher.clear_history();
    }

    /// Interpret one utterance for a session, dispatching when complete
    pub async fn interpret(&mut self, text: &str, session_id: &str) -> Interpretation {
        let session_id = match session_id.trim() {
            "" => DEFAULT_SESSION,
            id => id,
        };
        let now = self.dispatcher.clock().now();

        // Empty input never dispatches and never touches the session.
        let Some(utterance) = Utterance::new(text) else {
            return Interpretation::rejected(ParsedCommand::unknown(
                now,
                "Invalid input: message is empty",
            ));
        };

        match self.sessions.remove(session_id) {
            Some(pending) => self.follow_up(pending, &utterance, session_id).await,
            None => self.fresh(&utterance, session_id).await,
        }
    }

    async fn fresh(&mut self, utterance: &Utterance, session_id: &str) -> Interpretation {
        let now = self.dispatcher.clock().now();
        let ctx = AppContext::new(now).with_tasks(self.state.tasks());
        let command = self.classifier.classify(&utterance.raw, &ctx);

        match missing_params(&command) {
            None => {
                let result = self
                    .dispatcher
                    .execute(&command, &utterance.raw, session_id, &mut self.state)
                    .await;
                Interpretation::executed(command, result)
            }
            Some(missing) => {
                tracing::debug!(
                    session = session_id,
                    intent = %command.intent,
                    missing = ?missing.names(),
                    "awaiting follow-up"
                );
                self.sessions.insert(
                    session_id,
                    SessionContext {
                        original_message: utterance.raw.clone(),
                        partial_command: command.clone(),
                        missing: missing.missing.clone(),
                        questions: missing.questions.clone(),
                        timestamp: now,
                    },
                );
                Interpretation {
                    command,
                    ready_to_execute: false,
                    missing: missing.missing,
                    questions: missing.questions,
                    result: None,
                }
            }
        }
    }

    /// Merge a follow-up answer into the pending command
    ///
    /// The pending entry has already been removed; it is only put back if
    /// the command is still incomplete.
    async fn follow_up(
        &mut self,
        pending: SessionContext,
        utterance: &Utterance,
        session_id: &str,
    ) -> Interpretation {
        let now = self.dispatcher.clock().now();
        let intent = pending.partial_command.intent;
        let mut params = pending.partial_command.parameters.clone();

        let ctx = AppContext::new(now).with_tasks(self.state.tasks());
        let answered = self.classifier.extract(utterance, intent, &ctx);
        fill_missing(&mut params, &pending.missing, &answered, utterance);

        let mut command = pending
            .partial_command
            .with_parameters(params.clone(), confidence(intent, &params), now);

        if let Some(still) = missing_params(&command) {
            if let Some(reply) = self.ask_remote(&pending, &command, &still.missing, utterance, session_id).await {
                if reply.intent != intent && reply.intent != Intent::Unknown {
                    tracing::debug!(remote = %reply.intent, %intent, "remote intent ignored");
                }
                // A value the interpreter itself reports as missing is a guess.
                for key in still.missing.iter().filter(|k| !reply.missing.contains(*k)) {
                    params.insert(*key, reply.parameters.get(*key).cloned());
                }
                command = command.with_parameters(params.clone(), confidence(intent, &params), now);
            }
        }

        match missing_params(&command) {
            None => {
                tracing::debug!(session = session_id, %intent, "follow-up complete");
                let raw = format!("{} {}", pending.original_message, utterance.raw);
                let result = self
                    .dispatcher
                    .execute(&command, &raw, session_id, &mut self.state)
                    .await;
                Interpretation::executed(command, result)
            }
            Some(missing) => {
                tracing::debug!(
                    session = session_id,
                    %intent,
                    missing = ?missing.names(),
                    "still awaiting follow-up"
                );
                self.sessions.insert(
                    session_id,
                    SessionContext {
                        original_message: pending.original_message,
                        partial_command: command.clone(),
                        missing: missing.missing.clone(),
                        questions: missing.questions.clone(),
                        timestamp: now,
                    },
                );
                Interpretation {
                    command,
                    ready_to_execute: false,
                    missing: missing.missing,
                    questions: missing.questions,
                    result: None,
                }
            }
        }
    }

    /// Structured completion from the remote interpreter, if one is configured
    async fn ask_remote(
        &self,
        pending: &SessionContext,
        command: &ParsedCommand,
        missing: &[ParamKey],
        utterance: &Utterance,
        session_id: &str,
    ) -> Option<StructuredReply> {
        let interpreter = self.dispatcher.interpreter()?;
        let prompt = follow_up_prompt(&pending.original_message, command, missing, &utterance.raw);
        let request = ChatRequest::new(prompt, session_id);

        match tokio::time::timeout(self.dispatcher.timeout(), interpreter.ask(&request)).await {
            Ok(Ok(reply)) => {
                let reply = parse_reply(&reply);
                reply.is_understood().then_some(reply)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "structured follow-up failed");
                None
            }
            Err(_) => {
                tracing::warn!("structured follow-up timed out");
                None
            }
        }
    }

    /// Force every session back to idle and reset the remote conversation
    pub async fn clear_conversation(&mut self, session_id: &str) {
        self.sessions.clear();
        if let Some(interpreter) = self.dispatcher.interpreter() {
            let reset = tokio::time::timeout(self.dispatcher.timeout(), interpreter.reset(session_id)).await;
            match reset {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "remote reset failed"),
                Err(_) => tracing::warn!("remote reset timed out"),
            }
        }
    }
}

/// Fill the keys in `missing` from a follow-up answer
///
/// Recognised values (dates, times, priorities, ...) come from `answered`.
/// The first free-text key still missing takes whatever is left of the
/// answer once those are removed.
pub fn fill_missing(params: &mut Params, missing: &[ParamKey], answered: &Params, utterance: &Utterance) {
    for key in missing {
        if !params.contains(*key) {
            params.insert(*key, answered.get(*key).cloned());
        }
    }
    if let Some(key) = missing
        .iter()
        .find(|k| k.is_free_text() && !params.contains(**k))
    {
        params.insert(*key, extract::residue(utterance).map(ParamValue::Text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::result::ActionStatus;
    use crate::command::state::InMemoryAppState;
    use crate::core::calendar::FixedClock;
    use crate::core::error::{AssistError, Result};
    use crate::core::types::Priority;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, NaiveTime};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn today() -> NaiveDate {
        // Wednesday
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn engine() -> ConversationEngine<InMemoryAppState> {
        ConversationEngine::new(InMemoryAppState::new(), Arc::new(FixedClock::on(today())))
    }

    struct Remote {
        reply: &'static str,
        resets: AtomicUsize,
    }

    #[async_trait]
    impl Interpreter for Remote {
        async fn ask(&self, _request: &ChatRequest) -> Result<String> {
            Ok(self.reply.to_string())
        }

        async fn reset(&self, _session_id: &str) -> Result<()> {
            self.resets.fetch_add(1, Ordering::SeqCst);
            Err(AssistError::Interpreter("offline".into()))
        }
    }

    #[tokio::test]
    async fn test_complete_command_runs_immediately() {
        let mut engine = engine();
        let out = engine
            .interpret("create task Essay due friday high priority", "s1")
            .await;

        assert!(out.ready_to_execute);
        assert_eq!(out.result.unwrap().status, ActionStatus::Success);
        assert!(!engine.sessions().is_awaiting("s1"));
        assert_eq!(engine.state().tasks[0].name, "Essay");
    }

    #[tokio::test]
    async fn test_study_session_follow_up() {
        let mut engine = engine();

        let first = engine.interpret("schedule a 6 hour study session", "s1").await;
        assert!(!first.ready_to_execute);
        assert_eq!(first.missing, vec![ParamKey::Title, ParamKey::Date, ParamKey::Time]);
        assert!(engine.sessions().is_awaiting("s1"));

        let second = engine.interpret("Biology, Friday at 3pm", "s1").await;
        assert!(second.ready_to_execute);
        assert_eq!(second.command.intent, Intent::AddEvent);
        assert_eq!(second.result.as_ref().unwrap().status, ActionStatus::Success);
        assert!(!engine.sessions().is_awaiting("s1"));

        let friday = today() + Duration::days(2);
        let events = engine.state().schedule.events_on(friday);
        assert_eq!(events[0].title, "Biology");
        assert_eq!(events[0].start_time, NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        assert_eq!(events[0].end_time, NaiveTime::from_hms_opt(21, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_partial_answer_stays_pending_with_new_questions() {
        let mut engine = engine();
        engine.interpret("schedule a 6 hour study session", "s1").await;

        let out = engine.interpret("friday", "s1").await;
        assert!(!out.ready_to_execute);
        assert_eq!(out.missing, vec![ParamKey::Title, ParamKey::Time]);
        let pending = engine.sessions().get("s1").unwrap();
        assert_eq!(pending.original_message, "schedule a 6 hour study session");
        assert_eq!(pending.missing, vec![ParamKey::Title, ParamKey::Time]);
    }

    #[tokio::test]
    async fn test_answers_accumulate_across_turns() {
        let mut engine = engine();
        let first = engine.interpret("create task Essay", "s1").await;
        assert_eq!(first.missing, vec![ParamKey::DueDate, ParamKey::Priority]);
        assert!(first.questions.iter().any(|q| q.contains("due")));

        let second = engine.interpret("tomorrow", "s1").await;
        assert_eq!(second.missing, vec![ParamKey::Priority]);

        let third = engine.interpret("high", "s1").await;
        assert!(third.ready_to_execute);
        let task = &engine.state().tasks[0];
        assert_eq!(task.name, "Essay");
        assert_eq!(task.due_date, today() + Duration::days(1));
        assert_eq!(task.priority, Priority::High);
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_state() {
        let mut engine = engine();
        engine.interpret("schedule a 6 hour study session", "a").await;
        let other = engine.interpret("show my tasks", "b").await;
        assert_eq!(other.command.intent, Intent::GetTasks);
        assert!(engine.sessions().is_awaiting("a"));
        assert!(!engine.sessions().is_awaiting("b"));
    }

    #[tokio::test]
    async fn test_empty_input_is_ignored() {
        let mut engine = engine();
        engine.interpret("schedule a 6 hour study session", "s1").await;
        let out = engine.interpret("   ", "s1").await;

        assert_eq!(out.command.intent, Intent::Unknown);
        assert!(out.result.is_none());
        assert!(engine.sessions().is_awaiting("s1"));
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_remote_fills_what_local_merge_cannot() {
        let remote = Arc::new(Remote {
            reply: r#"Sure! {"intent": "view_progress", "parameters": {"time": "15:00", "title": "Organic Chem Review"}}"#,
            resets: AtomicUsize::new(0),
        });
        let mut engine = engine().with_interpreter(remote);
        engine.interpret("schedule a 6 hour study session", "s1").await;

        let out = engine.interpret("friday", "s1").await;
        assert!(out.ready_to_execute);
        // intent of the original command is kept
        assert_eq!(out.command.intent, Intent::AddEvent);
        let friday = today() + Duration::days(2);
        assert_eq!(engine.state().schedule.events_on(friday)[0].title, "Organic Chem Review");
    }

    enum Broken {
        Fail,
        Hang,
    }

    #[async_trait]
    impl Interpreter for Broken {
        async fn ask(&self, _request: &ChatRequest) -> Result<String> {
            match self {
                Broken::Fail => Err(AssistError::Interpreter("connection refused".into())),
                Broken::Hang => {
                    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                    Ok("too late".into())
                }
            }
        }

        async fn reset(&self, _session_id: &str) -> Result<()> {
            Ok(())
        }
    }

    async fn assert_follow_up_stays_pending(mut engine: ConversationEngine<InMemoryAppState>) {
        engine.interpret("schedule a 6 hour study session", "s1").await;

        let out = engine.interpret("friday", "s1").await;
        assert!(!out.ready_to_execute);
        assert!(out.result.is_none());
        assert_eq!(out.missing, vec![ParamKey::Title, ParamKey::Time]);
        assert!(out.questions.iter().all(|q| !q.contains("connection") && !q.contains("late")));

        let pending = engine.sessions().get("s1").unwrap();
        assert_eq!(pending.missing, vec![ParamKey::Title, ParamKey::Time]);
        assert_eq!(
            pending.partial_command.parameters.date(ParamKey::Date),
            Some(today() + Duration::days(2))
        );
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_failed_remote_follow_up_keeps_newer_partial() {
        assert_follow_up_stays_pending(engine().with_interpreter(Arc::new(Broken::Fail))).await;
    }

    #[tokio::test]
    async fn test_timed_out_remote_follow_up_keeps_newer_partial() {
        let dispatcher = ActionDispatcher::new(Arc::new(FixedClock::on(today())))
            .with_interpreter(Arc::new(Broken::Hang))
            .with_timeout(std::time::Duration::from_millis(20));
        assert_follow_up_stays_pending(engine().with_dispatcher(dispatcher)).await;
    }

    #[tokio::test]
    async fn test_remote_values_it_reports_missing_are_ignored() {
        let remote = Arc::new(Remote {
            reply: r#"{"intent": "add_event", "parameters": {"time": "15:00", "title": "Session"}, "missing": ["title"]}"#,
            resets: AtomicUsize::new(0),
        });
        let mut engine = engine().with_interpreter(remote);
        engine.interpret("schedule a 6 hour study session", "s1").await;

        let out = engine.interpret("friday", "s1").await;
        assert_eq!(out.missing, vec![ParamKey::Title]);
        assert_eq!(out.command.parameters.time(), NaiveTime::from_hms_opt(15, 0, 0));
        assert!(!out.command.parameters.contains(ParamKey::Title));
    }

    #[tokio::test]
    async fn test_absurd_length_falls_back_to_default() {
        let mut engine = engine();
        let out = engine
            .interpret(
                "schedule a meeting called Sync on friday at 3pm for 10000000000000000 hours",
                "s1",
            )
            .await;

        assert!(!out.command.parameters.contains(ParamKey::Duration));
        assert_eq!(out.result.unwrap().status, ActionStatus::Success);
        let friday = today() + Duration::days(2);
        let event = &engine.state().schedule.events_on(friday)[0];
        assert_eq!(event.title, "Sync");
        assert_eq!(event.end_time, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_clear_conversation_forces_idle() {
        let remote = Arc::new(Remote {
            reply: "not json",
            resets: AtomicUsize::new(0),
        });
        let mut engine = engine().with_interpreter(remote.clone());
        engine.interpret("schedule a 6 hour study session", "a").await;
        engine.interpret("create task Essay", "b").await;
        assert_eq!(engine.sessions().len(), 2);

        engine.clear_conversation("a").await;
        assert!(engine.sessions().is_empty());
        assert_eq!(remote.resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fill_missing_uses_residue_for_free_text() {
        let mut params = Params::new();
        let answer = Utterance::new("Biology, Friday at 3pm").unwrap();
        let answered = Params::new()
            .with(ParamKey::Date, ParamValue::Date(today() + Duration::days(2)))
            .with(ParamKey::Course, ParamValue::Text("BIOLOGY".into()));
        fill_missing(&mut params, &[ParamKey::Title, ParamKey::Date], &answered, &answer);

        assert_eq!(params.text(ParamKey::Title), Some("Biology"));
        assert!(params.contains(ParamKey::Date));
        assert!(!params.contains(ParamKey::Course));
    }
}
