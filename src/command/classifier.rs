//! Rule-based intent classification
//!
//! Turns an utterance into a [`ParsedCommand`]:
//! normalize -> greeting/help short-circuit -> score every intent ->
//! pick the best -> run extractors -> compute confidence.
//!
//! Scoring is deterministic. A regex pattern hit scores 1.0 outright;
//! otherwise the score is the mean keyword credit, with synonyms consulted
//! when the keyword score is weak.

use crate::command::extract;
use crate::command::intent::Intent;
use crate::command::params::{ParamKey, ParamValue, Params, ParsedCommand, Utterance};
use crate::core::config::ClassifierConfig;
use crate::core::types::Task;
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

/// What the classifier may consult about the host application
#[derive(Debug, Clone, Copy)]
pub struct AppContext<'a> {
    pub now: NaiveDateTime,
    /// Known tasks, for task-name resolution
    pub tasks: Option<&'a [Task]>,
}

impl<'a> AppContext<'a> {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now, tasks: None }
    }

    pub fn with_tasks(mut self, tasks: &'a [Task]) -> Self {
        self.tasks = Some(tasks);
        self
    }
}

/// Matching rules for one intent
#[derive(Debug, Clone)]
pub struct IntentRule {
    pub intent: Intent,
    pub patterns: Vec<Regex>,
    pub keywords: Vec<String>,
    pub synonyms: Vec<String>,
}

impl IntentRule {
    pub fn new(intent: Intent, patterns: &[&str], keywords: &[&str], synonyms: &[&str]) -> Self {
        Self {
            intent,
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p).expect("valid intent pattern"))
                .collect(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }
}

static GREETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:hi|hello|hey|howdy|hiya|greetings|yo|sup|what'?s up|good\s+(?:morning|afternoon|evening))(?:\s+(?:there|buddy|friend))?[\s!.,]*$").expect("valid greeting pattern")
});
static HELP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:help|commands|\?)[\s!.?]*$|^(?:what can you do|how does this work|how do i use (?:this|you)|show (?:me\s+)?(?:the\s+)?commands)\b|\bi need help\b").expect("valid help pattern")
});


/// Built-in rule table, in intent declaration order
pub fn default_rules() -> Vec<IntentRule> {
    vec![
        IntentRule::new(
            Intent::CreateTask,
            &[r"^(?:please\s+)?(?:remind me to|(?:create|add|make) (?:a\s+)?(?:new\s+)?task|new task|i need to|i have to)\b"],
            &["create task", "add task", "new task", "remind me", "need to"],
            &["assignment", "homework", "todo", "due"],
        ),
        IntentRule::new(
            Intent::UpdateTask,
            &[r"^(?:please\s+)?(?:update|edit|modify|change)\s+(?:the\s+|my\s+)?(?:task\b|.+\s+(?:due|priority|course|name)\b)"],
            &["update task", "edit task", "change task"],
            &["modify", "rename", "update"],
        ),
        IntentRule::new(
            Intent::CompleteTask,
            &[
                r"^(?:please\s+)?(?:mark|set)\s+.+\s+(?:as\s+)?(?:done|complete|completed|finished)\b",
                r"^(?:i\s+)?(?:completed|finished|done with)\s+",
                r"^(?:complete|finish)\s+(?:the\s+)?task\b",
            ],
            &["mark done", "mark complete", "completed", "finished"],
            &["done", "complete", "check off"],
        ),
        IntentRule::new(
            Intent::EstimateTime,
            &[r"^how long (?:will|would|does|should)\b", r"^(?:please\s+)?estimate\b"],
            &["how long", "estimate time", "time estimate"],
            &["hours", "duration", "take me"],
        ),
        IntentRule::new(
            Intent::SetPriority,
            &[
                r"^(?:please\s+)?(?:set|make|change|mark)\s+.+\s+(?:to\s+|as\s+)?(?:a\s+)?(?:high|medium|low|urgent)(?:\s+priority)?\b",
                r"^prioriti[sz]e\b",
            ],
            &["set priority", "high priority", "low priority", "prioritize"],
            &["urgent", "important", "priority"],
        ),
        IntentRule::new(
            Intent::AddEvent,
            &[
                r"^(?:please\s+)?(?:schedule|book|plan)\s+(?:an?\s+|my\s+)?",
                r"^(?:please\s+)?(?:add|put)\s+.+\s+(?:to|on|in)\s+(?:my\s+)?(?:calendar|schedule)\b",
                r"^(?:please\s+)?(?:add|create)\s+(?:an?\s+)?(?:new\s+)?(?:event|meeting|appointment|session)\b",
            ],
            &["schedule event", "add event", "study session", "meeting"],
            &["appointment", "book", "calendar event", "block time"],
        ),
        IntentRule::new(
            Intent::ViewSchedule,
            &[
                r"^(?:what'?s|what is|show|view|see|check|display)\s+(?:me\s+)?(?:on\s+)?(?:my\s+)?(?:schedule|agenda)\b",
                r"^what(?:'s| is| do i have)\s+(?:on\s+)?(?:for\s+)?(?:today|tomorrow|this week|next week)\b",
                r"\bmy (?:schedule|agenda)\b",
            ],
            &["my schedule", "view schedule", "show schedule", "agenda"],
            &["plans", "events", "what's on"],
        ),
        IntentRule::new(
            Intent::Reschedule,
            &[
                r"^(?:please\s+)?(?:reschedule|postpone|push back)\b",
                r"^(?:please\s+)?move\s+.+\s+to\b",
            ],
            &["reschedule", "move to", "postpone"],
            &["push back", "delay", "shift"],
        ),
        IntentRule::new(
            Intent::SetReminder,
            &[r"^(?:please\s+)?(?:set (?:a\s+)?reminder|remind me (?:about|of))\b"],
            &["set reminder", "reminder", "remind me"],
            &["alert", "notify", "ping me"],
        ),
        IntentRule::new(
            Intent::ViewProgress,
            &[
                r"^(?:show|view|see|check|how(?:'s| is))\s+(?:me\s+)?(?:my\s+)?progress\b",
                r"^how am i doing\b",
            ],
            &["my progress", "progress", "how am i doing"],
            &["stats", "completion", "on track"],
        ),
        IntentRule::new(
            Intent::ViewPriorities,
            &[
                r"\b(?:my|show|view|list)\s+(?:top\s+)?priorities\b",
                r"^what should i (?:work on|do|focus on)\b",
            ],
            &["priorities", "most important", "what should i do"],
            &["focus on", "top tasks", "urgent tasks"],
        ),
        IntentRule::new(
            Intent::ViewDeadlines,
            &[
                r"\b(?:upcoming|my|show|view|list|any)\s+deadlines\b",
                r"^what(?:'s| is) due\b",
                r"\bwhat do i have due\b",
            ],
            &["deadlines", "due soon", "what's due"],
            &["due dates", "upcoming", "overdue"],
        ),
        IntentRule::new(
            Intent::TrackGoals,
            &[r"\b(?:track|set|view|show|my)\s+(?:my\s+)?goals?\b"],
            &["track goals", "my goals", "goal"],
            &["objective", "target", "milestone"],
        ),
        IntentRule::new(
            Intent::FindPeers,
            &[
                r"^(?:please\s+)?(?:find|search for|look for|show)\s+(?:me\s+)?(?:a\s+)?(?:study\s+)?(?:partners?|peers?|buddy|buddies|classmates|tutors?)\b",
                r"\bstudy (?:partner|buddy|buddies)\b",
            ],
            &["study partner", "find peers", "study buddy"],
            &["classmates", "tutor", "peers"],
        ),
        IntentRule::new(
            Intent::JoinGroup,
            &[r"^(?:please\s+)?(?:join|enter)\s+"],
            &["join group", "join study group"],
            &["sign up", "become member", "enroll"],
        ),
        IntentRule::new(
            Intent::CreateGroup,
            &[r"^(?:please\s+)?(?:create|start|make|form)\s+(?:a\s+|an\s+)?(?:new\s+)?(?:study\s+)?group\b"],
            &["create group", "start group", "new group"],
            &["form", "organize", "host"],
        ),
        IntentRule::new(
            Intent::GetTasks,
            &[
                r"^(?:show|list|view|see|get|display)\s+(?:me\s+)?(?:all\s+)?(?:of\s+)?(?:my\s+)?(?:tasks|assignments|to-?dos?|to-?do list)\b",
                r"^what are my (?:tasks|assignments)\b",
            ],
            &["my tasks", "list tasks", "show tasks", "assignments"],
            &["to do", "todo list", "homework list"],
        ),
        IntentRule::new(
            Intent::GetCalendar,
            &[r"^(?:open|show|view|display|go to)\s+(?:me\s+)?(?:my\s+|the\s+)?calendar\b"],
            &["calendar", "open calendar", "show calendar"],
            &["month view", "planner"],
        ),
        IntentRule::new(
            Intent::Search,
            &[r"^(?:please\s+)?(?:search|find|look up|lookup|look for)\b"],
            &["search", "find", "look up"],
            &["where is", "locate", "lookup"],
        ),
    ]
}

/// Credit for a list of phrases: 1.0 per exact phrase, otherwise 0.6 of
/// the fraction of its 3+ character words present, averaged over the list
pub fn phrase_score(text: &str, phrases: &[String]) -> f64 {
    if phrases.is_empty() {
        return 0.0;
    }
    let total: f64 = phrases
        .iter()
        .map(|phrase| {
            if text.contains(phrase.as_str()) {
                return 1.0;
            }
            let words: Vec<&str> = phrase.split_whitespace().filter(|w| w.len() >= 3).collect();
            if words.is_empty() {
                return 0.0;
            }
            let found = words.iter().filter(|w| text.contains(*w)).count();
            0.6 * found as f64 / words.len() as f64
        })
        .sum();
    total / phrases.len() as f64
}

/// Highest-scoring intent; earlier entries win ties
///
/// Returns `None` when the best score is at or below `threshold`.
pub fn select_best(scores: &[(Intent, f64)], threshold: f64) -> Option<(Intent, f64)> {
    let mut best: Option<(Intent, f64)> = None;
    for &(intent, score) in scores {
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((intent, score));
        }
    }
    best.filter(|(_, score)| *score > threshold)
}

/// Deterministic pattern and keyword classifier
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
    config: ClassifierConfig,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(default_rules(), ClassifierConfig::default())
    }
}

impl IntentClassifier {
    pub fn new(rules: Vec<IntentRule>, config: ClassifierConfig) -> Self {
        Self { rules, config }
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self::new(default_rules(), config)
    }

    /// Classify free text into a command
    pub fn classify(&self, text: &str, ctx: &AppContext<'_>) -> ParsedCommand {
        let Some(utterance) = Utterance::new(text) else {
            return ParsedCommand::unknown(ctx.now, "Invalid input: message is empty");
        };
        let normalized = utterance.normalized.as_str();

        if GREETING.is_match(normalized) {
            return ParsedCommand::new(Intent::Greeting, Params::new(), 1.0, ctx.now);
        }
        if HELP.is_match(normalized) {
            return ParsedCommand::new(Intent::Help, Params::new(), 1.0, ctx.now);
        }

        let scores = self.score_all(normalized);
        let Some((intent, score)) = select_best(&scores, self.config.unknown_threshold) else {
            tracing::debug!(text = normalized, "no intent above threshold");
            return ParsedCommand::unknown(ctx.now, "Could not determine what you want to do");
        };

        let parameters = self.extract(&utterance, intent, ctx);
        let confidence = confidence(intent, &parameters);
        tracing::debug!(%intent, score, confidence, params = parameters.len(), "classified");

        ParsedCommand::new(intent, parameters, confidence, ctx.now)
    }

    /// Score of every rule, in rule order
    pub fn score_all(&self, normalized: &str) -> Vec<(Intent, f64)> {
        self.rules
            .iter()
            .map(|rule| (rule.intent, self.score(rule, normalized)))
            .collect()
    }

    fn score(&self, rule: &IntentRule, text: &str) -> f64 {
        if rule.patterns.iter().any(|p| p.is_match(text)) {
            return 1.0;
        }
        let keyword = phrase_score(text, &rule.keywords);
        if keyword < self.config.keyword_fallback {
            let synonym = phrase_score(text, &rule.synonyms);
            return keyword.max(self.config.synonym_weight * synonym);
        }
        keyword
    }

    /// Run the generic extractors, then the ones specific to `intent`
    pub fn extract(&self, utterance: &Utterance, intent: Intent, ctx: &AppContext<'_>) -> Params {
        let text = utterance.normalized.as_str();
        let mut params = Params::new();

        params.insert(
            ParamKey::Title,
            extract::extract_title(utterance, intent).map(ParamValue::Text),
        );
        params.insert(
            date_key(intent),
            extract::extract_date(text, ctx.now.date()).map(ParamValue::Date),
        );
        params.insert(ParamKey::Time, extract::extract_time(text).map(ParamValue::Time));
        params.insert(
            ParamKey::Priority,
            extract::extract_priority(text).map(ParamValue::Priority),
        );
        params.insert(
            ParamKey::Course,
            extract::extract_course(utterance).map(ParamValue::Text),
        );
        params.insert(
            ParamKey::Duration,
            extract::extract_duration(text).map(ParamValue::Hours),
        );
        params.insert(
            ParamKey::TaskName,
            extract::resolve_task_name(text, ctx.tasks).map(ParamValue::Text),
        );

        match intent {
            Intent::EstimateTime => {
                params.insert(
                    ParamKey::Difficulty,
                    extract::extract_difficulty(text).map(ParamValue::Difficulty),
                );
                params.insert(
                    ParamKey::Focus,
                    extract::extract_focus(text).map(ParamValue::Focus),
                );
            }
            Intent::ViewSchedule | Intent::ViewProgress | Intent::ViewDeadlines => {
                params.insert(
                    ParamKey::Timeframe,
                    extract::extract_timeframe(text).map(ParamValue::Timeframe),
                );
            }
            Intent::FindPeers => {
                params.insert(
                    ParamKey::Topic,
                    extract::extract_topic(utterance).map(ParamValue::Text),
                );
                params.insert(
                    ParamKey::Availability,
                    extract::extract_availability(text).map(ParamValue::Text),
                );
            }
            Intent::JoinGroup | Intent::CreateGroup => {
                params.insert(
                    ParamKey::GroupName,
                    extract::extract_group_name(utterance, intent).map(ParamValue::Text),
                );
            }
            Intent::Search => {
                params.insert(
                    ParamKey::Query,
                    extract::extract_search_query(utterance).map(ParamValue::Text),
                );
            }
            _ => {}
        }

        // A phrase naming a task nobody has created yet still counts as a
        // reference; the dispatcher reports it as not found.
        if !params.contains(ParamKey::TaskName) {
            params.insert(
                ParamKey::TaskName,
                extract::extract_task_reference(utterance, intent).map(ParamValue::Text),
            );
        }

        params
    }
}

/// Which key a mentioned date is stored under
pub fn date_key(intent: Intent) -> ParamKey {
    match intent {
        Intent::AddEvent
        | Intent::ViewSchedule
        | Intent::Reschedule
        | Intent::SetReminder
        | Intent::GetCalendar => ParamKey::Date,
        _ => ParamKey::DueDate,
    }
}

/// 0.6 base, +0.08 per parameter (at most +0.32), +0.15 for a named
/// subject, +0.08 for a date; capped at 1.0. `unknown` is always 0.
pub fn confidence(intent: Intent, params: &Params) -> f64 {
    if intent == Intent::Unknown {
        return 0.0;
    }
    let mut value = 0.6 + (0.08 * params.len() as f64).min(0.32);
    if params.contains(ParamKey::Title) || params.contains(ParamKey::TaskName) {
        value += 0.15;
    }
    if params.contains(ParamKey::DueDate) || params.contains(ParamKey::Date) {
        value += 0.08;
    }
    value.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Priority;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        // Wednesday
        NaiveDate::from_ymd_opt(2026, 10, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn classify(text: &str) -> ParsedCommand {
        IntentClassifier::default().classify(text, &AppContext::new(now()))
    }

    #[test]
    fn test_all_default_patterns_compile() {
        let rules = default_rules();
        assert_eq!(rules.len(), 19);
        for rule in &rules {
            assert!(!rule.patterns.is_empty(), "{} has no compiled patterns", rule.intent);
        }
        assert!(GREETING.is_match("hello"));
        assert!(HELP.is_match("help"));
    }

    #[test]
    #[should_panic(expected = "valid intent pattern")]
    fn test_broken_pattern_is_rejected_at_construction() {
        IntentRule::new(Intent::Search, &[r"^(unclosed"], &["search"], &[]);
    }

    #[test]
    fn test_empty_input_is_unknown() {
        let cmd = classify("   ");
        assert_eq!(cmd.intent, Intent::Unknown);
        assert_eq!(cmd.confidence, 0.0);
        assert!(cmd.error.as_deref().unwrap().contains("Invalid input"));
    }

    #[test]
    fn test_greeting_and_help_short_circuit() {
        assert_eq!(classify("Hello there!").intent, Intent::Greeting);
        assert_eq!(classify("good morning").intent, Intent::Greeting);
        assert_eq!(classify("help").intent, Intent::Help);
        assert_eq!(classify("what can you do?").intent, Intent::Help);
    }

    #[test]
    fn test_remind_me_creates_task() {
        let cmd = classify("remind me to finish calculus homework tomorrow");
        assert_eq!(cmd.intent, Intent::CreateTask);
        assert_eq!(cmd.parameters.text(ParamKey::Title), Some("finish calculus homework"));
        assert_eq!(
            cmd.parameters.date(ParamKey::DueDate),
            Some(now().date() + Duration::days(1))
        );
    }

    #[test]
    fn test_schedule_query() {
        let cmd = classify("what's my schedule tomorrow");
        assert_eq!(cmd.intent, Intent::ViewSchedule);
        assert_eq!(cmd.parameters.date(ParamKey::Date), Some(now().date() + Duration::days(1)));
        assert_eq!(
            cmd.parameters.get(ParamKey::Timeframe),
            Some(&ParamValue::Timeframe(crate::command::params::Timeframe::Tomorrow))
        );
    }

    #[test]
    fn test_complete_task_resolves_known_task() {
        let tasks = vec![Task::new("Calculus Homework", now().date(), Priority::High, now())];
        let ctx = AppContext::new(now()).with_tasks(&tasks);
        let cmd = IntentClassifier::default().classify("mark calculus homework as done", &ctx);
        assert_eq!(cmd.intent, Intent::CompleteTask);
        assert_eq!(cmd.parameters.text(ParamKey::TaskName), Some("Calculus Homework"));
    }

    #[test]
    fn test_unmatched_reference_is_kept() {
        let cmd = classify("mark physics lab as done");
        assert_eq!(cmd.intent, Intent::CompleteTask);
        assert_eq!(cmd.parameters.text(ParamKey::TaskName), Some("physics lab"));
    }

    #[test]
    fn test_study_session_has_no_title() {
        let cmd = classify("schedule a 6 hour study session");
        assert_eq!(cmd.intent, Intent::AddEvent);
        assert_eq!(cmd.parameters.hours(), Some(6.0));
        assert!(!cmd.parameters.contains(ParamKey::Title));
        assert!(!cmd.parameters.contains(ParamKey::Date));
        assert!(!cmd.parameters.contains(ParamKey::Time));
    }

    #[test]
    fn test_gibberish_is_unknown() {
        let cmd = classify("purple monkey dishwasher");
        assert_eq!(cmd.intent, Intent::Unknown);
        assert_eq!(cmd.confidence, 0.0);
        assert!(cmd.parameters.is_empty());
        assert!(cmd.error.is_some());
    }

    #[test]
    fn test_phrase_score_partial_credit() {
        let phrases = vec!["study partner".to_string(), "find peers".to_string()];
        // exact first phrase, "find" of the second
        let score = phrase_score("find a study partner", &phrases);
        assert!((score - (1.0 + 0.3) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let scores = [(Intent::Search, 0.2)];
        assert_eq!(select_best(&scores, 0.2), None);
        let scores = [(Intent::Search, 0.2000001)];
        assert!(select_best(&scores, 0.2).is_some());
    }

    #[test]
    fn test_score_exactly_at_threshold_classifies_unknown() {
        let rules = vec![IntentRule::new(
            Intent::Search,
            &[],
            &["zulu", "yankee", "xray", "whiskey", "victor"],
            &[],
        )];
        let classifier = IntentClassifier::new(rules, ClassifierConfig::default());
        assert!((classifier.score_all("zulu")[0].1 - 0.2).abs() < 1e-12);
        assert_eq!(classifier.classify("zulu", &AppContext::new(now())).intent, Intent::Unknown);
    }

    #[test]
    fn test_ties_go_to_first_declared() {
        let scores = [(Intent::CreateTask, 1.0), (Intent::SetPriority, 1.0)];
        assert_eq!(select_best(&scores, 0.2).map(|(i, _)| i), Some(Intent::CreateTask));

        // Both patterns match; create_task is declared first
        let cmd = classify("make a task essay as high priority");
        assert_eq!(cmd.intent, Intent::CreateTask);
    }

    #[test]
    fn test_synonyms_rescue_weak_keywords() {
        let classifier = IntentClassifier::default();
        let scores = classifier.score_all("any milestone updates");
        let goals = scores.iter().find(|(i, _)| *i == Intent::TrackGoals).unwrap().1;
        // keyword credit 0, synonym credit 1/3
        assert!((goals - 0.8 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_grows_with_parameters() {
        let mut params = Params::new();
        let base = confidence(Intent::CreateTask, &params);
        params.insert(ParamKey::Priority, Some(ParamValue::Priority(Priority::High)));
        let one = confidence(Intent::CreateTask, &params);
        params.insert(ParamKey::Title, Some(ParamValue::Text("Essay".into())));
        let two = confidence(Intent::CreateTask, &params);
        params.insert(ParamKey::DueDate, Some(ParamValue::Date(now().date())));
        let three = confidence(Intent::CreateTask, &params);

        assert!((base - 0.6).abs() < 1e-9);
        assert!(base < one && one < two && two < three);
        assert!(three <= 1.0);
        assert_eq!(confidence(Intent::Unknown, &params), 0.0);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let a = classify("schedule a meeting called Project Sync on friday at 3pm");
        let b = classify("schedule a meeting called Project Sync on friday at 3pm");
        assert_eq!(a, b);
    }
}
