//! Structured output of classification
//!
//! A [`ParsedCommand`] is built once by the classifier and never mutated
//! afterwards; follow-ups produce a new command.

use crate::command::intent::Intent;
use crate::core::types::{Difficulty, FocusLevel, Priority};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Raw user text plus its normalized (trimmed, lower-cased) form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub raw: String,
    pub normalized: String,
}

impl Utterance {
    /// Returns `None` for empty or whitespace-only input
    pub fn new(text: &str) -> Option<Self> {
        let raw = text.trim();
        if raw.is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            normalized: raw.to_lowercase(),
        })
    }
}

/// Name of an extracted parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamKey {
    Title,
    DueDate,
    Date,
    Time,
    Priority,
    Course,
    Duration,
    TaskName,
    Difficulty,
    Focus,
    Timeframe,
    Topic,
    Availability,
    GroupName,
    Query,
}

impl ParamKey {
    pub const ALL: [ParamKey; 15] = [
        ParamKey::Title,
        ParamKey::DueDate,
        ParamKey::Date,
        ParamKey::Time,
        ParamKey::Priority,
        ParamKey::Course,
        ParamKey::Duration,
        ParamKey::TaskName,
        ParamKey::Difficulty,
        ParamKey::Focus,
        ParamKey::Timeframe,
        ParamKey::Topic,
        ParamKey::Availability,
        ParamKey::GroupName,
        ParamKey::Query,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::Title => "title",
            ParamKey::DueDate => "dueDate",
            ParamKey::Date => "date",
            ParamKey::Time => "time",
            ParamKey::Priority => "priority",
            ParamKey::Course => "course",
            ParamKey::Duration => "duration",
            ParamKey::TaskName => "taskName",
            ParamKey::Difficulty => "difficulty",
            ParamKey::Focus => "focus",
            ParamKey::Timeframe => "timeframe",
            ParamKey::Topic => "topic",
            ParamKey::Availability => "availability",
            ParamKey::GroupName => "groupName",
            ParamKey::Query => "query",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Keys whose value is free text rather than a recognised shape
    pub fn is_free_text(&self) -> bool {
        matches!(
            self,
            ParamKey::Title | ParamKey::TaskName | ParamKey::GroupName | ParamKey::Query | ParamKey::Topic
        )
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative window for schedule and progress views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Today,
    Tomorrow,
    ThisWeek,
    NextWeek,
    ThisMonth,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Today => "today",
            Timeframe::Tomorrow => "tomorrow",
            Timeframe::ThisWeek => "this_week",
            Timeframe::NextWeek => "next_week",
            Timeframe::ThisMonth => "this_month",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace(' ', "_").as_str() {
            "today" => Some(Timeframe::Today),
            "tomorrow" => Some(Timeframe::Tomorrow),
            "this_week" | "week" => Some(Timeframe::ThisWeek),
            "next_week" => Some(Timeframe::NextWeek),
            "this_month" | "month" => Some(Timeframe::ThisMonth),
            _ => None,
        }
    }
}

/// A typed parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Date(NaiveDate),
    Time(#[serde(serialize_with = "serialize_hhmm")] NaiveTime),
    /// Hours, possibly fractional
    Hours(f64),
    Priority(Priority),
    Difficulty(Difficulty),
    Focus(FocusLevel),
    Timeframe(Timeframe),
}

fn serialize_hhmm<S: serde::Serializer>(
    time: &NaiveTime,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.format("%H:%M").to_string())
}

impl ParamValue {
    /// Empty text is treated as absent
    fn is_empty(&self) -> bool {
        matches!(self, ParamValue::Text(s) if s.trim().is_empty())
    }

    /// Interpret a loosely-typed JSON value for `key`
    ///
    /// Used for replies from the interpretation service. Nulls, empty
    /// strings and values of the wrong shape yield `None`.
    pub fn from_json(key: ParamKey, value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        let text = match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        };

        match key {
            ParamKey::DueDate | ParamKey::Date => text
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
                .map(ParamValue::Date),
            ParamKey::Time => text
                .and_then(|s| {
                    NaiveTime::parse_from_str(&s, "%H:%M")
                        .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
                        .ok()
                })
                .map(ParamValue::Time),
            ParamKey::Duration => match value {
                Value::Number(n) => n.as_f64().filter(|h| *h > 0.0).map(ParamValue::Hours),
                Value::String(s) => s.trim().parse::<f64>().ok().filter(|h| *h > 0.0).map(ParamValue::Hours),
                _ => None,
            },
            ParamKey::Priority => text.and_then(|s| match s.to_lowercase().as_str() {
                "high" => Some(ParamValue::Priority(Priority::High)),
                "medium" => Some(ParamValue::Priority(Priority::Medium)),
                "low" => Some(ParamValue::Priority(Priority::Low)),
                _ => None,
            }),
            ParamKey::Difficulty => text.and_then(|s| match s.to_lowercase().as_str() {
                "easy" => Some(ParamValue::Difficulty(Difficulty::Easy)),
                "medium" => Some(ParamValue::Difficulty(Difficulty::Medium)),
                "hard" => Some(ParamValue::Difficulty(Difficulty::Hard)),
                _ => None,
            }),
            ParamKey::Focus => text.and_then(|s| match s.to_lowercase().as_str() {
                "low" => Some(ParamValue::Focus(FocusLevel::Low)),
                "medium" => Some(ParamValue::Focus(FocusLevel::Medium)),
                "high" => Some(ParamValue::Focus(FocusLevel::High)),
                _ => None,
            }),
            ParamKey::Timeframe => text
                .and_then(|s| Timeframe::from_name(&s))
                .map(ParamValue::Timeframe),
            _ => text.map(ParamValue::Text),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            ParamValue::Time(t) => write!(f, "{}", t.format("%H:%M")),
            ParamValue::Hours(h) => write!(f, "{}", h),
            ParamValue::Priority(p) => f.write_str(p.as_str()),
            ParamValue::Difficulty(d) => f.write_str(d.as_str()),
            ParamValue::Focus(l) => f.write_str(l.as_str()),
            ParamValue::Timeframe(t) => f.write_str(t.as_str()),
        }
    }
}

/// Parameter bag that never stores absent or empty values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params {
    values: BTreeMap<ParamKey, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value; `None` and empty strings are dropped
    pub fn insert(&mut self, key: ParamKey, value: Option<ParamValue>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.values.insert(key, value);
        }
    }

    pub fn with(mut self, key: ParamKey, value: ParamValue) -> Self {
        self.insert(key, Some(value));
        self
    }

    pub fn get(&self, key: ParamKey) -> Option<&ParamValue> {
        self.values.get(&key)
    }

    pub fn contains(&self, key: ParamKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn text(&self, key: ParamKey) -> Option<&str> {
        match self.values.get(&key) {
            Some(ParamValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn date(&self, key: ParamKey) -> Option<NaiveDate> {
        match self.values.get(&key) {
            Some(ParamValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn time(&self) -> Option<NaiveTime> {
        match self.values.get(&ParamKey::Time) {
            Some(ParamValue::Time(t)) => Some(*t),
            _ => None,
        }
    }

    pub fn hours(&self) -> Option<f64> {
        match self.values.get(&ParamKey::Duration) {
            Some(ParamValue::Hours(h)) => Some(*h),
            _ => None,
        }
    }

    pub fn priority(&self) -> Option<Priority> {
        match self.values.get(&ParamKey::Priority) {
            Some(ParamValue::Priority(p)) => Some(*p),
            _ => None,
        }
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        match self.values.get(&ParamKey::Difficulty) {
            Some(ParamValue::Difficulty(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn focus(&self) -> Option<FocusLevel> {
        match self.values.get(&ParamKey::Focus) {
            Some(ParamValue::Focus(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn timeframe(&self) -> Option<Timeframe> {
        match self.values.get(&ParamKey::Timeframe) {
            Some(ParamValue::Timeframe(t)) => Some(*t),
            _ => None,
        }
    }

    /// Fill keys absent here from `other`; existing values win
    pub fn fill_from(&mut self, other: &Params) {
        for (key, value) in &other.values {
            self.values.entry(*key).or_insert_with(|| value.clone());
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = ParamKey> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, &ParamValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Structured output of classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedCommand {
    pub intent: Intent,
    pub parameters: Params,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub timestamp: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParsedCommand {
    pub fn new(intent: Intent, parameters: Params, confidence: f64, timestamp: NaiveDateTime) -> Self {
        Self {
            intent,
            parameters,
            confidence: confidence.clamp(0.0, 1.0),
            timestamp,
            error: None,
        }
    }

    /// An `unknown` command with no parameters and zero confidence
    pub fn unknown(timestamp: NaiveDateTime, error: impl Into<String>) -> Self {
        Self {
            intent: Intent::Unknown,
            parameters: Params::new(),
            confidence: 0.0,
            timestamp,
            error: Some(error.into()),
        }
    }

    /// Copy of this command with a different parameter set
    pub fn with_parameters(&self, parameters: Params, confidence: f64, timestamp: NaiveDateTime) -> Self {
        Self {
            intent: self.intent,
            parameters,
            confidence: confidence.clamp(0.0, 1.0),
            timestamp,
            error: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.intent == Intent::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_utterance_normalizes() {
        let u = Utterance::new("  Remind Me TO Study  ").unwrap();
        assert_eq!(u.raw, "Remind Me TO Study");
        assert_eq!(u.normalized, "remind me to study");
        assert!(Utterance::new("   ").is_none());
    }

    #[test]
    fn test_params_drop_empty_values() {
        let mut params = Params::new();
        params.insert(ParamKey::Title, Some(ParamValue::Text("  ".into())));
        params.insert(ParamKey::Course, None);
        params.insert(ParamKey::Priority, Some(ParamValue::Priority(Priority::High)));
        assert_eq!(params.len(), 1);
        assert!(!params.contains(ParamKey::Title));
    }

    #[test]
    fn test_fill_from_keeps_existing() {
        let mut base = Params::new().with(ParamKey::Title, ParamValue::Text("Essay".into()));
        let other = Params::new()
            .with(ParamKey::Title, ParamValue::Text("Other".into()))
            .with(ParamKey::Priority, ParamValue::Priority(Priority::Low));
        base.fill_from(&other);
        assert_eq!(base.text(ParamKey::Title), Some("Essay"));
        assert_eq!(base.priority(), Some(Priority::Low));
    }

    #[test]
    fn test_params_serialize_with_wire_names() {
        let params = Params::new()
            .with(ParamKey::DueDate, ParamValue::Date(NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()))
            .with(ParamKey::Time, ParamValue::Time(NaiveTime::from_hms_opt(15, 0, 0).unwrap()))
            .with(ParamKey::Priority, ParamValue::Priority(Priority::High));
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value, json!({"dueDate": "2026-10-15", "time": "15:00", "priority": "high"}));
    }

    #[test]
    fn test_from_json_rejects_wrong_shapes() {
        assert_eq!(ParamValue::from_json(ParamKey::Title, &json!(null)), None);
        assert_eq!(ParamValue::from_json(ParamKey::Title, &json!("")), None);
        assert_eq!(ParamValue::from_json(ParamKey::DueDate, &json!("soon")), None);
        assert_eq!(
            ParamValue::from_json(ParamKey::Duration, &json!(1.5)),
            Some(ParamValue::Hours(1.5))
        );
        assert_eq!(
            ParamValue::from_json(ParamKey::Time, &json!("09:30")),
            Some(ParamValue::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap()))
        );
    }

    #[test]
    fn test_unknown_command_shape() {
        let now = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let cmd = ParsedCommand::unknown(now, "no match");
        assert!(cmd.is_unknown());
        assert_eq!(cmd.confidence, 0.0);
        assert!(cmd.parameters.is_empty());
    }
}
