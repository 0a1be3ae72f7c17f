//! Parse structured replies from the interpretation service
//!
//! Replies are expected to hold a JSON object, but the service may wrap it
//! in prose or code fences, or return something unusable. Parsing never
//! fails: anything that cannot be read becomes [`StructuredReply::not_understood`].

use crate::command::intent::Intent;
use crate::command::params::{ParamKey, ParamValue, Params};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A remote interpretation of a (partial) command
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredReply {
    pub intent: Intent,
    pub parameters: Params,
    /// Keys the interpreter says it could not fill
    pub missing: Vec<ParamKey>,
    pub error: Option<String>,
}

impl StructuredReply {
    /// Fallback used when a reply cannot be read
    pub fn not_understood() -> Self {
        Self {
            intent: Intent::Unknown,
            parameters: Params::new(),
            missing: Vec::new(),
            error: Some("Could not understand the request".into()),
        }
    }

    pub fn is_understood(&self) -> bool {
        self.error.is_none()
    }
}

// Lenient wire form; every field optional.
#[derive(Debug, Default, Deserialize)]
struct RawReply {
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    parameters: Map<String, Value>,
    #[serde(default)]
    missing: Vec<Value>,
}

/// First balanced `{...}` in `text`, ignoring braces inside JSON strings
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Read a structured reply, falling back to "not understood"
pub fn parse_reply(text: &str) -> StructuredReply {
    let Some(json) = extract_json_object(text) else {
        tracing::debug!("no JSON object in interpreter reply");
        return StructuredReply::not_understood();
    };
    let raw: RawReply = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(error = %e, "unparseable interpreter reply");
            return StructuredReply::not_understood();
        }
    };

    let mut parameters = Params::new();
    for (name, value) in &raw.parameters {
        if let Some(key) = ParamKey::from_name(name) {
            parameters.insert(key, ParamValue::from_json(key, value));
        }
    }

    StructuredReply {
        intent: raw.intent.as_deref().map(Intent::from_name).unwrap_or(Intent::Unknown),
        parameters,
        missing: raw
            .missing
            .iter()
            .filter_map(Value::as_str)
            .filter_map(ParamKey::from_name)
            .collect(),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_extract_json_simple() {
        let response = r#"{"intent": "add_event"}"#;
        assert_eq!(extract_json_object(response), Some(response));
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = "Here you go:\n```json\n{\"intent\": \"add_event\", \"parameters\": {\"title\": \"Biology\"}}\n```\nAnything else? {not json}";
        let json = extract_json_object(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.ends_with("}}"));
        assert!(!json.contains("not json"));
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let response = r#"{"parameters": {"title": "set {x} \"quoted\" }"}} trailing"#;
        let json = extract_json_object(response).unwrap();
        assert!(json.ends_with(r#"}"}}"#));
        assert!(serde_json::from_str::<Value>(json).is_ok());
    }

    #[test]
    fn test_extract_json_no_json() {
        assert_eq!(extract_json_object("I don't understand that"), None);
        assert_eq!(extract_json_object("{ never closed"), None);
    }

    #[test]
    fn test_parse_reply_keeps_only_well_formed_values() {
        let reply = parse_reply(
            r#"{
                "intent": "add_event",
                "parameters": {
                    "title": "Biology",
                    "date": "2026-10-16",
                    "time": "15:00",
                    "priority": "whenever",
                    "course": "",
                    "colour": "blue"
                },
                "ready_to_execute": true,
                "missing": []
            }"#,
        );
        assert!(reply.is_understood());
        assert_eq!(reply.intent, Intent::AddEvent);
        assert_eq!(reply.parameters.text(ParamKey::Title), Some("Biology"));
        assert_eq!(
            reply.parameters.date(ParamKey::Date),
            NaiveDate::from_ymd_opt(2026, 10, 16)
        );
        assert_eq!(reply.parameters.time(), NaiveTime::from_hms_opt(15, 0, 0));
        assert!(!reply.parameters.contains(ParamKey::Priority));
        assert!(!reply.parameters.contains(ParamKey::Course));
        assert_eq!(reply.parameters.len(), 3);
        assert!(reply.missing.is_empty());
    }

    #[test]
    fn test_parse_reply_missing_list() {
        let reply = parse_reply(r#"{"intent": "create_task", "missing": ["dueDate", "bogus", 3]}"#);
        assert_eq!(reply.missing, vec![ParamKey::DueDate]);
    }

    #[test]
    fn test_malformed_reply_falls_back() {
        let reply = parse_reply("{\"intent\": \"add_event\", \"parameters\": [1, 2}");
        assert!(!reply.is_understood());
        assert_eq!(reply.intent, Intent::Unknown);
        assert!(reply.parameters.is_empty());

        assert_eq!(parse_reply("sorry, no idea"), StructuredReply::not_understood());
    }
}
