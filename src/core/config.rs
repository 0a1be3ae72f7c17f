//! Assistant configuration with documented constants
//!
//! All tunable numbers are collected here. Every field has a default so a
//! partial TOML file (or none at all) is valid.

use crate::core::error::{AssistError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for the conversational core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub classifier: ClassifierConfig,
    pub interpreter: InterpreterConfig,
    pub ui: UiConfig,
}

/// Scoring thresholds for intent classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Best intent score must be strictly greater than this
    ///
    /// At 0.2, a single exact keyword among five is not enough to commit
    /// to an intent.
    pub unknown_threshold: f64,

    /// Weight applied to the synonym score before comparing with the
    /// keyword score
    pub synonym_weight: f64,

    /// Keyword scores below this also consult the synonym list
    pub keyword_fallback: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            unknown_threshold: 0.2,
            synonym_weight: 0.8,
            keyword_fallback: 0.5,
        }
    }
}

/// Connection settings for the remote interpretation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Base URL; `/api/chat` and `/api/reset-chat` are appended
    pub url: String,

    /// Hard limit on a single request; exceeding it counts as a network error
    pub timeout_secs: u64,

    pub temperature: f32,

    pub max_tokens: u32,

    /// When false the dispatcher goes straight to the canned fallback
    pub enabled: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".into(),
            timeout_secs: 5,
            temperature: 0.2,
            max_tokens: 512,
            enabled: true,
        }
    }
}

impl InterpreterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Presentation hints handed to the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Delay the UI should wait between applying a state change and the
    /// navigation that follows it. Fixed, never scaled by data size.
    pub transition_delay_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            transition_delay_ms: 300,
        }
    }
}

impl AssistantConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AssistantConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides
    ///
    /// Optional: STUDY_BUDDY_API_URL
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("STUDY_BUDDY_API_URL") {
            self.interpreter.url = url;
        }
        self
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let c = &self.classifier;
        for (name, value) in [
            ("unknown_threshold", c.unknown_threshold),
            ("synonym_weight", c.synonym_weight),
            ("keyword_fallback", c.keyword_fallback),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AssistError::Config(format!(
                    "classifier.{} ({}) must be within [0, 1]",
                    name, value
                )));
            }
        }

        if self.interpreter.timeout_secs == 0 {
            return Err(AssistError::Config(
                "interpreter.timeout_secs must be positive".into(),
            ));
        }
        if self.interpreter.max_tokens == 0 {
            return Err(AssistError::Config(
                "interpreter.max_tokens must be positive".into(),
            ));
        }

        Ok(())
    }
}
