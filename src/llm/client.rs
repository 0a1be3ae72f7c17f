//! Async HTTP client for the remote interpretation service
//!
//! The service is a black box: text goes in, text comes out. It answers
//! free-form questions, and also completes partial commands when the
//! prompt asks for structured JSON.

use crate::core::config::InterpreterConfig;
use crate::core::error::{AssistError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Session id sent when the caller supplies none
pub const DEFAULT_SESSION: &str = "default";

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, session_id: &str) -> Self {
        let session_id = match session_id.trim() {
            "" => DEFAULT_SESSION.to_string(),
            id => id.to_string(),
        };
        Self {
            message: message.into(),
            session_id,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Something that can answer a chat request
///
/// Implemented by [`ChatClient`] for the real service and by mocks in tests.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn ask(&self, request: &ChatRequest) -> Result<String>;

    /// Forget the remote conversation for a session
    async fn reset(&self, session_id: &str) -> Result<()>;
}

pub struct ChatClient {
    client: Client,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatClient {
    pub fn new(config: &InterpreterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AssistError::Interpreter(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// `GET /api/health`, decoded as-is
    pub async fn health(&self) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(self.endpoint("health"))
            .send()
            .await
            .map_err(|e| AssistError::Interpreter(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AssistError::Interpreter(format!(
                "health check failed with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AssistError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl Interpreter for ChatClient {
    async fn ask(&self, request: &ChatRequest) -> Result<String> {
        let mut body = request.clone();
        body.temperature.get_or_insert(self.temperature);
        body.max_tokens.get_or_insert(self.max_tokens);

        let response = self
            .client
            .post(self.endpoint("chat"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistError::Interpreter(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AssistError::Interpreter(e.to_string()))?;
        let reply: Option<ChatResponse> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let detail = reply.and_then(|r| r.error).unwrap_or(text);
            return Err(AssistError::Interpreter(format!("API error {}: {}", status, detail)));
        }

        match reply {
            Some(ChatResponse { response: Some(answer), .. }) => Ok(answer),
            Some(ChatResponse { error: Some(error), .. }) => Err(AssistError::Interpreter(error)),
            _ => Err(AssistError::MalformedResponse(
                "expected a `response` field".into(),
            )),
        }
    }

    async fn reset(&self, session_id: &str) -> Result<()> {
        let session_id = ChatRequest::new(String::new(), session_id).session_id;
        let response = self
            .client
            .post(self.endpoint("reset-chat"))
            .json(&ResetRequest { session_id })
            .send()
            .await
            .map_err(|e| AssistError::Interpreter(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AssistError::Interpreter(format!(
                "reset failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct ResetRequest {
    session_id: String,
}
