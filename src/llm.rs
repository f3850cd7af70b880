//! Chat-completion collaborator for the summarization pipeline
//! OpenAI-compatible HTTP client with per-category error classification

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors are split by category so each call site can apply the right
/// retry policy: transient errors back off and retry, the rest fail the
/// enclosing unit of work immediately.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited - try again later")]
    RateLimited,
    #[error("Request timeout")]
    Timeout,
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Authentication failed - check your API key")]
    AuthFailed,
    #[error("API error: {0}")]
    Api(String),
    #[error("Empty completion")]
    EmptyResponse,
}

impl LlmError {
    /// Whether the error is worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Timeout | Self::Connection(_))
    }
}

/// One message of a chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }
}

/// Parameters of one completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Constrain the response to a JSON object when the model supports it.
    pub json_mode: bool,
}

/// The pipeline's only outbound dependency. Implemented by the HTTP client
/// below and by scripted mocks in tests; always constructor-injected.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Whether the model accepts `response_format: {"type": "json_object"}`.
pub fn supports_json_mode(model: &str) -> bool {
    model.contains("gpt-4o") || model.contains("gpt-4-turbo")
}

/// Backoff before retry `attempt` (0-based): exponential base plus a small
/// linear jitter term, matching the retry contract of every model call site.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * 2u64.pow(attempt) + 500 * u64::from(attempt))
}

/// OpenAI-compatible chat-completion client.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn classify_transport_error(e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.is_connect() || e.is_request() {
            LlmError::Connection(e.to_string())
        } else {
            LlmError::Api(e.to_string())
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if request.json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let resp = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(Self::classify_transport_error)?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LlmError::AuthFailed);
        }
        if !status.is_success() {
            // Log size only, response bodies may quote document content
            if let Ok(body) = resp.text().await {
                tracing::debug!(
                    "Completion API error response (status: {}, bytes: {})",
                    status,
                    body.len()
                );
            }
            return Err(LlmError::Api(format!("HTTP {} from completion API", status)));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| LlmError::Api(format!("Invalid API response: {}", e)))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(content)
    }
}
