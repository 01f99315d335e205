// src/services/completion.rs
//! Chat-completion client used by both relay endpoints.
//!
//! The handlers only see [`CompletionApi`]; [`OpenAiClient`] is the production
//! implementation speaking the OpenAI `chat/completions` wire format.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const COMPLETION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const TITLE_INSTRUCTION: &str =
    "Generate a short, descriptive title for a chat (max 5 words).";

/// Upstream error codes treated as quota exhaustion or throttling.
const RATE_LIMIT_CODES: [&str; 2] = ["insufficient_quota", "rate_limit_exceeded"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API rate limited: {0}")]
    RateLimited(String),

    #[error("completion API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned {status}: {body}")]
    Status {
        status: StatusCode,
        body: String,
    },

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CompletionError::RateLimited(_))
    }
}

#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Run one completion over `messages` and return the generated text.
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_base: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionApi for OpenAiClient {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<String, CompletionError> {
        debug!(model, turns = messages.len(), "sending completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest {
                model,
                messages: &messages,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, body));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;
        extract_content(&payload)
    }
}

/// Sort a non-2xx completion response into rate-limited or generic failure.
///
/// HTTP 429 is always rate-limited. Other statuses are rate-limited only when
/// the OpenAI-style error body carries a quota/throttle `code` or `type`.
pub fn classify_failure(status: StatusCode, body: String) -> CompletionError {
    if status == StatusCode::TOO_MANY_REQUESTS || has_rate_limit_code(&body) {
        CompletionError::RateLimited(body)
    } else {
        CompletionError::Status { status, body }
    }
}

fn has_rate_limit_code(body: &str) -> bool {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return false;
    };
    let error = &parsed["error"];
    ["code", "type"]
        .iter()
        .filter_map(|key| error[*key].as_str())
        .any(|code| RATE_LIMIT_CODES.contains(&code))
}

fn extract_content(payload: &Value) -> Result<String, CompletionError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| {
            CompletionError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}
