//! LLM Provider trait: common interface for all LLM backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("Response contained no text")]
    EmptyResponse,
}

// ── Messages ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ── Common Parameters ──────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct LlmParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

/// One non-streaming completion call.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Behavioural instruction, kept apart from the turn list.
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub params: LlmParams,
}

/// Common interface for LLM providers (Anthropic, OpenAI-compatible, ...).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Non-streaming chat completion. Returns the reply text.
    async fn chat(&self, request: CompletionRequest) -> Result<String, LlmError>;

    /// Provider identifier (e.g. "anthropic", "openai").
    fn id(&self) -> &str;
}
