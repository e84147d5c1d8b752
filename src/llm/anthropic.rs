//! Anthropic Messages API client.
//!
//! `POST {base_url}/v1/messages`, authenticated with `x-api-key`. The reply
//! text is the first content block when that block is text.

use super::provider::{ChatMessage, CompletionRequest, LlmError, LlmProvider};
use crate::utils::http::{request_with_retry, RetryPolicy};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const API_VERSION: &str = "2023-06-01";
/// The API rejects requests without `max_tokens`.
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    retry: RetryPolicy,
    provider_id: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            retry: RetryPolicy::default(),
            provider_id: "anthropic".to_string(),
        }
    }

    pub fn with_id(mut self, id: String) -> Self {
        self.provider_id = id;
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    async fn chat(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/v1/messages", self.base_url);
        let params = request.params;
        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system,
            messages: request.messages,
            temperature: params.temperature,
            top_p: params.top_p,
            stop_sequences: params.stop,
        };

        let client = self.client.clone();
        let api_key = self.api_key.clone();

        let response = request_with_retry(
            move || {
                let client = client.clone();
                let url = url.clone();
                let body = body.clone();
                let api_key = api_key.clone();
                async move {
                    client
                        .post(&url)
                        .header("x-api-key", api_key)
                        .header("anthropic-version", API_VERSION)
                        .header("Content-Type", "application/json")
                        .json(&body)
                        .send()
                        .await
                }
            },
            self.retry,
        )
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        match parsed.content.into_iter().next() {
            Some(ContentBlock::Text { text }) => Ok(text),
            _ => Err(LlmError::EmptyResponse),
        }
    }

    fn id(&self) -> &str {
        &self.provider_id
    }
}
