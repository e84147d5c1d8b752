//! LLM configuration: the `llm` section of the config file.

use crate::config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    pub id: String,
    /// "anthropic" | "openai"
    pub provider_type: String,
    #[serde(default = "default_true")]
    pub enabled: bool,

    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl LlmProviderConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        config::resolve_api_key(&self.api_key, &self.api_key_env)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// ID of the provider used for replies (must match one of `providers[].id`).
    #[serde(default = "default_active_provider")]
    pub active_provider: String,

    /// Optional: separate provider for emotion classification.
    /// If None, uses `active_provider`.
    pub system_provider: Option<String>,

    /// Optional: override model for emotion classification.
    pub system_model: Option<String>,

    #[serde(default = "default_providers")]
    pub providers: Vec<LlmProviderConfig>,
}

fn default_active_provider() -> String {
    "anthropic".to_string()
}

fn default_providers() -> Vec<LlmProviderConfig> {
    vec![
        LlmProviderConfig {
            id: "anthropic".to_string(),
            provider_type: "anthropic".to_string(),
            enabled: true,
            api_key: None,
            api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
            base_url: Some(crate::llm::anthropic::DEFAULT_BASE_URL.to_string()),
            model: Some(crate::llm::anthropic::DEFAULT_MODEL.to_string()),
        },
        LlmProviderConfig {
            id: "openai".to_string(),
            provider_type: "openai".to_string(),
            enabled: false,
            api_key: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            base_url: Some(crate::llm::openai::DEFAULT_BASE_URL.to_string()),
            model: Some(crate::llm::openai::DEFAULT_MODEL.to_string()),
        },
    ]
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            active_provider: default_active_provider(),
            system_provider: None,
            system_model: None,
            providers: default_providers(),
        }
    }
}

impl LlmConfig {
    /// Provider config by id, falling back to the first enabled entry, then
    /// to the first entry.
    pub fn provider(&self, id: &str) -> Option<&LlmProviderConfig> {
        self.providers
            .iter()
            .find(|p| p.id == id)
            .or_else(|| self.providers.iter().find(|p| p.enabled))
            .or_else(|| self.providers.first())
    }
}
