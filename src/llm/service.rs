//! LLM Service: shared handle to the reply provider and the
//! classification ("system") provider.

use crate::llm::anthropic::AnthropicClient;
use crate::llm::llm_config::{LlmConfig, LlmProviderConfig};
use crate::llm::openai::OpenAIClient;
use crate::llm::provider::LlmProvider;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct LlmService {
    provider: Arc<RwLock<Arc<dyn LlmProvider>>>,
    system_provider: Arc<RwLock<Arc<dyn LlmProvider>>>,
    config: Arc<RwLock<LlmConfig>>,
}

impl LlmService {
    pub fn from_config(config: LlmConfig) -> Self {
        let (provider, system_provider) = build_providers(&config);
        Self {
            provider: Arc::new(RwLock::new(provider)),
            system_provider: Arc::new(RwLock::new(system_provider)),
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Use explicit providers instead of building them from config.
    pub fn with_providers(
        provider: Arc<dyn LlmProvider>,
        system_provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            provider: Arc::new(RwLock::new(provider)),
            system_provider: Arc::new(RwLock::new(system_provider)),
            config: Arc::new(RwLock::new(LlmConfig::default())),
        }
    }

    /// Provider for conversation replies.
    pub async fn provider(&self) -> Arc<dyn LlmProvider> {
        self.provider.read().await.clone()
    }

    /// Provider for emotion classification.
    pub async fn system_provider(&self) -> Arc<dyn LlmProvider> {
        self.system_provider.read().await.clone()
    }

    pub async fn config(&self) -> LlmConfig {
        self.config.read().await.clone()
    }

    /// Hot-swap both providers. Calls already in flight finish on the old ones.
    pub async fn update_config(&self, new_config: LlmConfig) {
        let (provider, system_provider) = build_providers(&new_config);
        *self.provider.write().await = provider;
        *self.system_provider.write().await = system_provider;
        *self.config.write().await = new_config;
    }
}

fn build_providers(config: &LlmConfig) -> (Arc<dyn LlmProvider>, Arc<dyn LlmProvider>) {
    let provider: Arc<dyn LlmProvider> =
        Arc::from(build_provider(config, &config.active_provider, None));

    let system_provider = match (&config.system_provider, &config.system_model) {
        (None, None) => provider.clone(),
        (id, model) => {
            let id = id.as_deref().unwrap_or(&config.active_provider);
            Arc::from(build_provider(config, id, model.clone()))
        }
    };

    (provider, system_provider)
}

fn build_provider(
    config: &LlmConfig,
    id: &str,
    model_override: Option<String>,
) -> Box<dyn LlmProvider> {
    match config.provider(id) {
        Some(cfg) => build_from_provider_config(cfg, model_override),
        None => {
            tracing::warn!("[LLM] No provider configured, falling back to Anthropic defaults");
            Box::new(AnthropicClient::new(String::new(), None, model_override))
        }
    }
}

fn build_from_provider_config(
    cfg: &LlmProviderConfig,
    model_override: Option<String>,
) -> Box<dyn LlmProvider> {
    let api_key = cfg.resolve_api_key().unwrap_or_else(|| {
        tracing::warn!("[LLM] No API key for provider '{}'", cfg.id);
        String::new()
    });
    let model = model_override.or_else(|| cfg.model.clone());

    match cfg.provider_type.as_str() {
        "openai" => {
            tracing::info!(
                "[LLM] Initializing OpenAI-compatible provider '{}': base_url={}, model={}",
                cfg.id,
                cfg.base_url
                    .as_deref()
                    .unwrap_or(crate::llm::openai::DEFAULT_BASE_URL),
                model.as_deref().unwrap_or(crate::llm::openai::DEFAULT_MODEL)
            );
            Box::new(
                OpenAIClient::new(api_key, cfg.base_url.clone(), model).with_id(cfg.id.clone()),
            )
        }
        other => {
            if other != "anthropic" {
                tracing::warn!(
                    "[LLM] Unknown provider_type '{}', treating it as Anthropic",
                    other
                );
            }
            tracing::info!(
                "[LLM] Initializing Anthropic provider '{}': model={}",
                cfg.id,
                model.as_deref().unwrap_or(crate::llm::anthropic::DEFAULT_MODEL)
            );
            Box::new(
                AnthropicClient::new(api_key, cfg.base_url.clone(), model).with_id(cfg.id.clone()),
            )
        }
    }
}
