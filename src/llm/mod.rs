pub mod anthropic;
pub mod llm_config;
pub mod openai;
pub mod provider;
pub mod service;

pub use llm_config::LlmConfig;
pub use provider::{ChatMessage, CompletionRequest, LlmError, LlmParams, LlmProvider, Role};
pub use service::LlmService;
