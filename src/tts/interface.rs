use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error Types ────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("TTS request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("TTS API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("TTS config error: {0}")]
    ConfigError(String),
}

// ── Synthesis Parameters ───────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsParams {
    /// Provider voice id. `None` uses the provider default.
    pub voice: Option<String>,
    /// Provider model id. `None` uses the provider default.
    pub model: Option<String>,
    /// Provider output format string, e.g. `mp3_44100_128`.
    pub output_format: Option<String>,
}

// ── Provider Trait ──────────────────────────────────────

#[async_trait]
pub trait TtsProvider: Send + Sync {
    /// Unique identifier for this provider (e.g. "elevenlabs").
    fn id(&self) -> String;

    /// Synthesize text to encoded audio bytes.
    async fn synthesize(&self, text: &str, params: TtsParams) -> Result<Vec<u8>, TtsError>;
}
