pub mod config;
pub mod elevenlabs;
pub mod interface;

pub use config::TtsConfig;
pub use elevenlabs::ElevenLabsTtsProvider;
pub use interface::{TtsError, TtsParams, TtsProvider};

use std::sync::Arc;

/// Build the configured speech provider.
///
/// Returns `None` when speech is disabled, the provider type is unknown,
/// or no API key can be resolved.
pub fn build_provider(config: &TtsConfig) -> Option<Arc<dyn TtsProvider>> {
    if !config.enabled {
        return None;
    }
    match config.provider_type.as_str() {
        "elevenlabs" => match ElevenLabsTtsProvider::from_config(config) {
            Some(provider) => {
                tracing::info!(
                    "[TTS] ElevenLabs enabled (voice={}, model={})",
                    config.voice_id,
                    config.model_id
                );
                Some(Arc::new(provider))
            }
            None => {
                tracing::warn!("[TTS] Speech enabled but no ElevenLabs API key is set");
                None
            }
        },
        other => {
            tracing::warn!("[TTS] Unknown provider type '{}'", other);
            None
        }
    }
}
