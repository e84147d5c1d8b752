use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_VOICE_ID: &str = "CBHdTdZwkV4jYoCyMV1B";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3_44100_128";

/// The `tts` section of the config file. Speech is off unless `enabled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// "elevenlabs"
    #[serde(default = "default_provider_type")]
    pub provider_type: String,

    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,

    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Where the terminal driver writes synthesized replies.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl TtsConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        crate::config::resolve_api_key(&self.api_key, &self.api_key_env)
    }
}

fn default_provider_type() -> String {
    "elevenlabs".to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("ELEVEN_LABS_API_KEY".to_string())
}

fn default_voice_id() -> String {
    DEFAULT_VOICE_ID.to_string()
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_output_format() -> String {
    DEFAULT_OUTPUT_FORMAT.to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider_type: default_provider_type(),
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: None,
            voice_id: default_voice_id(),
            model_id: default_model_id(),
            output_format: default_output_format(),
            output_dir: None,
        }
    }
}
