//! Shared config utilities for loading/saving the JSON config file
//! and resolving API keys from fields or environment variables.

use crate::animation::mapper::MappingRule;
use crate::llm::llm_config::LlmConfig;
use crate::tts::config::TtsConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "mood_avatar.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ── Avatar Config ──────────────────────────────────────

/// Which classification result wins when several are in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationOrdering {
    /// Results from a request older than one already applied are dropped.
    #[default]
    LatestRequest,
    /// Every result is applied when it arrives.
    LatestArrival,
}

/// A clip the simulated mixer exposes when no model file is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSpec {
    pub name: String,
    /// Clip length in seconds.
    pub duration: f32,
}

impl ClipSpec {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// glTF / GLB file to read animation clips from.
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Clips used when `model_path` is unset.
    #[serde(default = "default_clips")]
    pub clips: Vec<ClipSpec>,

    /// Ordered (token, animation) rules for the emotion mapper.
    #[serde(default = "crate::animation::mapper::default_rules")]
    pub mapping_rules: Vec<MappingRule>,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Upper bound for a single frame step, in seconds.
    #[serde(default = "default_max_frame_step")]
    pub max_frame_step: f32,

    #[serde(default)]
    pub classification_ordering: ClassificationOrdering,
}

fn default_clips() -> Vec<ClipSpec> {
    vec![
        ClipSpec::new("Idle", 4.0),
        ClipSpec::new("Happy", 2.5),
        ClipSpec::new("Sad", 3.0),
    ]
}

fn default_fps() -> u32 {
    60
}

fn default_max_frame_step() -> f32 {
    0.1
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            clips: default_clips(),
            mapping_rules: crate::animation::mapper::default_rules(),
            fps: default_fps(),
            max_frame_step: default_max_frame_step(),
            classification_ordering: ClassificationOrdering::default(),
        }
    }
}

// ── Top-Level Config ───────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub avatar: AvatarConfig,
}

/// `<config dir>/mood-avatar/mood_avatar.json`, or the working directory
/// when the platform has no config dir.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mood-avatar")
        .join(CONFIG_FILE_NAME)
}

pub fn load_config(path: &Path) -> AppConfig {
    load_json_config(path, "Config")
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    save_json_config(path, config, "Config")
}

// ── Generic Helpers ────────────────────────────────────

/// Generic load for any Serde config type with a `Default` implementation.
/// Falls back to `T::default()` if the file is missing or unparsable.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path, label: &str) -> T {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<T>(&content) {
            Ok(config) => {
                tracing::info!("[{}] Loaded config from {}", label, path.display());
                config
            }
            Err(e) => {
                tracing::warn!(
                    "[{}] Failed to parse config {}: {} (using defaults)",
                    label,
                    path.display(),
                    e
                );
                T::default()
            }
        },
        Err(_) => {
            tracing::info!(
                "[{}] No config file at {} (using defaults)",
                label,
                path.display()
            );
            T::default()
        }
    }
}

/// Generic save for any Serde config type. Creates missing parent directories.
pub fn save_json_config<T: Serialize>(
    path: &Path,
    config: &T,
    label: &str,
) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("[{}] Saved config to {}", label, path.display());
    Ok(())
}

/// Resolve an API key: check the direct `api_key` field first,
/// then fall back to reading the environment variable named in `api_key_env`.
pub fn resolve_api_key(api_key: &Option<String>, api_key_env: &Option<String>) -> Option<String> {
    if let Some(ref key) = api_key {
        if !key.is_empty() {
            return Some(key.clone());
        }
    }
    if let Some(ref env_var) = api_key_env {
        if let Ok(key) = std::env::var(env_var) {
            if !key.is_empty() {
                return Some(key);
            }
        }
    }
    None
}
