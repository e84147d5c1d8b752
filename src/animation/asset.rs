//! Reads animation clip names and lengths from a glTF / GLB file.

use crate::config::ClipSpec;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse glTF {path}: {source}")]
    Parse {
        path: PathBuf,
        source: gltf::Error,
    },
    #[error("{0} contains no animations")]
    NoAnimations(PathBuf),
}

pub fn load_clips(path: &Path) -> Result<Vec<ClipSpec>, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let clips = clips_from_slice(&bytes).map_err(|source| AssetError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if clips.is_empty() {
        return Err(AssetError::NoAnimations(path.to_path_buf()));
    }

    let names: Vec<&str> = clips.iter().map(|c| c.name.as_str()).collect();
    tracing::info!("[Asset] Available animations: {:?}", names);
    Ok(clips)
}

/// Parse a glTF JSON or GLB document. A clip's length is the largest
/// keyframe time among its samplers' input accessors.
pub fn clips_from_slice(bytes: &[u8]) -> Result<Vec<ClipSpec>, gltf::Error> {
    let document = gltf::Gltf::from_slice(bytes)?;

    let clips = document
        .animations()
        .map(|animation| {
            let name = animation
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Animation{}", animation.index()));

            let duration = animation
                .samplers()
                .filter_map(|sampler| {
                    sampler
                        .input()
                        .max()
                        .and_then(|max| max.as_array().and_then(|a| a.first()).cloned())
                        .and_then(|v| v.as_f64())
                })
                .fold(0.0_f64, f64::max);

            ClipSpec::new(name, duration as f32)
        })
        .collect();

    Ok(clips)
}
