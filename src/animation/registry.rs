//! Clip Registry: animation name → engine handle.

use super::engine::AnimationName;
use std::collections::HashMap;

/// Populated once when the avatar asset finishes loading, read-only after.
#[derive(Debug, Clone)]
pub struct ClipRegistry<H> {
    clips: HashMap<AnimationName, H>,
}

impl<H> Default for ClipRegistry<H> {
    fn default() -> Self {
        Self {
            clips: HashMap::new(),
        }
    }
}

impl<H> ClipRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a clip. A repeated name replaces the earlier handle.
    pub fn register(&mut self, name: impl Into<AnimationName>, handle: H) {
        self.clips.insert(name.into(), handle);
    }

    /// `None` for unknown names. Callers treat that as a no-op.
    pub fn lookup(&self, name: &str) -> Option<&H> {
        self.clips.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clips.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn handles(&self) -> impl Iterator<Item = (&str, &H)> {
        self.clips.iter().map(|(name, h)| (name.as_str(), h))
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl<H, N: Into<AnimationName>> FromIterator<(N, H)> for ClipRegistry<H> {
    fn from_iter<I: IntoIterator<Item = (N, H)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (name, handle) in iter {
            registry.register(name, handle);
        }
        registry
    }
}
