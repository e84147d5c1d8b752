//! Emotion-to-Animation Mapper.
//!
//! The classifier is a free-text model, so labels are matched with
//! `contains`, never equality. First matching rule wins.

use super::engine::{AnimationName, IDLE};
use serde::{Deserialize, Serialize};

/// `token` found anywhere in the label selects `animation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub token: String,
    pub animation: AnimationName,
}

impl MappingRule {
    pub fn new(token: impl Into<String>, animation: impl Into<AnimationName>) -> Self {
        Self {
            token: token.into(),
            animation: animation.into(),
        }
    }
}

pub fn default_rules() -> Vec<MappingRule> {
    vec![
        MappingRule::new("happy", "Happy"),
        MappingRule::new("sad", "Sad"),
    ]
}

/// Map a classification label to an animation name. Falls back to `Idle`.
pub fn map_label(rules: &[MappingRule], label: &str) -> AnimationName {
    let normalized = label.trim().to_lowercase();
    rules
        .iter()
        .find(|rule| !rule.token.is_empty() && normalized.contains(&rule.token.to_lowercase()))
        .map(|rule| rule.animation.clone())
        .unwrap_or_else(|| IDLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_labels() {
        let rules = default_rules();
        assert_eq!(map_label(&rules, "happy"), "Happy");
        assert_eq!(map_label(&rules, "sad"), "Sad");
        assert_eq!(map_label(&rules, "neutral"), "Idle");
    }

    #[test]
    fn tolerates_case_whitespace_and_punctuation() {
        let rules = default_rules();
        assert_eq!(map_label(&rules, "  Happy.\n"), "Happy");
        assert_eq!(map_label(&rules, "\"SAD\""), "Sad");
        assert_eq!(map_label(&rules, "The tone is: happy!"), "Happy");
    }

    #[test]
    fn unknown_label_goes_idle() {
        let rules = default_rules();
        assert_eq!(map_label(&rules, ""), "Idle");
        assert_eq!(map_label(&rules, "angry"), "Idle");
    }

    #[test]
    fn first_rule_wins() {
        // Both tokens present, rule order decides.
        let rules = default_rules();
        assert_eq!(map_label(&rules, "happy but also sad"), "Happy");

        let reversed: Vec<MappingRule> = default_rules().into_iter().rev().collect();
        assert_eq!(map_label(&reversed, "happy but also sad"), "Sad");
    }

    #[test]
    fn custom_rules() {
        let rules = vec![
            MappingRule::new("excited", "Dance"),
            MappingRule::new("", "Never"),
        ];
        assert_eq!(map_label(&rules, "Excited!!"), "Dance");
        assert_eq!(map_label(&rules, "calm"), "Idle");
    }
}
