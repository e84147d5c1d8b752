pub mod classifier;
pub mod gate;

pub use classifier::{EmotionClassifier, EMOTION_SYSTEM_PROMPT};
pub use gate::ClassificationGate;
