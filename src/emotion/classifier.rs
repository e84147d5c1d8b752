//! Emotion classifier: asks the LLM for a one-word tone label.

use crate::llm::{ChatMessage, CompletionRequest, LlmError, LlmParams, LlmService};

pub const EMOTION_SYSTEM_PROMPT: &str = "You are an emotion analyzer. Analyze the emotional tone of the user input and respond with ONLY ONE WORD: \"neutral\", \"happy\", or \"sad\". Rules: neutral = calm/ordinary topics, happy = positive/pleasant/joyful topics, sad = negative/unpleasant/sorrowful topics.";

const MAX_TOKENS: u32 = 50;

/// Wraps the classification provider of an [`LlmService`].
#[derive(Clone)]
pub struct EmotionClassifier {
    llm: LlmService,
}

impl EmotionClassifier {
    pub fn new(llm: LlmService) -> Self {
        Self { llm }
    }

    pub fn build_request(message: &str) -> CompletionRequest {
        CompletionRequest {
            system: Some(EMOTION_SYSTEM_PROMPT.to_string()),
            messages: vec![ChatMessage::user(format!(
                "Analyze the emotional tone of this message: \"{}\"",
                message
            ))],
            params: LlmParams {
                max_tokens: Some(MAX_TOKENS),
                ..Default::default()
            },
        }
    }

    /// Raw label text, lower-cased and trimmed. Free text: callers should
    /// look for tokens in it rather than compare it.
    pub async fn classify(&self, message: &str) -> Result<String, LlmError> {
        let provider = self.llm.system_provider().await;
        let reply = provider.chat(Self::build_request(message)).await?;
        Ok(reply.trim().to_lowercase())
    }
}
