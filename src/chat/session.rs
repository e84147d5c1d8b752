//! One conversation: reply generation, emotion classification and the
//! avatar animation it drives.

use super::transcript::{Transcript, TranscriptEntry};
use crate::animation::{map_label, AnimationName, ClipHandle, MappingRule, SharedController, IDLE};
use crate::config::ClassificationOrdering;
use crate::emotion::{ClassificationGate, EmotionClassifier};
use crate::llm::{ChatMessage, CompletionRequest, LlmError, LlmParams, LlmService};
use crate::tts::{TtsParams, TtsProvider};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub const RESPONSE_SYSTEM_PROMPT: &str = "You are a friendly conversational AI. Keep responses brief (2-3 sentences max), casual, and natural like texting a friend. No markdown formatting, bullet points, or lists. Just plain conversational text.";

pub const RESPONSE_MAX_TOKENS: u32 = 150;

/// Shown in place of a reply when generation fails.
pub const REPLY_ERROR_TEXT: &str = "Error: Failed to get response from Claude. Please try again.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("a message is already being answered")]
    Busy,
}

/// Everything the presentation layer needs to render a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    InputEnabled {
        enabled: bool,
    },
    UserMessage {
        text: String,
    },
    Thinking,
    ThinkingDone,
    AssistantMessage {
        text: String,
    },
    Error {
        message: String,
    },
    Emotion {
        /// `None` when classification failed.
        label: Option<String>,
        animation: AnimationName,
        applied: bool,
    },
    Speech {
        format: String,
        #[serde(skip)]
        audio: Vec<u8>,
    },
}

/// What happened to one classification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationOutcome {
    pub seq: u64,
    pub label: Option<String>,
    pub animation: AnimationName,
    /// `false` when a newer result had already been applied.
    pub applied: bool,
}

/// Handles for one accepted message.
pub struct Turn {
    pub reply: Result<String, LlmError>,
    pub classification: JoinHandle<ClassificationOutcome>,
    pub speech: Option<JoinHandle<()>>,
}

/// Clears the busy flag and re-enables input when a send ends, including
/// when its future is dropped mid-reply.
struct BusyGuard<'a> {
    busy: &'a AtomicBool,
    events: &'a UnboundedSender<ChatEvent>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
        let _ = self.events.send(ChatEvent::InputEnabled { enabled: true });
    }
}

pub struct ChatSession<H> {
    llm: LlmService,
    classifier: EmotionClassifier,
    controller: SharedController<H>,
    rules: Arc<Vec<MappingRule>>,
    gate: Arc<ClassificationGate>,
    transcript: Mutex<Transcript>,
    busy: AtomicBool,
    tts: Option<Arc<dyn TtsProvider>>,
    speech_format: String,
    events: UnboundedSender<ChatEvent>,
}

impl<H: ClipHandle + 'static> ChatSession<H> {
    pub fn new(
        llm: LlmService,
        controller: SharedController<H>,
        rules: Vec<MappingRule>,
        ordering: ClassificationOrdering,
        events: UnboundedSender<ChatEvent>,
    ) -> Self {
        Self {
            classifier: EmotionClassifier::new(llm.clone()),
            llm,
            controller,
            rules: Arc::new(rules),
            gate: Arc::new(ClassificationGate::new(ordering)),
            transcript: Mutex::new(Transcript::new()),
            busy: AtomicBool::new(false),
            tts: None,
            speech_format: crate::tts::config::DEFAULT_OUTPUT_FORMAT.to_string(),
            events,
        }
    }

    /// Speak every reply through `provider`. `format` is the provider's
    /// output format string, reported with each `Speech` event.
    pub fn with_tts(mut self, provider: Arc<dyn TtsProvider>, format: impl Into<String>) -> Self {
        self.tts = Some(provider);
        self.speech_format = format.into();
        self
    }

    pub fn controller(&self) -> &SharedController<H> {
        &self.controller
    }

    pub fn gate(&self) -> &ClassificationGate {
        &self.gate
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.lock().await.entries().to_vec()
    }

    /// Handle one user message.
    ///
    /// Blank input is ignored. While a reply is pending further messages are
    /// rejected with [`ChatError::Busy`]. The emotion classification runs on
    /// its own task and is not awaited here.
    pub async fn send_message(&self, text: &str) -> Result<Option<Turn>, ChatError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("[Chat] Rejected message while a reply is pending");
            return Err(ChatError::Busy);
        }
        let busy = BusyGuard {
            busy: &self.busy,
            events: &self.events,
        };

        self.emit(ChatEvent::InputEnabled { enabled: false });

        let request = {
            let mut transcript = self.transcript.lock().await;
            transcript.push(ChatMessage::user(text));
            CompletionRequest {
                system: Some(RESPONSE_SYSTEM_PROMPT.to_string()),
                messages: transcript.messages(),
                params: LlmParams {
                    max_tokens: Some(RESPONSE_MAX_TOKENS),
                    ..Default::default()
                },
            }
        };
        self.emit(ChatEvent::UserMessage {
            text: text.to_string(),
        });

        let classification = self.spawn_classification(text.to_string());

        self.emit(ChatEvent::Thinking);
        let provider = self.llm.provider().await;
        let reply = provider.chat(request).await;
        self.emit(ChatEvent::ThinkingDone);

        let mut speech = None;
        match &reply {
            Ok(reply_text) => {
                self.transcript
                    .lock()
                    .await
                    .push(ChatMessage::assistant(reply_text.clone()));
                self.emit(ChatEvent::AssistantMessage {
                    text: reply_text.clone(),
                });
                speech = self.spawn_speech(reply_text.clone());
            }
            Err(e) => {
                tracing::error!("[Chat] Reply generation failed: {}", e);
                self.emit(ChatEvent::Error {
                    message: REPLY_ERROR_TEXT.to_string(),
                });
            }
        }

        drop(busy);

        Ok(Some(Turn {
            reply,
            classification,
            speech,
        }))
    }

    fn spawn_classification(&self, text: String) -> JoinHandle<ClassificationOutcome> {
        let seq = self.gate.issue();
        let classifier = self.classifier.clone();
        let controller = self.controller.clone();
        let rules = self.rules.clone();
        let gate = self.gate.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let (label, animation) = match classifier.classify(&text).await {
                Ok(label) => {
                    let animation = map_label(&rules, &label);
                    tracing::info!("[Chat] Emotion #{}: '{}' -> {}", seq, label, animation);
                    (Some(label), animation)
                }
                Err(e) => {
                    tracing::warn!("[Chat] Emotion #{} failed, falling back to idle: {}", seq, e);
                    (None, IDLE.to_string())
                }
            };

            let applied = {
                let mut controller = controller.lock().await;
                let admitted = gate.admit(seq);
                if admitted {
                    controller.play_animation(&animation);
                }
                admitted
            };
            if !applied {
                tracing::debug!("[Chat] Dropped stale emotion #{} ({})", seq, animation);
            }

            let _ = events.send(ChatEvent::Emotion {
                label: label.clone(),
                animation: animation.clone(),
                applied,
            });

            ClassificationOutcome {
                seq,
                label,
                animation,
                applied,
            }
        })
    }

    fn spawn_speech(&self, text: String) -> Option<JoinHandle<()>> {
        let tts = self.tts.clone()?;
        let events = self.events.clone();
        let format = self.speech_format.clone();

        Some(tokio::spawn(async move {
            match tts.synthesize(&text, TtsParams::default()).await {
                Ok(audio) => {
                    tracing::debug!("[TTS] Synthesized {} bytes via {}", audio.len(), tts.id());
                    let _ = events.send(ChatEvent::Speech { format, audio });
                }
                Err(e) => tracing::warn!("[TTS] Synthesis failed: {}", e),
            }
        }))
    }

    fn emit(&self, event: ChatEvent) {
        let _ = self.events.send(event);
    }
}
