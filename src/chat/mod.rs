pub mod session;
pub mod transcript;


pub use session::{
    ChatError, ChatEvent, ChatSession, ClassificationOutcome, Turn, REPLY_ERROR_TEXT,
    RESPONSE_SYSTEM_PROMPT,
};
pub use transcript::{Transcript, TranscriptEntry};
