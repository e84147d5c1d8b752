pub mod animation;
pub mod chat;
pub mod config;
pub mod emotion;
pub mod llm;
pub mod tts;
pub mod utils;
