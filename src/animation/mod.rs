pub mod asset;
pub mod controller;
pub mod engine;
pub mod frame;
pub mod mapper;
pub mod mixer;
pub mod registry;

#[cfg(test)]
mod tests;

pub use controller::{PlayOutcome, PlaybackController, PlaybackEvent};
pub use engine::{
    AnimationEngine, AnimationName, ClipFinished, ClipHandle, CompletionToken, LoopPolicy, IDLE,
};
pub use frame::{FrameDriver, FrameReport};
pub use mapper::{map_label, MappingRule};
pub use mixer::{SimClipHandle, SimulatedMixer};
pub use registry::ClipRegistry;

use crate::config::AvatarConfig;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

/// Controller shared between the frame loop and classification tasks.
pub type SharedController<H> = Arc<Mutex<PlaybackController<H>>>;

/// Build the simulated engine and its controller from config, then start
/// `Idle`. When the model file cannot be loaded the controller stays empty
/// and every `play_animation` is a silent no-op.
pub fn load_simulated_avatar(
    config: &AvatarConfig,
    events: Option<UnboundedSender<PlaybackEvent>>,
) -> (SimulatedMixer, PlaybackController<SimClipHandle>) {
    let attach = |controller: PlaybackController<SimClipHandle>| match events {
        Some(tx) => controller.with_events(tx),
        None => controller,
    };

    let specs = match &config.model_path {
        Some(path) => match asset::load_clips(path) {
            Ok(clips) => clips,
            Err(e) => {
                tracing::error!("[Asset] Error loading model: {}", e);
                return (SimulatedMixer::default(), attach(PlaybackController::empty()));
            }
        },
        None => config.clips.clone(),
    };

    let mixer = SimulatedMixer::new(&specs);
    let registry: ClipRegistry<SimClipHandle> = mixer.clips().into_iter().collect();
    tracing::info!("[Anim] Registered clips: {:?}", registry.names());

    let mut controller = attach(PlaybackController::new(registry));
    controller.play_animation(IDLE);
    (mixer, controller)
}
