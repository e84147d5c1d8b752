//! Animation engine boundary: what the playback controller and the frame
//! driver need from whatever actually owns the clips.

use serde::Serialize;
use std::fmt;

pub type AnimationName = String;

/// The resting clip. Loops forever and never self-transitions.
pub const IDLE: &str = "Idle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopPolicy {
    /// Loop with an unbounded repeat count.
    Repeat,
    /// One iteration, hold the final pose, then hand back to idle.
    OnceThenIdle,
}

/// Identifies a single one-shot start. Minted fresh by every `play_animation`
/// of a non-idle clip; the engine echoes it back when that run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CompletionToken(u64);

impl CompletionToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CompletionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Natural end of a one-shot run, reported by the engine on advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipFinished {
    pub clip: AnimationName,
    pub token: CompletionToken,
}

/// An engine-owned playable clip. Handles are cheap references into engine
/// state; the controller never owns the clip itself.
pub trait ClipHandle: Send + Sync {
    /// Halt playback and forget the run's completion token.
    fn stop(&self);

    /// Rewind local time to zero.
    fn reset(&self);

    fn set_loop(&self, policy: LoopPolicy);

    /// Hold the last frame when a one-shot run ends instead of snapping to zero.
    fn set_clamp_when_finished(&self, clamp: bool);

    /// Start playback. A one-shot run carries the token it reports on finish.
    fn play(&self, token: Option<CompletionToken>);

    fn is_running(&self) -> bool;
}

/// The part of a graphics engine the frame driver talks to.
pub trait AnimationEngine: Send {
    type Handle: ClipHandle + Clone + 'static;

    /// Every clip of the loaded asset.
    fn clips(&self) -> Vec<(AnimationName, Self::Handle)>;

    /// Advance all running clips by `dt` seconds and report the one-shot runs
    /// that reached their end during this step.
    fn advance(&mut self, dt: f32) -> Vec<ClipFinished>;

    /// Draw the current pose. Engines without output may ignore this.
    fn render(&mut self) {}
}
