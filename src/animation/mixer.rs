//! In-process mixer that stands in for a graphics engine.
//!
//! Clips carry only a name and a duration. Advancing time follows the usual
//! mixer rules: repeating clips wrap, one-shot clips stop at the end (holding
//! the last pose when clamped) and report exactly one [`ClipFinished`].

use super::engine::{
    AnimationEngine, AnimationName, ClipFinished, ClipHandle, CompletionToken, LoopPolicy,
};
use crate::config::ClipSpec;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct ClipState {
    duration: f32,
    time: f32,
    loop_policy: LoopPolicy,
    clamp_when_finished: bool,
    running: bool,
    token: Option<CompletionToken>,
}

impl ClipState {
    fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            time: 0.0,
            loop_policy: LoopPolicy::Repeat,
            clamp_when_finished: false,
            running: false,
            token: None,
        }
    }

    /// Returns the run's token if this step ended a one-shot run.
    fn advance(&mut self, dt: f32) -> Option<CompletionToken> {
        if !self.running {
            return None;
        }

        self.time += dt;

        match self.loop_policy {
            LoopPolicy::Repeat => {
                if self.duration > 0.0 && self.time >= self.duration {
                    self.time %= self.duration;
                } else if self.duration <= 0.0 {
                    self.time = 0.0;
                }
                None
            }
            LoopPolicy::OnceThenIdle => {
                if self.time < self.duration {
                    return None;
                }
                self.time = if self.clamp_when_finished {
                    self.duration
                } else {
                    0.0
                };
                self.running = false;
                self.token.take()
            }
        }
    }
}

/// Handle into one clip of a [`SimulatedMixer`].
#[derive(Debug, Clone)]
pub struct SimClipHandle {
    state: Arc<Mutex<ClipState>>,
}

impl SimClipHandle {
    fn with_state<R>(&self, f: impl FnOnce(&mut ClipState) -> R) -> Option<R> {
        match self.state.lock() {
            Ok(mut state) => Some(f(&mut state)),
            Err(_) => {
                tracing::error!("[Mixer] Clip state lock poisoned");
                None
            }
        }
    }

    /// Local clip time in seconds.
    pub fn time(&self) -> f32 {
        self.with_state(|s| s.time).unwrap_or(0.0)
    }

    pub fn duration(&self) -> f32 {
        self.with_state(|s| s.duration).unwrap_or(0.0)
    }

    pub fn loop_policy(&self) -> Option<LoopPolicy> {
        self.with_state(|s| s.loop_policy)
    }

    pub fn clamps_when_finished(&self) -> bool {
        self.with_state(|s| s.clamp_when_finished).unwrap_or(false)
    }
}

impl ClipHandle for SimClipHandle {
    fn stop(&self) {
        self.with_state(|s| {
            s.running = false;
            s.token = None;
        });
    }

    fn reset(&self) {
        self.with_state(|s| s.time = 0.0);
    }

    fn set_loop(&self, policy: LoopPolicy) {
        self.with_state(|s| s.loop_policy = policy);
    }

    fn set_clamp_when_finished(&self, clamp: bool) {
        self.with_state(|s| s.clamp_when_finished = clamp);
    }

    fn play(&self, token: Option<CompletionToken>) {
        self.with_state(|s| {
            s.running = true;
            s.token = token;
        });
    }

    fn is_running(&self) -> bool {
        self.with_state(|s| s.running).unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct SimulatedMixer {
    clips: Vec<(AnimationName, SimClipHandle)>,
}

impl SimulatedMixer {
    pub fn new(specs: &[ClipSpec]) -> Self {
        let clips = specs
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    SimClipHandle {
                        state: Arc::new(Mutex::new(ClipState::new(spec.duration))),
                    },
                )
            })
            .collect();
        Self { clips }
    }

    pub fn handle(&self, name: &str) -> Option<SimClipHandle> {
        self.clips
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, h)| h.clone())
    }
}

impl AnimationEngine for SimulatedMixer {
    type Handle = SimClipHandle;

    fn clips(&self) -> Vec<(AnimationName, SimClipHandle)> {
        self.clips.clone()
    }

    fn advance(&mut self, dt: f32) -> Vec<ClipFinished> {
        let dt = dt.max(0.0);
        self.clips
            .iter()
            .filter_map(|(name, handle)| {
                handle
                    .with_state(|s| s.advance(dt))
                    .flatten()
                    .map(|token| ClipFinished {
                        clip: name.clone(),
                        token,
                    })
            })
            .collect()
    }
}
