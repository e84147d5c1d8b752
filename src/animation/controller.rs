//! Playback Controller: owns which clip is active.
//!
//! Starting any clip stops every registered clip first, so at most one clip
//! runs at a time. `Idle` loops forever; every other clip plays once, holds
//! its last pose and hands back to `Idle` when the engine reports that the
//! run finished.
//!
//! The return to idle is a one-shot subscription keyed by a
//! [`CompletionToken`]. Each start mints a fresh token and stopping a clip
//! drops the subscription, so a completion that belongs to a superseded run
//! is inert.

use super::engine::{AnimationName, ClipFinished, ClipHandle, CompletionToken, LoopPolicy, IDLE};
use super::registry::ClipRegistry;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// What a `play_animation` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The idle clip is looping.
    Looping,
    /// A one-shot run started; its completion carries this token.
    OneShot(CompletionToken),
    /// Name not registered. Everything is stopped.
    NotFound,
}

/// Emitted on every state change so a view can follow along.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackEvent {
    /// `None` when no clip is playing.
    pub animation: Option<AnimationName>,
    pub policy: Option<LoopPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingCompletion {
    clip: AnimationName,
    token: CompletionToken,
}

pub struct PlaybackController<H> {
    registry: ClipRegistry<H>,
    current: Option<AnimationName>,
    policy: Option<LoopPolicy>,
    pending: Option<PendingCompletion>,
    next_token: u64,
    events: Option<UnboundedSender<PlaybackEvent>>,
}

impl<H> Default for PlaybackController<H> {
    fn default() -> Self {
        Self {
            registry: ClipRegistry::new(),
            current: None,
            policy: None,
            pending: None,
            next_token: 0,
            events: None,
        }
    }
}

impl<H: ClipHandle> PlaybackController<H> {
    /// A controller with nothing loaded. Every `play_animation` is a no-op.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(registry: ClipRegistry<H>) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Forward every state change to `tx`.
    pub fn with_events(mut self, tx: UnboundedSender<PlaybackEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn registry(&self) -> &ClipRegistry<H> {
        &self.registry
    }

    /// Active clip, or `None` before load / after an unknown name.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn policy(&self) -> Option<LoopPolicy> {
        self.policy
    }

    /// Token of the live return-to-idle subscription, if any.
    pub fn pending_token(&self) -> Option<CompletionToken> {
        self.pending.as_ref().map(|p| p.token)
    }

    /// Names of registered clips the engine reports as running.
    pub fn running_clips(&self) -> Vec<&str> {
        let mut running: Vec<&str> = self
            .registry
            .handles()
            .filter(|(_, h)| h.is_running())
            .map(|(name, _)| name)
            .collect();
        running.sort_unstable();
        running
    }

    pub fn play_animation(&mut self, name: &str) -> PlayOutcome {
        for (_, handle) in self.registry.handles() {
            handle.stop();
        }
        self.pending = None;
        self.current = None;
        self.policy = None;

        let Some(handle) = self.registry.lookup(name) else {
            tracing::debug!("[Anim] Unknown animation '{}', nothing playing", name);
            self.notify();
            return PlayOutcome::NotFound;
        };

        handle.reset();

        let outcome = if name == IDLE {
            handle.set_loop(LoopPolicy::Repeat);
            handle.play(None);
            self.policy = Some(LoopPolicy::Repeat);
            PlayOutcome::Looping
        } else {
            self.next_token += 1;
            let token = CompletionToken::new(self.next_token);
            handle.set_loop(LoopPolicy::OnceThenIdle);
            handle.set_clamp_when_finished(true);
            self.pending = Some(PendingCompletion {
                clip: name.to_string(),
                token,
            });
            handle.play(Some(token));
            self.policy = Some(LoopPolicy::OnceThenIdle);
            PlayOutcome::OneShot(token)
        };

        self.current = Some(name.to_string());
        tracing::info!("[Anim] Playing '{}' ({:?})", name, self.policy);
        self.notify();
        outcome
    }

    /// Engine callback for a finished one-shot run. Returns `true` when the
    /// event matched the live subscription and the controller went back to
    /// idle, `false` when it was stale.
    pub fn on_clip_finished(&mut self, event: &ClipFinished) -> bool {
        match &self.pending {
            Some(p) if p.token == event.token && p.clip == event.clip => {}
            _ => {
                tracing::debug!(
                    "[Anim] Ignoring stale completion of '{}' {}",
                    event.clip,
                    event.token
                );
                return false;
            }
        }

        self.pending = None;
        self.play_animation(IDLE);
        true
    }

    fn notify(&self) {
        if let Some(tx) = &self.events {
            // Receiver gone just means nobody is watching.
            let _ = tx.send(PlaybackEvent {
                animation: self.current.clone(),
                policy: self.policy,
            });
        }
    }
}
