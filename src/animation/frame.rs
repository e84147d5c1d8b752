//! Frame Driver: per-frame tick.
//!
//! Measures the time since the previous frame, lets the engine advance every
//! running clip, hands finished one-shot runs to the controller and renders.
//! The controller itself never moves time forward.

use super::engine::{AnimationEngine, ClipFinished};
use super::SharedController;
use std::time::{Duration, Instant};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Step actually applied, in seconds.
    pub dt: f32,
    pub finished: Vec<ClipFinished>,
    /// Completions that returned the avatar to idle.
    pub transitions: usize,
}

pub struct FrameDriver<E: AnimationEngine> {
    engine: E,
    controller: SharedController<E::Handle>,
    last_frame: Option<Instant>,
    max_step: f32,
    frames: u64,
}

impl<E: AnimationEngine> FrameDriver<E> {
    pub fn new(engine: E, controller: SharedController<E::Handle>, max_step: f32) -> Self {
        Self {
            engine,
            controller,
            last_frame: None,
            max_step: max_step.max(0.0),
            frames: 0,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// One frame using wall-clock time. The first frame advances by zero.
    pub async fn tick(&mut self) -> FrameReport {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|prev| now.duration_since(prev).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.step(dt).await
    }

    /// One frame with an explicit delta, clamped to `[0, max_step]`.
    pub async fn step(&mut self, dt: f32) -> FrameReport {
        let dt = dt.clamp(0.0, self.max_step);
        let finished = self.engine.advance(dt);

        let mut transitions = 0;
        if !finished.is_empty() {
            let mut controller = self.controller.lock().await;
            for event in &finished {
                if controller.on_clip_finished(event) {
                    transitions += 1;
                }
            }
        }

        self.engine.render();
        self.frames += 1;

        FrameReport {
            dt,
            finished,
            transitions,
        }
    }

    /// Tick at `fps` until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(mut self, fps: u32, mut shutdown: watch::Receiver<bool>) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("[Frame] Stopped after {} frames", self.frames);
        self
    }
}
