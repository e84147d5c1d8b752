//! Playback controller scenarios against the simulated mixer.
//!
//! These tests verify:
//! 1. At most one clip runs after any sequence of calls
//! 2. One-shot clips return to `Idle` on completion, `Idle` never self-transitions
//! 3. A superseded run's completion is inert
//! 4. Unknown names stop everything without failing

use super::*;
use crate::config::ClipSpec;
use proptest::prelude::*;
use std::sync::Arc;
use tokio::sync::Mutex;

fn specs() -> Vec<ClipSpec> {
    vec![
        ClipSpec::new("Idle", 4.0),
        ClipSpec::new("Happy", 1.0),
        ClipSpec::new("Sad", 2.0),
    ]
}

fn setup() -> (SimulatedMixer, PlaybackController<SimClipHandle>) {
    let mixer = SimulatedMixer::new(&specs());
    let registry: ClipRegistry<SimClipHandle> = mixer.clips().into_iter().collect();
    (mixer, PlaybackController::new(registry))
}

/// Advance the mixer and feed completions back, like one frame would.
fn frame(
    mixer: &mut SimulatedMixer,
    controller: &mut PlaybackController<SimClipHandle>,
    dt: f32,
) -> usize {
    mixer
        .advance(dt)
        .iter()
        .filter(|event| controller.on_clip_finished(event))
        .count()
}

// ── Basic Transitions ──────────────────────────────────────

#[test]
fn starts_with_nothing_playing() {
    let (_, controller) = setup();
    assert_eq!(controller.current(), None);
    assert!(controller.running_clips().is_empty());
}

#[test]
fn idle_loops_without_subscription() {
    let (mut mixer, mut controller) = setup();
    assert_eq!(controller.play_animation(IDLE), PlayOutcome::Looping);
    assert_eq!(controller.policy(), Some(LoopPolicy::Repeat));
    assert_eq!(controller.pending_token(), None);

    for _ in 0..20 {
        assert_eq!(frame(&mut mixer, &mut controller, 1.0), 0);
    }
    assert_eq!(controller.current(), Some(IDLE));
}

#[test]
fn one_shot_returns_to_idle() {
    let (mut mixer, mut controller) = setup();
    controller.play_animation(IDLE);

    let outcome = controller.play_animation("Happy");
    assert!(matches!(outcome, PlayOutcome::OneShot(_)));
    assert_eq!(controller.current(), Some("Happy"));
    assert_eq!(controller.policy(), Some(LoopPolicy::OnceThenIdle));
    assert_eq!(controller.running_clips(), vec!["Happy"]);

    let happy = mixer.handle("Happy").unwrap();
    assert!(happy.clamps_when_finished());

    assert_eq!(frame(&mut mixer, &mut controller, 0.5), 0);
    assert_eq!(controller.current(), Some("Happy"));

    assert_eq!(frame(&mut mixer, &mut controller, 0.6), 1);
    assert_eq!(controller.current(), Some(IDLE));
    assert_eq!(controller.policy(), Some(LoopPolicy::Repeat));
    assert_eq!(controller.running_clips(), vec![IDLE]);
}

#[test]
fn play_resets_clip_time() {
    let (mut mixer, mut controller) = setup();
    controller.play_animation("Sad");
    frame(&mut mixer, &mut controller, 1.5);

    controller.play_animation("Sad");
    assert_eq!(mixer.handle("Sad").unwrap().time(), 0.0);
}

#[test]
fn idle_twice_is_same_as_once() {
    let (mut mixer, mut controller) = setup();
    controller.play_animation(IDLE);
    frame(&mut mixer, &mut controller, 1.0);
    controller.play_animation(IDLE);

    assert_eq!(controller.current(), Some(IDLE));
    assert_eq!(controller.policy(), Some(LoopPolicy::Repeat));
    assert_eq!(controller.running_clips(), vec![IDLE]);
    assert_eq!(mixer.handle(IDLE).unwrap().time(), 0.0);
}

#[test]
fn unknown_name_stops_everything() {
    let (mut mixer, mut controller) = setup();
    controller.play_animation("Happy");

    assert_eq!(controller.play_animation("Dance"), PlayOutcome::NotFound);
    assert_eq!(controller.current(), None);
    assert_eq!(controller.policy(), None);
    assert_eq!(controller.pending_token(), None);
    assert!(controller.running_clips().is_empty());

    // Nothing comes back to idle on its own.
    assert_eq!(frame(&mut mixer, &mut controller, 10.0), 0);
    assert_eq!(controller.current(), None);
}

#[test]
fn empty_controller_is_silent() {
    let mut controller: PlaybackController<SimClipHandle> = PlaybackController::empty();
    assert_eq!(controller.play_animation(IDLE), PlayOutcome::NotFound);
    assert_eq!(controller.play_animation("Happy"), PlayOutcome::NotFound);
    assert_eq!(controller.current(), None);
}

// ── Stale Completions ──────────────────────────────────────

#[test]
fn switching_clips_drops_previous_subscription() {
    let (mut mixer, mut controller) = setup();
    let first = match controller.play_animation("Happy") {
        PlayOutcome::OneShot(token) => token,
        other => panic!("expected one-shot, got {:?}", other),
    };
    controller.play_animation("Sad");

    let stale = ClipFinished {
        clip: "Happy".to_string(),
        token: first,
    };
    assert!(!controller.on_clip_finished(&stale));
    assert_eq!(controller.current(), Some("Sad"));

    // Happy was stopped, so the mixer never reports it either.
    assert_eq!(frame(&mut mixer, &mut controller, 1.5), 0);
    assert_eq!(controller.current(), Some("Sad"));
}

#[test]
fn restart_same_clip_ignores_first_run() {
    let (mut mixer, mut controller) = setup();
    let first = match controller.play_animation("Happy") {
        PlayOutcome::OneShot(token) => token,
        other => panic!("expected one-shot, got {:?}", other),
    };
    frame(&mut mixer, &mut controller, 0.5);

    let second = match controller.play_animation("Happy") {
        PlayOutcome::OneShot(token) => token,
        other => panic!("expected one-shot, got {:?}", other),
    };
    assert_ne!(first, second);

    // The first run's completion shows up late.
    let late = ClipFinished {
        clip: "Happy".to_string(),
        token: first,
    };
    assert!(!controller.on_clip_finished(&late));
    assert_eq!(controller.current(), Some("Happy"));
    assert_eq!(controller.pending_token(), Some(second));

    // The second run still finishes on its own schedule.
    assert_eq!(frame(&mut mixer, &mut controller, 0.6), 0);
    assert_eq!(frame(&mut mixer, &mut controller, 0.5), 1);
    assert_eq!(controller.current(), Some(IDLE));
}

#[test]
fn completion_for_wrong_clip_is_ignored() {
    let (_, mut controller) = setup();
    let token = match controller.play_animation("Happy") {
        PlayOutcome::OneShot(token) => token,
        other => panic!("expected one-shot, got {:?}", other),
    };
    let mismatched = ClipFinished {
        clip: "Sad".to_string(),
        token,
    };
    assert!(!controller.on_clip_finished(&mismatched));
    assert_eq!(controller.current(), Some("Happy"));
}

#[test]
fn completion_fires_once() {
    let (_, mut controller) = setup();
    let token = match controller.play_animation("Happy") {
        PlayOutcome::OneShot(token) => token,
        other => panic!("expected one-shot, got {:?}", other),
    };
    let event = ClipFinished {
        clip: "Happy".to_string(),
        token,
    };
    assert!(controller.on_clip_finished(&event));
    assert!(!controller.on_clip_finished(&event));
    assert_eq!(controller.current(), Some(IDLE));
}

// ── Events ─────────────────────────────────────────────────

#[test]
fn state_changes_are_published() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let (mut mixer, controller) = setup();
    let mut controller = controller.with_events(tx);

    controller.play_animation("Happy");
    frame(&mut mixer, &mut controller, 2.0);
    controller.play_animation("Nope");

    let seen: Vec<Option<String>> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|e| e.animation)
        .collect();
    assert_eq!(
        seen,
        vec![
            Some("Happy".to_string()),
            Some(IDLE.to_string()),
            None
        ]
    );
}

// ── Frame Driver ───────────────────────────────────────────

#[tokio::test]
async fn frame_driver_hands_completions_to_controller() {
    let (mixer, mut controller) = setup();
    controller.play_animation("Happy");
    let shared: SharedController<SimClipHandle> = Arc::new(Mutex::new(controller));
    let mut driver = FrameDriver::new(mixer, shared.clone(), 0.25);

    // Steps are clamped to 0.25s, so four frames to finish a 1s clip.
    for _ in 0..3 {
        let report = driver.step(10.0).await;
        assert_eq!(report.dt, 0.25);
        assert_eq!(report.transitions, 0);
    }
    let report = driver.step(10.0).await;
    assert_eq!(report.transitions, 1);
    assert_eq!(shared.lock().await.current(), Some(IDLE));
    assert_eq!(driver.frames(), 4);
}

#[tokio::test]
async fn frame_driver_ignores_negative_delta() {
    let (mixer, mut controller) = setup();
    controller.play_animation("Sad");
    let shared = Arc::new(Mutex::new(controller));
    let mut driver = FrameDriver::new(mixer, shared, 1.0);

    let report = driver.step(-5.0).await;
    assert_eq!(report.dt, 0.0);
    assert_eq!(driver.engine().handle("Sad").unwrap().time(), 0.0);
}

#[tokio::test]
async fn frame_loop_stops_on_shutdown() {
    let (mixer, mut controller) = setup();
    controller.play_animation("Happy");
    let shared = Arc::new(Mutex::new(controller));
    let driver = FrameDriver::new(mixer, shared, 0.1);

    let (tx, rx) = tokio::sync::watch::channel(false);
    let handle = tokio::spawn(driver.run(120, rx));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    tx.send(true).unwrap();

    let driver = handle.await.unwrap();
    assert!(driver.frames() > 0);
}

#[test]
fn failed_model_load_leaves_controller_empty() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = crate::config::AvatarConfig {
        model_path: Some(tmp.path().join("Michelle.glb")),
        ..Default::default()
    };
    let (mixer, mut controller) = load_simulated_avatar(&config, None);
    assert!(mixer.clips().is_empty());
    assert_eq!(controller.current(), None);
    assert_eq!(controller.play_animation("Happy"), PlayOutcome::NotFound);
}

#[test]
fn configured_clips_start_idle() {
    let (_, controller) = load_simulated_avatar(&Default::default(), None);
    assert_eq!(controller.current(), Some(IDLE));
    assert_eq!(controller.registry().names(), vec!["Happy", "Idle", "Sad"]);
}

// ── Property Tests ─────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Play(&'static str),
    Advance(f32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::sample::select(vec!["Idle", "Happy", "Sad", "Dance"]).prop_map(Op::Play),
        (0.0f32..3.0).prop_map(Op::Advance),
    ]
}

proptest! {
    #[test]
    fn at_most_one_clip_running(ops in prop::collection::vec(op(), 1..60)) {
        let (mut mixer, mut controller) = setup();
        for op in ops {
            match op {
                Op::Play(name) => { controller.play_animation(name); }
                Op::Advance(dt) => { frame(&mut mixer, &mut controller, dt); }
            }
            let running = controller.running_clips();
            prop_assert!(running.len() <= 1, "running: {:?}", running);
            if let Some(current) = controller.current() {
                prop_assert_eq!(running, vec![current]);
            }
        }
    }

    #[test]
    fn only_latest_subscription_is_live(names in prop::collection::vec(
        prop::sample::select(vec!["Happy", "Sad"]), 2..10,
    )) {
        let (_, mut controller) = setup();
        let tokens: Vec<CompletionToken> = names
            .iter()
            .filter_map(|name| match controller.play_animation(name) {
                PlayOutcome::OneShot(token) => Some(token),
                _ => None,
            })
            .collect();

        let (last, stale) = tokens.split_last().unwrap();
        for (token, name) in stale.iter().zip(&names) {
            let event = ClipFinished { clip: name.to_string(), token: *token };
            prop_assert!(!controller.on_clip_finished(&event));
        }
        prop_assert_eq!(controller.pending_token(), Some(*last));
    }
}
