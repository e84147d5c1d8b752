// Terminal driver: chat on stdin, avatar state and replies on stdout.

use anyhow::Context;
use clap::Parser;
use futures::FutureExt;
use mood_avatar::animation::{load_simulated_avatar, FrameDriver, LoopPolicy, PlaybackEvent};
use mood_avatar::chat::{ChatError, ChatEvent, ChatSession, ClassificationOutcome};
use mood_avatar::config::{self, AppConfig};
use mood_avatar::llm::LlmService;
use mood_avatar::tts;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mood-avatar")]
#[command(about = "Chat with an avatar that acts out the mood of the conversation", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to <config dir>/mood-avatar/mood_avatar.json)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// glTF / GLB model to read animation clips from
    #[arg(long, short)]
    model: Option<PathBuf>,

    /// Animation frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Write the effective config to the config file and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let mut app_config: AppConfig = config::load_config(&config_path);
    if let Some(model) = cli.model {
        app_config.avatar.model_path = Some(model);
    }
    if let Some(fps) = cli.fps {
        app_config.avatar.fps = fps;
    }

    if cli.write_config {
        config::save_config(&config_path, &app_config)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("Wrote {}", config_path.display());
        return Ok(());
    }

    // ── Avatar ─────────────────────────────────────────
    let (playback_tx, mut playback_rx) = mpsc::unbounded_channel();
    let (mixer, controller) = load_simulated_avatar(&app_config.avatar, Some(playback_tx));
    let controller = Arc::new(Mutex::new(controller));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let driver = FrameDriver::new(mixer, controller.clone(), app_config.avatar.max_frame_step);
    let frame_loop = tokio::spawn(driver.run(app_config.avatar.fps, shutdown_rx));

    // ── Chat ───────────────────────────────────────────
    let llm = LlmService::from_config(app_config.llm.clone());
    let (chat_tx, mut chat_rx) = mpsc::unbounded_channel();
    let mut session = ChatSession::new(
        llm,
        controller,
        app_config.avatar.mapping_rules.clone(),
        app_config.avatar.classification_ordering,
        chat_tx,
    );
    if let Some(provider) = tts::build_provider(&app_config.tts) {
        session = session.with_tts(provider, app_config.tts.output_format.clone());
    }

    let audio_dir = app_config
        .tts
        .output_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("mood-avatar"));
    let printer = tokio::spawn(async move {
        let mut spoken = 0u32;
        loop {
            tokio::select! {
                Some(event) = playback_rx.recv() => print_playback(&event),
                Some(event) = chat_rx.recv() => {
                    if let Err(e) = print_chat(event, &audio_dir, &mut spoken).await {
                        tracing::warn!("[TTS] {:#}", e);
                    }
                }
                else => break,
            }
        }
    });

    println!("Type a message and press Enter. Ctrl-D to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut background: Vec<JoinHandle<()>> = Vec::new();
    let mut classifications: Vec<JoinHandle<ClassificationOutcome>> = Vec::new();
    let mut tally = Tally::default();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = &mut ctrl_c => None,
        };
        let Some(line) = line else { break };

        let sent = tokio::select! {
            sent = session.send_message(&line) => sent,
            _ = &mut ctrl_c => break,
        };
        match sent {
            Ok(Some(turn)) => {
                classifications.push(turn.classification);
                background.extend(turn.speech);
            }
            Ok(None) => {}
            Err(ChatError::Busy) => println!("(still answering, one moment)"),
        }

        tally.reap(&mut classifications);
        background.retain(|handle| !handle.is_finished());
    }

    // Let in-flight classifications and speech settle before tearing down.
    for outcome in futures::future::join_all(classifications).await {
        tally.record(outcome);
    }
    futures::future::join_all(background).await;
    tracing::info!(
        "[Chat] {} turns, {} emotion updates applied",
        tally.turns,
        tally.applied
    );

    let _ = shutdown_tx.send(true);
    let driver = frame_loop.await.context("frame loop panicked")?;
    tracing::info!("[Frame] Rendered {} frames", driver.frames());

    drop(driver);
    drop(session);
    printer.await.context("event printer panicked")?;
    Ok(())
}

#[derive(Default)]
struct Tally {
    turns: usize,
    applied: usize,
}

impl Tally {
    fn record(&mut self, outcome: Result<ClassificationOutcome, JoinError>) {
        self.turns += 1;
        match outcome {
            Ok(outcome) if outcome.applied => self.applied += 1,
            Ok(_) => {}
            Err(e) => tracing::warn!("[Chat] Emotion task failed: {}", e),
        }
    }

    /// Count and drop the handles whose task already finished.
    fn reap(&mut self, handles: &mut Vec<JoinHandle<ClassificationOutcome>>) {
        let (done, pending): (Vec<_>, Vec<_>) =
            handles.drain(..).partition(|handle| handle.is_finished());
        *handles = pending;
        for handle in done {
            if let Some(outcome) = handle.now_or_never() {
                self.record(outcome);
            }
        }
    }
}

fn print_playback(event: &PlaybackEvent) {
    match (&event.animation, event.policy) {
        (Some(name), Some(LoopPolicy::Repeat)) => println!("[avatar] {} (looping)", name),
        (Some(name), _) => println!("[avatar] {} (once)", name),
        (None, _) => println!("[avatar] (no animation)"),
    }
}

async fn print_chat(event: ChatEvent, audio_dir: &Path, spoken: &mut u32) -> anyhow::Result<()> {
    match event {
        ChatEvent::Thinking => println!("..."),
        ChatEvent::AssistantMessage { text } => println!("> {}", text),
        ChatEvent::Error { message } => println!("{}", message),
        ChatEvent::Emotion {
            label,
            animation,
            applied,
        } => tracing::debug!(
            "[Chat] emotion {:?} -> {} (applied: {})",
            label,
            animation,
            applied
        ),
        ChatEvent::Speech { format, audio } => {
            tokio::fs::create_dir_all(audio_dir)
                .await
                .with_context(|| format!("failed to create {}", audio_dir.display()))?;
            *spoken += 1;
            let extension = format.split('_').next().unwrap_or("bin");
            let path = audio_dir.join(format!("reply-{:03}.{}", spoken, extension));
            tokio::fs::write(&path, &audio)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("(audio saved to {})", path.display());
        }
        ChatEvent::InputEnabled { .. } | ChatEvent::UserMessage { .. } | ChatEvent::ThinkingDone => {}
    }
    Ok(())
}
