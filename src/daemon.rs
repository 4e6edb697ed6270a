//! Daemon module - main event loop orchestration
//!
//! Coordinates the hotkey listener, recorder, WAV processor, transcription
//! engine, and text insertion. Holds the Idle → Recording → Processing
//! state machine; the processing pipeline runs on a worker task spawned per
//! stop event so the hotkey dispatch loop stays responsive.

use crate::audio::wav::AudioProcessor;
use crate::audio::Capture;
use crate::config::Config;
use crate::error::{AudioError, HoldtypeError, Result, TranscribeError};
use crate::hotkey::HotkeyEvent;
use crate::insert::TextInsert;
use crate::notification::Notifier;
use crate::state::State;
use crate::transcribe::{SpeechToText, TranscriptionEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Notification title used for every user-facing message
const NOTIFY_TITLE: &str = "holdtype";

/// Slot holding the speech engine, which loads on a background task at
/// startup. The first transcription awaits the load handle; afterwards the
/// engine lives in the slot between uses.
enum EngineSlot {
    /// Load task still running
    Loading(JoinHandle<Box<dyn SpeechToText>>),
    /// Engine available
    Ready(Box<dyn SpeechToText>),
    /// Load task died, or the engine is out on loan to a worker
    Unavailable,
}

/// Shared handle to the engine slot
#[derive(Clone)]
pub struct SharedEngine(Arc<tokio::sync::Mutex<EngineSlot>>);

impl SharedEngine {
    /// Start loading an engine on a background blocking task
    pub fn spawn_load(config: crate::config::WhisperConfig) -> Self {
        let handle = tokio::task::spawn_blocking(move || {
            let mut engine = TranscriptionEngine::new(&config);
            if let Err(e) = engine.load() {
                tracing::error!("Failed to load model: {}", e);
            }
            Box::new(engine) as Box<dyn SpeechToText>
        });
        Self(Arc::new(tokio::sync::Mutex::new(EngineSlot::Loading(
            handle,
        ))))
    }

    /// Wrap an engine that is already loaded
    pub fn ready(engine: Box<dyn SpeechToText>) -> Self {
        Self(Arc::new(tokio::sync::Mutex::new(EngineSlot::Ready(engine))))
    }

    /// Transcribe a WAV file, blocking on the load task on first use.
    /// Inference itself runs on a blocking task.
    pub async fn transcribe(
        &self,
        wav_path: PathBuf,
    ) -> std::result::Result<String, TranscribeError> {
        let mut slot = self.0.lock().await;

        // The slot is parked as Unavailable while the engine is out on loan
        let engine = match std::mem::replace(&mut *slot, EngineSlot::Unavailable) {
            EngineSlot::Loading(handle) => match handle.await {
                Ok(engine) => engine,
                Err(e) => {
                    tracing::error!("Model loading task failed: {}", e);
                    return Err(TranscribeError::ModelNotLoaded);
                }
            },
            EngineSlot::Ready(engine) => engine,
            EngineSlot::Unavailable => return Err(TranscribeError::ModelNotLoaded),
        };

        let join = tokio::task::spawn_blocking(move || {
            let mut engine = engine;
            let result = engine.transcribe(&wav_path);
            (engine, result)
        })
        .await;

        match join {
            Ok((engine, result)) => {
                *slot = EngineSlot::Ready(engine);
                result
            }
            Err(e) => {
                tracing::error!("Transcription task failed: {}", e);
                Err(TranscribeError::InferenceFailed(e.to_string()))
            }
        }
    }
}

/// Main daemon that orchestrates all components
pub struct Daemon {
    config: Config,
    recorder: Box<dyn Capture>,
    processor: Arc<AudioProcessor>,
    engine: SharedEngine,
    inserter: Arc<dyn TextInsert>,
    notifier: Arc<dyn Notifier>,
    state: State,
}

impl Daemon {
    /// Create a new daemon from injected components
    pub fn new(
        config: Config,
        recorder: Box<dyn Capture>,
        processor: Arc<AudioProcessor>,
        engine: SharedEngine,
        inserter: Arc<dyn TextInsert>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            recorder,
            processor,
            engine,
            inserter,
            notifier,
            state: State::new(),
        }
    }

    /// Run the daemon main loop until the event channel closes or a
    /// termination signal arrives. In-flight workers are not joined.
    pub async fn run(mut self, mut events: mpsc::Receiver<HotkeyEvent>) -> Result<()> {
        tracing::info!("Starting holdtype daemon");

        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
            HoldtypeError::Config(format!("Failed to set up SIGTERM handler: {}", e))
        })?;

        // Workers report completion here to return the state to Idle
        let (done_tx, mut done_rx) = mpsc::channel::<()>(4);

        loop {
            tokio::select! {
                maybe_event = events.recv() => {
                    match maybe_event {
                        Some(event) => self.handle_event(event, &done_tx).await,
                        None => {
                            tracing::info!("Hotkey channel closed, shutting down");
                            break;
                        }
                    }
                }

                Some(()) = done_rx.recv() => {
                    self.state = State::Idle;
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT, shutting down...");
                    break;
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down...");
                    break;
                }
            }
        }

        tracing::info!("Daemon stopped");
        Ok(())
    }

    async fn handle_event(&mut self, event: HotkeyEvent, done_tx: &mpsc::Sender<()>) {
        match event {
            HotkeyEvent::Pressed => {
                if !self.state.is_idle() {
                    tracing::debug!("Ignoring press in state {}", self.state);
                    return;
                }

                match self.recorder.start() {
                    Ok(()) => {
                        self.state = State::Recording {
                            started_at: std::time::Instant::now(),
                        };
                        self.notifier
                            .notify(NOTIFY_TITLE, "Recording... (release key to process)")
                            .await;
                    }
                    Err(e) => {
                        tracing::error!("Failed to start recording: {}", e);
                    }
                }
            }

            HotkeyEvent::Released => {
                if !self.state.is_recording() {
                    tracing::debug!("Ignoring release in state {}", self.state);
                    return;
                }

                if let Some(duration) = self.state.recording_duration() {
                    tracing::info!("Recording stopped ({:.1}s)", duration.as_secs_f32());
                }

                match self.recorder.stop() {
                    Ok(samples) => {
                        self.state = State::Processing;
                        self.spawn_pipeline(samples, done_tx.clone());
                    }
                    Err(AudioError::NoData) => {
                        self.notifier.notify(NOTIFY_TITLE, "No audio recorded").await;
                        self.state = State::Idle;
                    }
                    Err(e) => {
                        tracing::error!("Recording error: {}", e);
                        self.notifier.notify(NOTIFY_TITLE, "No audio recorded").await;
                        self.state = State::Idle;
                    }
                }
            }
        }
    }

    /// Hand the captured session to a worker task. Each stage failure
    /// short-circuits the rest with its own notification.
    fn spawn_pipeline(&self, samples: Vec<f32>, done_tx: mpsc::Sender<()>) {
        let processor = self.processor.clone();
        let engine = self.engine.clone();
        let inserter = self.inserter.clone();
        let notifier = self.notifier.clone();
        let sample_rate = self.config.audio.sample_rate;

        tokio::spawn(async move {
            run_pipeline(samples, sample_rate, processor, engine, inserter, notifier).await;
            let _ = done_tx.send(()).await;
        });
    }
}

async fn run_pipeline(
    samples: Vec<f32>,
    sample_rate: u32,
    processor: Arc<AudioProcessor>,
    engine: SharedEngine,
    inserter: Arc<dyn TextInsert>,
    notifier: Arc<dyn Notifier>,
) {
    notifier.notify(NOTIFY_TITLE, "Processing audio...").await;

    let save_result = tokio::task::spawn_blocking({
        let processor = processor.clone();
        move || processor.save_to_wav(&samples, sample_rate)
    })
    .await;

    let wav_path = match save_result {
        Ok(Some(path)) => path,
        Ok(None) => {
            notifier
                .notify(NOTIFY_TITLE, "Failed to save audio file")
                .await;
            return;
        }
        Err(e) => {
            tracing::error!("Save task failed: {}", e);
            notifier
                .notify(NOTIFY_TITLE, "Failed to save audio file")
                .await;
            return;
        }
    };

    if !processor.validate_wav_file(&wav_path) {
        notifier
            .notify(NOTIFY_TITLE, "Invalid audio recording. Please try again.")
            .await;
        return;
    }

    let text = match engine.transcribe(wav_path).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Transcription failed: {}", e);
            notifier.notify(NOTIFY_TITLE, "Transcription failed").await;
            return;
        }
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        notifier
            .notify(
                NOTIFY_TITLE,
                "No speech detected. Try speaking louder or check mic.",
            )
            .await;
        return;
    }

    tracing::info!("Raw transcription: {:?}", text);

    match inserter.insert(&text).await {
        Ok(()) => {
            notifier
                .notify(NOTIFY_TITLE, &format!("Inserted: {}", preview(&text)))
                .await;
        }
        Err(e) => {
            tracing::error!("Failed to insert text: {}", e);
            notifier.notify(NOTIFY_TITLE, "Failed to insert text").await;
        }
    }
}

/// Truncate a transcript for the success notification
fn preview(text: &str) -> String {
    if text.chars().count() > 50 {
        format!("{}...", text.chars().take(50).collect::<String>())
    } else {
        text.to_string()
    }
}
