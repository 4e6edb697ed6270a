//! End-to-end pipeline tests driving the daemon with fake components
//!
//! The recorder, speech engine, inserter, and notifier are fakes; WAV
//! saving and validation run for real against a temp directory, so these
//! tests cover the full press → record → save → transcribe → insert flow.

use async_trait::async_trait;
use holdtype::audio::wav::AudioProcessor;
use holdtype::audio::Capture;
use holdtype::config::Config;
use holdtype::daemon::{Daemon, SharedEngine};
use holdtype::error::{AudioError, InsertError, TranscribeError};
use holdtype::hotkey::HotkeyEvent;
use holdtype::insert::TextInsert;
use holdtype::notification::Notifier;
use holdtype::transcribe::SpeechToText;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

struct FakeCapture {
    blocks: Vec<Vec<f32>>,
    started: bool,
}

impl Capture for FakeCapture {
    fn start(&mut self) -> Result<(), AudioError> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<Vec<f32>, AudioError> {
        if !self.started {
            return Err(AudioError::NoData);
        }
        self.started = false;
        if self.blocks.is_empty() {
            return Err(AudioError::NoData);
        }
        let mut buffer = Vec::new();
        for block in &self.blocks {
            buffer.extend_from_slice(block);
        }
        Ok(buffer)
    }
}

struct FakeSpeech {
    text: &'static str,
    calls: Arc<AtomicUsize>,
}

impl SpeechToText for FakeSpeech {
    fn transcribe(&mut self, _wav_path: &Path) -> Result<String, TranscribeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.to_string())
    }
}

struct FakeInsert {
    inserted: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl TextInsert for FakeInsert {
    async fn insert(&self, text: &str) -> Result<(), InsertError> {
        self.inserted.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

struct FakeNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, _title: &str, body: &str) {
        self.messages.lock().unwrap().push(body.to_string());
    }
}

struct Harness {
    tx: mpsc::Sender<HotkeyEvent>,
    messages: Arc<Mutex<Vec<String>>>,
    inserted: Arc<Mutex<Vec<String>>>,
    transcribe_calls: Arc<AtomicUsize>,
    wav_path: PathBuf,
    _tempdir: tempfile::TempDir,
}

fn spawn_daemon(blocks: Vec<Vec<f32>>, transcript: &'static str) -> Harness {
    let tempdir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.debug_dir = Some(tempdir.path().to_path_buf());

    let messages = Arc::new(Mutex::new(Vec::new()));
    let inserted = Arc::new(Mutex::new(Vec::new()));
    let transcribe_calls = Arc::new(AtomicUsize::new(0));

    let processor = Arc::new(AudioProcessor::new(tempdir.path().to_path_buf()));
    let wav_path = processor.artifact_path();

    let engine = SharedEngine::ready(Box::new(FakeSpeech {
        text: transcript,
        calls: transcribe_calls.clone(),
    }));

    let daemon = Daemon::new(
        config,
        Box::new(FakeCapture {
            blocks,
            started: false,
        }),
        processor,
        engine,
        Arc::new(FakeInsert {
            inserted: inserted.clone(),
        }),
        Arc::new(FakeNotifier {
            messages: messages.clone(),
        }),
    );

    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(daemon.run(rx));

    Harness {
        tx,
        messages,
        inserted,
        transcribe_calls,
        wav_path,
        _tempdir: tempdir,
    }
}

async fn wait_for_message(
    messages: &Arc<Mutex<Vec<String>>>,
    predicate: impl Fn(&str) -> bool,
) -> Option<String> {
    for _ in 0..200 {
        {
            let guard = messages.lock().unwrap();
            if let Some(found) = guard.iter().find(|m| predicate(m)) {
                return Some(found.clone());
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

async fn press_and_release(harness: &Harness) {
    harness.tx.send(HotkeyEvent::Pressed).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    harness.tx.send(HotkeyEvent::Released).await.unwrap();
}

#[tokio::test]
async fn full_cycle_inserts_transcript() {
    let blocks = vec![vec![0.1f32; 1024]; 3];
    let harness = spawn_daemon(blocks, "hello world");

    press_and_release(&harness).await;

    let message = wait_for_message(&harness.messages, |m| m.starts_with("Inserted:"))
        .await
        .expect("expected insertion notification");
    assert_eq!(message, "Inserted: hello world");

    // The artifact holds all three blocks worth of samples, in order
    let reader = hound::WavReader::open(&harness.wav_path).unwrap();
    assert_eq!(reader.duration(), 3072);

    assert_eq!(
        harness.inserted.lock().unwrap().as_slice(),
        ["hello world".to_string()]
    );
    assert_eq!(harness.transcribe_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_recording_skips_pipeline() {
    let harness = spawn_daemon(vec![], "never transcribed");

    press_and_release(&harness).await;

    wait_for_message(&harness.messages, |m| m == "No audio recorded")
        .await
        .expect("expected no-audio notification");

    // No artifact, no transcription, no insertion
    assert!(!harness.wav_path.exists());
    assert_eq!(harness.transcribe_calls.load(Ordering::SeqCst), 0);
    assert!(harness.inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_transcript_is_not_inserted() {
    let harness = spawn_daemon(vec![vec![0.2f32; 1024]], "");

    press_and_release(&harness).await;

    wait_for_message(&harness.messages, |m| m.starts_with("No speech detected"))
        .await
        .expect("expected no-speech notification");

    assert!(harness.inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn release_without_press_is_ignored() {
    let harness = spawn_daemon(vec![vec![0.1f32; 1024]], "unused");

    harness.tx.send(HotkeyEvent::Released).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(harness.messages.lock().unwrap().is_empty());
    assert_eq!(harness.transcribe_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn overlapping_press_is_a_no_op() {
    let harness = spawn_daemon(vec![vec![0.1f32; 1024]; 2], "once");

    harness.tx.send(HotkeyEvent::Pressed).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    // Second press while recording must not start another session
    harness.tx.send(HotkeyEvent::Pressed).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    harness.tx.send(HotkeyEvent::Released).await.unwrap();

    wait_for_message(&harness.messages, |m| m.starts_with("Inserted:"))
        .await
        .expect("expected a single completed cycle");

    assert_eq!(harness.inserted.lock().unwrap().len(), 1);
    assert_eq!(harness.transcribe_calls.load(Ordering::SeqCst), 1);
}
