//! holdtype - hold-to-record speech-to-text
//!
//! Hold the trigger key while speaking; release it to transcribe and have
//! the text pasted at the cursor position.

use clap::Parser;
use holdtype::audio::recorder::CpalRecorder;
use holdtype::audio::wav::AudioProcessor;
use holdtype::config;
use holdtype::daemon::{Daemon, SharedEngine};
use holdtype::hotkey::{self, evdev_listener::EvdevListener};
use holdtype::insert::{self, ClipboardPaste};
use holdtype::notification::{self, NotifySend};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "holdtype")]
#[command(version, about = "Hold-to-record speech-to-text for Linux desktops")]
#[command(long_about = "
Holdtype is a hold-to-record dictation tool. Press and hold the trigger
key to record, release it to transcribe; the text is pasted at the cursor
position via the clipboard.

SETUP:
  1. Install the required tools: sudo apt install xclip xdotool
  2. Add yourself to the input group: sudo usermod -aG input $USER
  3. Log out and back in
  4. Place ggml whisper models under the data directory's models/ folder
  5. Run: holdtype
")]
struct Cli {
    /// Model size to use (tiny, base, small, medium, large)
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,

    /// Sample rate for recording
    #[arg(long = "sample_rate", value_name = "HZ")]
    sample_rate: Option<u32>,

    /// Key to hold for recording (single character or evdev key name)
    #[arg(long, value_name = "KEY")]
    key: Option<String>,

    /// Test the microphone before starting
    #[arg(long = "test-mic")]
    test_mic: bool,

    /// Use the quantized faster backend when its model file is installed
    #[arg(long)]
    faster: bool,

    /// Enable additional debug output
    #[arg(long)]
    debug: bool,

    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("holdtype={},warn", log_level))),
        )
        .with_target(false)
        .init();

    // Load configuration and apply CLI overrides
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.whisper.model = model;
    }
    if let Some(rate) = cli.sample_rate {
        config.audio.sample_rate = rate;
    }
    if let Some(key) = cli.key {
        config.hotkey.key = key;
    }
    if cli.faster {
        config.whisper.faster = true;
    }

    // Missing clipboard/paste tools are a fatal setup failure
    if !insert::required_tools_available() {
        anyhow::bail!("Required tools not installed. Install with: sudo apt install xclip xdotool");
    }

    let recorder = CpalRecorder::new(config.audio.clone());

    if cli.test_mic {
        if !recorder.test_microphone(Duration::from_secs(3)) {
            tracing::warn!("Microphone test failed. Continuing anyway...");
        }
        tracing::info!("Continuing with normal operation...");
    }

    // Load the model in the background so the hotkey listener is
    // responsive immediately
    let engine = SharedEngine::spawn_load(config.whisper.clone());

    let trigger = hotkey::resolve_trigger_key(&config.hotkey.key);
    let mut listener = EvdevListener::new(trigger)?;
    let events = listener.start();

    let key_display = if config.hotkey.key.chars().count() == 1 {
        config.hotkey.key.clone()
    } else {
        config.hotkey.key.to_uppercase()
    };
    notification::send_sync(
        "holdtype",
        &format!(
            "Press and hold '{}' key to record, release to transcribe",
            key_display
        ),
    );

    let processor = Arc::new(AudioProcessor::new(config.storage.resolve_debug_dir()));
    let daemon = Daemon::new(
        config,
        Box::new(recorder),
        processor,
        engine,
        Arc::new(ClipboardPaste),
        Arc::new(NotifySend),
    );

    daemon.run(events).await?;
    listener.stop();

    Ok(())
}
