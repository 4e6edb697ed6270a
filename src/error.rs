//! Error types for holdtype
//!
//! Uses thiserror for ergonomic error definitions. Every component boundary
//! converts its internal failures into one of these enums; nothing panics
//! across a boundary.

use thiserror::Error;

/// Top-level error type for the holdtype application
#[derive(Error, Debug)]
pub enum HoldtypeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hotkey error: {0}")]
    Hotkey(#[from] HotkeyError),

    #[error("Audio capture error: {0}")]
    Audio(#[from] AudioError),

    #[error("WAV processing error: {0}")]
    Wav(#[from] WavError),

    #[error("Transcription error: {0}")]
    Transcribe(#[from] TranscribeError),

    #[error("Text insertion error: {0}")]
    Insert(#[from] InsertError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to hotkey detection
#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("Cannot open input device '{0}'. Is the user in the 'input' group?\n  Run: sudo usermod -aG input $USER\n  Then log out and back in.")]
    DeviceAccess(String),

    #[error("No keyboard device found in /dev/input/")]
    NoKeyboard,
}

/// Errors related to audio capture
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No audio was captured. Check your microphone.")]
    NoData,

    #[error("Audio device not found: '{0}'. List devices with: pactl list sources short")]
    DeviceNotFound(String),

    #[error("Audio stream error: {0}")]
    Stream(String),
}

/// Errors from WAV encoding, validation, and decoding
#[derive(Error, Debug)]
pub enum WavError {
    #[error("Failed to encode WAV: {0}")]
    Encode(String),

    #[error("External transcoder failed: {0}")]
    Transcode(String),

    #[error("Failed to decode WAV: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to speech-to-text transcription
#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("No model loaded")]
    ModelNotLoaded,

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Model not found: {0}\n  Place ggml model files in the models directory.")]
    ModelNotFound(String),

    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Transcription failed: {0}")]
    InferenceFailed(String),

    #[error("Audio format error: {0}")]
    AudioFormat(String),
}

/// Errors related to clipboard-based text insertion
#[derive(Error, Debug)]
pub enum InsertError {
    #[error("xclip not found in PATH. Install with: sudo apt install xclip")]
    ClipboardToolMissing,

    #[error("xdotool not found in PATH. Install with: sudo apt install xdotool")]
    PasteToolMissing,

    #[error("Clipboard write failed: {0}")]
    Clipboard(String),

    #[error("Paste keystroke failed: {0}")]
    Paste(String),
}

/// Result type alias using HoldtypeError
pub type Result<T> = std::result::Result<T, HoldtypeError>;
