//! Holdtype: hold-to-record speech-to-text for Linux desktops
//!
//! This library provides the core functionality for:
//! - Detecting a held trigger key via evdev (kernel-level key events)
//! - Capturing microphone audio via cpal while the key is held
//! - Persisting the capture as a WAV artifact through a fallback encoder
//!   chain (hound float → hound int16 → ffmpeg)
//! - Transcribing speech with whisper.cpp, with a quantized faster tier
//!   falling back to the standard tier
//! - Inserting the transcript at the cursor via xclip + a simulated paste
//!
//! # Flow
//!
//! ```text
//! [key press] ─▶ Recorder.start ─▶ [key release] ─▶ Recorder.stop
//!                                                        │ samples
//!                                                        ▼
//!                    save_to_wav ─▶ validate_wav_file ─▶ transcribe
//!                                                        │ text
//!                                                        ▼
//!                                          clipboard copy + paste + notify
//! ```

pub mod audio;
pub mod config;
pub mod daemon;
pub mod error;
pub mod hotkey;
pub mod insert;
pub mod notification;
pub mod state;
pub mod transcribe;
pub mod vad;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{HoldtypeError, Result};
