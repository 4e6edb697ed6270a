//! Configuration loading and types for holdtype
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/holdtype/config.toml)
//! 3. CLI arguments (highest priority)

use crate::error::HoldtypeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub hotkey: HotkeyConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub whisper: WhisperConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Hotkey detection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HotkeyConfig {
    /// Key to hold for recording. A single character ("z") maps to that
    /// letter/digit key; longer names map to evdev KEY_* constants
    /// ("SCROLLLOCK", "F13").
    #[serde(default = "default_hotkey_key")]
    pub key: String,
}

/// Audio capture configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// Audio input device ("default" uses system default)
    #[serde(default = "default_device")]
    pub device: String,

    /// Sample rate in Hz (whisper expects 16000)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

/// Whisper speech-to-text configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WhisperConfig {
    /// Model name: tiny, base, small, medium, large
    #[serde(default = "default_model")]
    pub model: String,

    /// Use the quantized faster backend when its model file is installed
    #[serde(default)]
    pub faster: bool,

    /// Language code for transcription
    #[serde(default = "default_language")]
    pub language: String,

    /// Number of threads for standard inference (None = auto-detect)
    #[serde(default)]
    pub threads: Option<usize>,
}

/// Filesystem locations for debug artifacts
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory for the last_recording.wav debug artifact.
    /// Defaults to the per-user data directory.
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,
}

fn default_hotkey_key() -> String {
    "z".to_string()
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_model() -> String {
    "small".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            key: default_hotkey_key(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            faster: false,
            language: default_language(),
            threads: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hotkey: HotkeyConfig::default(),
            audio: AudioConfig::default(),
            whisper: WhisperConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "holdtype")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path (models, debug artifacts)
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "holdtype")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the models directory path
    pub fn models_dir() -> PathBuf {
        Self::data_dir().join("models")
    }
}

impl StorageConfig {
    /// Resolve the debug artifact directory, falling back to the data dir
    pub fn resolve_debug_dir(&self) -> PathBuf {
        self.debug_dir.clone().unwrap_or_else(Config::data_dir)
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, HoldtypeError> {
    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| HoldtypeError::Config(format!("Failed to read config: {}", e)))?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| HoldtypeError::Config(format!("Failed to parse config: {}", e)))?;
            return Ok(config);
        }
    }

    tracing::debug!("No config file found, using defaults");
    Ok(Config::default())
}
