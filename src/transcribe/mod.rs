//! Speech-to-text transcription
//!
//! One engine over two whisper.cpp tiers:
//! - faster variant: quantized model, beam search, silence suppression
//! - standard: plain model, greedy sampling
//!
//! Load-time fallback: when the faster tier's model file is not installed,
//! the engine silently drops to the standard tier. Transcription-time
//! fallback: when the faster tier errors mid-call, the engine reloads the
//! standard model and retries once.

pub mod whisper;

use crate::config::WhisperConfig;
use crate::error::TranscribeError;
use std::path::Path;

/// Sample rate expected by whisper models
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Trait for speech-to-text implementations
///
/// `Ok("")` means the audio contained no recognizable speech; `Err` means
/// transcription itself failed. Callers must keep the two distinct.
pub trait SpeechToText: Send {
    fn transcribe(&mut self, wav_path: &Path) -> Result<String, TranscribeError>;
}

/// Which tier of the whisper backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Faster,
    Standard,
}

/// A loaded speech model
pub(crate) trait ModelBackend: Send {
    fn transcribe_faster(&self, samples: &[f32]) -> Result<String, TranscribeError>;
    fn transcribe_standard(&self, samples: &[f32]) -> Result<String, TranscribeError>;
}

/// Loader strategy producing model backends; swapped out in tests
pub(crate) type BackendLoader = Box<
    dyn Fn(&WhisperConfig, Variant) -> Result<Box<dyn ModelBackend>, TranscribeError> + Send,
>;

/// Speech-recognition engine with tiered backend fallback
pub struct TranscriptionEngine {
    config: WhisperConfig,
    use_faster_variant: bool,
    model: Option<Box<dyn ModelBackend>>,
    loader: BackendLoader,
}

impl TranscriptionEngine {
    pub fn new(config: &WhisperConfig) -> Self {
        Self::with_loader(config, Box::new(whisper::load_backend))
    }

    fn with_loader(config: &WhisperConfig, loader: BackendLoader) -> Self {
        Self {
            use_faster_variant: config.faster,
            config: config.clone(),
            model: None,
            loader,
        }
    }

    /// Load the speech model. On failure the engine holds no model at all,
    /// never a partially constructed one.
    pub fn load(&mut self) -> Result<(), TranscribeError> {
        if self.use_faster_variant {
            match (self.loader)(&self.config, Variant::Faster) {
                Ok(backend) => {
                    tracing::info!("Loaded faster whisper backend: {}", self.config.model);
                    self.model = Some(backend);
                    return Ok(());
                }
                Err(TranscribeError::Unavailable(reason)) => {
                    tracing::warn!(
                        "Faster backend unavailable ({}), falling back to standard whisper",
                        reason
                    );
                    self.use_faster_variant = false;
                }
                Err(e) => {
                    tracing::error!("Failed to load model: {}", e);
                    return Err(e);
                }
            }
        }

        match (self.loader)(&self.config, Variant::Standard) {
            Ok(backend) => {
                tracing::info!("Loaded whisper model: {}", self.config.model);
                self.model = Some(backend);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load model: {}", e);
                Err(e)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn uses_faster_variant(&self) -> bool {
        self.use_faster_variant
    }
}

impl SpeechToText for TranscriptionEngine {
    fn transcribe(&mut self, wav_path: &Path) -> Result<String, TranscribeError> {
        if self.model.is_none() {
            tracing::error!("Model not loaded");
            return Err(TranscribeError::ModelNotLoaded);
        }

        let samples = crate::audio::wav::read_wav_mono(wav_path, WHISPER_SAMPLE_RATE)
            .map_err(|e| TranscribeError::AudioFormat(e.to_string()))?;

        tracing::info!("Starting transcription...");

        if self.use_faster_variant {
            let model = self.model.as_ref().ok_or(TranscribeError::ModelNotLoaded)?;
            match model.transcribe_faster(&samples) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::error!("Error with faster backend: {}", e);
                    self.use_faster_variant = false;
                    self.model = None;
                    let standard = (self.loader)(&self.config, Variant::Standard)?;
                    tracing::info!("Falling back to standard whisper");
                    self.model = Some(standard);
                }
            }
        }

        let model = self.model.as_ref().ok_or(TranscribeError::ModelNotLoaded)?;
        model.transcribe_standard(&samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::{FloatWavSink, WavSink};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubBackend {
        fail_faster: bool,
        text: &'static str,
    }

    impl ModelBackend for StubBackend {
        fn transcribe_faster(&self, _samples: &[f32]) -> Result<String, TranscribeError> {
            if self.fail_faster {
                Err(TranscribeError::InferenceFailed("boom".to_string()))
            } else {
                Ok(self.text.to_string())
            }
        }

        fn transcribe_standard(&self, _samples: &[f32]) -> Result<String, TranscribeError> {
            Ok(self.text.to_string())
        }
    }

    fn stub(fail_faster: bool, text: &'static str) -> Box<dyn ModelBackend> {
        Box::new(StubBackend { fail_faster, text })
    }

    fn write_test_wav(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("test.wav");
        FloatWavSink.write(&[0.1; 1024], 16000, &path).unwrap();
        path
    }

    fn config(faster: bool) -> WhisperConfig {
        WhisperConfig {
            faster,
            ..WhisperConfig::default()
        }
    }

    #[test]
    fn test_transcribe_without_model_errors_fast() {
        let loader: BackendLoader =
            Box::new(|_, _| panic!("loader must not run during transcribe"));
        let mut engine = TranscriptionEngine::with_loader(&config(false), loader);

        // The path does not exist; the no-model check must come first
        let result = engine.transcribe(Path::new("/nonexistent.wav"));
        assert!(matches!(result, Err(TranscribeError::ModelNotLoaded)));
    }

    #[test]
    fn test_load_faster_unavailable_falls_through() {
        let loader: BackendLoader = Box::new(|_, variant| match variant {
            Variant::Faster => Err(TranscribeError::Unavailable("not installed".to_string())),
            Variant::Standard => Ok(stub(false, "ok")),
        });
        let mut engine = TranscriptionEngine::with_loader(&config(true), loader);

        engine.load().unwrap();
        assert!(engine.is_loaded());
        assert!(!engine.uses_faster_variant());
    }

    #[test]
    fn test_load_error_leaves_model_unset() {
        let loader: BackendLoader =
            Box::new(|_, _| Err(TranscribeError::InitFailed("corrupt".to_string())));
        let mut engine = TranscriptionEngine::with_loader(&config(true), loader);

        assert!(engine.load().is_err());
        assert!(!engine.is_loaded());
    }

    #[test]
    fn test_faster_error_falls_back_to_standard() {
        let dir = tempfile::tempdir().unwrap();
        let wav = write_test_wav(&dir);

        let standard_loads = Arc::new(AtomicUsize::new(0));
        let counter = standard_loads.clone();
        let loader: BackendLoader = Box::new(move |_, variant| match variant {
            Variant::Faster => Ok(stub(true, "unused")),
            Variant::Standard => {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(stub(false, "hello world"))
            }
        });

        let mut engine = TranscriptionEngine::with_loader(&config(true), loader);
        engine.load().unwrap();
        assert!(engine.uses_faster_variant());

        let text = engine.transcribe(&wav).unwrap();
        assert_eq!(text, "hello world");
        assert!(!engine.uses_faster_variant());
        assert_eq!(standard_loads.load(Ordering::SeqCst), 1);

        // Subsequent calls stay on the standard tier without reloading
        let text = engine.transcribe(&wav).unwrap();
        assert_eq!(text, "hello world");
        assert_eq!(standard_loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_faster_success_keeps_variant() {
        let dir = tempfile::tempdir().unwrap();
        let wav = write_test_wav(&dir);

        let loader: BackendLoader = Box::new(|_, _| Ok(stub(false, "fast result")));
        let mut engine = TranscriptionEngine::with_loader(&config(true), loader);
        engine.load().unwrap();

        assert_eq!(engine.transcribe(&wav).unwrap(), "fast result");
        assert!(engine.uses_faster_variant());
    }

    #[test]
    fn test_empty_transcript_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let wav = write_test_wav(&dir);

        let loader: BackendLoader = Box::new(|_, _| Ok(stub(false, "")));
        let mut engine = TranscriptionEngine::with_loader(&config(false), loader);
        engine.load().unwrap();

        // Empty but successful is distinct from an error
        assert_eq!(engine.transcribe(&wav).unwrap(), "");
    }
}
