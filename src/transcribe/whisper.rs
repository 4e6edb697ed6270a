//! whisper.cpp backends via the whisper-rs crate
//!
//! Both tiers share one context wrapper; they differ in model file and
//! decoding parameters. The faster tier reads the quantized ggml file and
//! decodes with beam search after silence suppression; the standard tier
//! reads the plain ggml file and decodes greedily.

use super::{ModelBackend, Variant, WHISPER_SAMPLE_RATE};
use crate::config::{Config, WhisperConfig};
use crate::error::TranscribeError;
use crate::vad;
use std::path::PathBuf;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Minimum silence preserved by the faster tier's VAD filter
const VAD_MIN_SILENCE_MS: u32 = 500;

/// Fixed thread count for the quantized faster tier
const FASTER_THREADS: i32 = 2;

/// Construct a backend for the requested tier
pub(crate) fn load_backend(
    config: &WhisperConfig,
    variant: Variant,
) -> Result<Box<dyn ModelBackend>, TranscribeError> {
    let model_path = resolve_model_path(&config.model, variant)?;

    tracing::info!("Loading whisper model from {:?}", model_path);
    let start = std::time::Instant::now();

    let ctx = WhisperContext::new_with_params(
        model_path
            .to_str()
            .ok_or_else(|| TranscribeError::ModelNotFound("Invalid path".to_string()))?,
        WhisperContextParameters::default(),
    )
    .map_err(|e| TranscribeError::InitFailed(e.to_string()))?;

    tracing::info!("Model loaded in {:.2}s", start.elapsed().as_secs_f32());

    let threads = config.threads.unwrap_or_else(|| num_cpus::get().min(4));

    Ok(Box::new(WhisperBackend {
        ctx,
        language: config.language.clone(),
        threads,
    }))
}

/// Resolve a model name to a ggml file path.
///
/// The faster tier wants the quantized file; a missing quantized file means
/// the tier is unavailable, not that loading failed.
fn resolve_model_path(model: &str, variant: Variant) -> Result<PathBuf, TranscribeError> {
    let models_dir = Config::models_dir();

    match variant {
        Variant::Faster => {
            let path = models_dir.join(format!("ggml-{}-q8_0.bin", model));
            if path.exists() {
                Ok(path)
            } else {
                Err(TranscribeError::Unavailable(format!(
                    "quantized model {} not installed",
                    path.display()
                )))
            }
        }
        Variant::Standard => {
            // Absolute .bin paths are accepted as-is
            let path = if model.ends_with(".bin") {
                PathBuf::from(model)
            } else {
                models_dir.join(format!("ggml-{}.bin", model))
            };
            if path.exists() {
                Ok(path)
            } else {
                Err(TranscribeError::ModelNotFound(path.display().to_string()))
            }
        }
    }
}

/// A loaded whisper.cpp model
pub(crate) struct WhisperBackend {
    ctx: WhisperContext,
    language: String,
    threads: usize,
}

impl WhisperBackend {
    fn run(&self, params: FullParams, samples: &[f32]) -> Result<String, TranscribeError> {
        let start = std::time::Instant::now();

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| TranscribeError::InferenceFailed(e.to_string()))?;

        state
            .full(params, samples)
            .map_err(|e| TranscribeError::InferenceFailed(e.to_string()))?;

        let mut text = String::new();
        for segment in state.as_iter() {
            text.push_str(
                segment
                    .to_str()
                    .map_err(|e| TranscribeError::InferenceFailed(e.to_string()))?,
            );
        }

        let result = text.trim().to_string();
        tracing::info!(
            "Transcription completed in {:.2}s",
            start.elapsed().as_secs_f32()
        );

        Ok(result)
    }
}

impl ModelBackend for WhisperBackend {
    fn transcribe_faster(&self, samples: &[f32]) -> Result<String, TranscribeError> {
        let filtered = vad::suppress_silence(samples, WHISPER_SAMPLE_RATE, VAD_MIN_SILENCE_MS);
        if filtered.is_empty() {
            return Ok(String::new());
        }

        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: 5,
            patience: -1.0,
        });
        params.set_language(Some(&self.language));
        params.set_n_threads(FASTER_THREADS);
        params.set_token_timestamps(true);
        quiet(&mut params);

        self.run(params, &filtered)
    }

    fn transcribe_standard(&self, samples: &[f32]) -> Result<String, TranscribeError> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(&self.language));
        params.set_translate(false);
        params.set_n_threads(self.threads as i32);
        quiet(&mut params);

        self.run(params, samples)
    }
}

/// Suppress console output and blank segments
fn quiet(params: &mut FullParams) {
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);
    params.set_suppress_blank(true);
}
