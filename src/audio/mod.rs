//! Audio capture and WAV processing
//!
//! Capture uses cpal, which works with PipeWire, PulseAudio, and ALSA
//! backends. WAV encoding goes through a priority-ordered chain of sinks
//! (see `wav`).

pub mod recorder;
pub mod wav;

use crate::error::AudioError;

/// Trait for audio capture implementations
///
/// Implemented by the cpal recorder; the daemon only depends on this trait
/// so the pipeline can be driven with fakes in tests.
pub trait Capture: Send {
    /// Begin a recording session. Fails if one is already active or the
    /// input stream cannot be opened; on failure no session state remains.
    fn start(&mut self) -> Result<(), AudioError>;

    /// End the session and return the captured samples as one contiguous
    /// buffer. Returns `AudioError::NoData` when not recording or when
    /// nothing was captured.
    fn stop(&mut self) -> Result<Vec<f32>, AudioError>;
}

/// Mix an interleaved block down to mono by averaging channels
pub(crate) fn downmix_to_mono(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear interpolation resampling
pub(crate) fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_idx = i as f64 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = (src_idx - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else {
            samples.get(idx).copied().unwrap_or(0.0)
        };

        output.push(sample);
    }

    output
}
