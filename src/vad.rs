//! Energy-based silence suppression
//!
//! A simple RMS-energy voice-activity filter applied before the faster
//! transcription backend. Audio is analyzed in 20ms frames; silence runs
//! longer than the configured minimum are trimmed down to it, so natural
//! pauses survive while long dead air is dropped.

/// Analysis frame length in milliseconds
const FRAME_MS: u32 = 20;

/// RMS energy below which a frame counts as silence
const ENERGY_THRESHOLD: f32 = 0.01;

/// RMS energy of a sample slice
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Drop silence beyond `min_silence_ms` per silent run.
///
/// Frames up to the minimum are kept at the start of every silent run, so
/// segment boundaries stay intact for the decoder.
pub fn suppress_silence(samples: &[f32], sample_rate: u32, min_silence_ms: u32) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let frame_len = (sample_rate * FRAME_MS / 1000).max(1) as usize;
    let max_kept_silence_frames = (min_silence_ms / FRAME_MS).max(1) as usize;

    let mut output = Vec::with_capacity(samples.len());
    let mut silence_run = 0usize;

    for frame in samples.chunks(frame_len) {
        if rms(frame) >= ENERGY_THRESHOLD {
            silence_run = 0;
            output.extend_from_slice(frame);
        } else {
            silence_run += 1;
            if silence_run <= max_kept_silence_frames {
                output.extend_from_slice(frame);
            }
        }
    }

    tracing::debug!(
        "Silence suppression: {} -> {} samples",
        samples.len(),
        output.len()
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16000;

    fn tone(ms: u32) -> Vec<f32> {
        let len = (RATE * ms / 1000) as usize;
        (0..len)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / RATE as f32).sin() * 0.5)
            .collect()
    }

    fn silence(ms: u32) -> Vec<f32> {
        vec![0.0; (RATE * ms / 1000) as usize]
    }

    #[test]
    fn test_speech_passes_through() {
        let speech = tone(400);
        let filtered = suppress_silence(&speech, RATE, 500);
        assert_eq!(filtered.len(), speech.len());
    }

    #[test]
    fn test_short_gap_is_kept() {
        let mut samples = tone(200);
        samples.extend(silence(300));
        samples.extend(tone(200));

        let filtered = suppress_silence(&samples, RATE, 500);
        assert_eq!(filtered.len(), samples.len());
    }

    #[test]
    fn test_long_gap_is_trimmed_to_minimum() {
        let mut samples = tone(200);
        samples.extend(silence(2000));
        samples.extend(tone(200));

        let filtered = suppress_silence(&samples, RATE, 500);
        let expected = tone(200).len() * 2 + silence(500).len();
        assert_eq!(filtered.len(), expected);
    }

    #[test]
    fn test_pure_silence_is_capped() {
        let samples = silence(3000);
        let filtered = suppress_silence(&samples, RATE, 500);
        assert_eq!(filtered.len(), silence(500).len());
    }

    #[test]
    fn test_empty_input() {
        assert!(suppress_silence(&[], RATE, 500).is_empty());
    }
}
