//! WAV encoding, validation, and playback
//!
//! Saving goes through a priority-ordered chain of encoder sinks tried
//! strictly in order:
//! 1. hound, 32-bit float samples written directly
//! 2. hound, samples normalized to 16-bit signed integers
//! 3. ffmpeg, fed raw f32 little-endian PCM through a temp file
//!
//! A tier is skipped only when it is unavailable; the first available tier
//! that runs decides the outcome. There is no fallback past a tier that ran
//! and failed.

use super::{downmix_to_mono, resample};
use crate::error::WavError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Name of the per-cycle debug artifact, overwritten on every recording
pub const WAV_FILENAME: &str = "last_recording.wav";

/// Trait for WAV encoder strategies in the fallback chain
pub trait WavSink: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &'static str;

    /// Whether this encoder can run at all (e.g. external tool installed)
    fn is_available(&self) -> bool;

    /// Encode samples to a WAV file at `path`
    fn write(&self, samples: &[f32], sample_rate: u32, path: &Path) -> Result<(), WavError>;
}

/// Preferred tier: write floating-point samples directly
pub struct FloatWavSink;

impl WavSink for FloatWavSink {
    fn name(&self) -> &'static str {
        "float writer (hound)"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn write(&self, samples: &[f32], sample_rate: u32, path: &Path) -> Result<(), WavError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut writer =
            hound::WavWriter::create(path, spec).map_err(|e| WavError::Encode(e.to_string()))?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| WavError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| WavError::Encode(e.to_string()))?;
        Ok(())
    }
}

/// Fallback tier: normalize to 16-bit signed integers
pub struct PcmWavSink;

impl WavSink for PcmWavSink {
    fn name(&self) -> &'static str {
        "int16 writer (hound)"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn write(&self, samples: &[f32], sample_rate: u32, path: &Path) -> Result<(), WavError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer =
            hound::WavWriter::create(path, spec).map_err(|e| WavError::Encode(e.to_string()))?;
        for &sample in samples {
            let scaled = (sample * 32767.0)
                .round()
                .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            writer
                .write_sample(scaled)
                .map_err(|e| WavError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| WavError::Encode(e.to_string()))?;
        Ok(())
    }
}

/// Last tier: external transcoder fed raw f32le PCM via a temp file
pub struct FfmpegWavSink;

impl WavSink for FfmpegWavSink {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn is_available(&self) -> bool {
        which::which("ffmpeg").is_ok()
    }

    fn write(&self, samples: &[f32], sample_rate: u32, path: &Path) -> Result<(), WavError> {
        let mut raw = tempfile::Builder::new()
            .prefix("holdtype_")
            .suffix(".raw")
            .tempfile()?;

        let mut bytes = Vec::with_capacity(samples.len() * 4);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        raw.write_all(&bytes)?;
        raw.flush()?;

        let output = Command::new("ffmpeg")
            .arg("-y")
            .args(["-f", "f32le"])
            .args(["-ar", &sample_rate.to_string()])
            .args(["-ac", "1"])
            .arg("-i")
            .arg(raw.path())
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| WavError::Transcode(e.to_string()))?;

        // The temp file is removed when `raw` drops
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WavError::Transcode(stderr.trim().to_string()));
        }

        Ok(())
    }
}

/// Converts recording sessions to validated WAV artifacts
pub struct AudioProcessor {
    debug_dir: PathBuf,
    sinks: Vec<Box<dyn WavSink>>,
}

impl AudioProcessor {
    /// Create a processor with the standard encoder chain
    pub fn new(debug_dir: PathBuf) -> Self {
        Self::with_sinks(
            debug_dir,
            vec![
                Box::new(FloatWavSink),
                Box::new(PcmWavSink),
                Box::new(FfmpegWavSink),
            ],
        )
    }

    /// Create a processor with an explicit encoder chain
    pub fn with_sinks(debug_dir: PathBuf, sinks: Vec<Box<dyn WavSink>>) -> Self {
        Self { debug_dir, sinks }
    }

    /// Path of the debug artifact this processor writes
    pub fn artifact_path(&self) -> PathBuf {
        self.debug_dir.join(WAV_FILENAME)
    }

    /// Save a sample buffer to the debug WAV artifact.
    ///
    /// Walks the encoder chain in priority order, skipping unavailable
    /// tiers. The first available tier decides the outcome; a tier that
    /// runs and fails ends the save with no further fallback.
    pub fn save_to_wav(&self, samples: &[f32], sample_rate: u32) -> Option<PathBuf> {
        if let Err(e) = std::fs::create_dir_all(&self.debug_dir) {
            tracing::error!("Failed to create {:?}: {}", self.debug_dir, e);
            return None;
        }

        let path = self.artifact_path();

        for sink in &self.sinks {
            if !sink.is_available() {
                tracing::debug!("{} unavailable, trying next encoder", sink.name());
                continue;
            }

            return match sink.write(samples, sample_rate, &path) {
                Ok(()) => {
                    tracing::info!("Saved WAV using {}: {:?}", sink.name(), path);
                    Some(path)
                }
                Err(e) => {
                    tracing::error!("{} failed to save WAV: {}", sink.name(), e);
                    None
                }
            };
        }

        tracing::error!("No WAV encoder available");
        spawn_install_attempt("ffmpeg");
        None
    }

    /// Structural validity check: parseable and at least one frame.
    /// Audio content is never inspected.
    pub fn validate_wav_file(&self, path: &Path) -> bool {
        match hound::WavReader::open(path) {
            Ok(reader) => {
                let frames = reader.duration();
                tracing::debug!("WAV file info: {:?}, {} frames", reader.spec(), frames);
                if frames == 0 {
                    tracing::warn!("WAV file has 0 frames");
                    false
                } else {
                    true
                }
            }
            Err(e) => {
                tracing::error!("Error validating WAV file: {}", e);
                false
            }
        }
    }

    /// Best-effort playback for diagnostics
    pub fn play_audio(&self, path: &Path) -> bool {
        tracing::info!("Playing back audio file: {:?}", path);
        match Command::new("aplay")
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::error!("Failed to play audio: {}", e);
                false
            }
        }
    }
}

/// Decode a WAV file to mono f32 at the target rate
pub fn read_wav_mono(path: &Path, target_rate: u32) -> Result<Vec<f32>, WavError> {
    let mut reader = hound::WavReader::open(path).map_err(|e| WavError::Decode(e.to_string()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| WavError::Decode(e.to_string()))?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| WavError::Decode(e.to_string()))?
        }
    };

    let mono = downmix_to_mono(&samples, spec.channels as usize);
    Ok(resample(&mono, spec.sample_rate, target_rate))
}

/// Fire-and-forget attempt to install a missing external tool for the next
/// run. Never awaited; the outcome is not reported.
fn spawn_install_attempt(package: &str) {
    let result = Command::new("sh")
        .arg("-c")
        .arg(format!(
            "command -v apt-get >/dev/null 2>&1 && apt-get install -y {}",
            package
        ))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    if let Err(e) = result {
        tracing::debug!("Install attempt for {} failed to spawn: {}", package, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct StubSink {
        available: bool,
        fail: bool,
        called: Arc<AtomicBool>,
    }

    impl WavSink for StubSink {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn write(&self, _samples: &[f32], _rate: u32, path: &Path) -> Result<(), WavError> {
            self.called.store(true, Ordering::SeqCst);
            if self.fail {
                Err(WavError::Encode("stub failure".to_string()))
            } else {
                std::fs::write(path, b"stub")?;
                Ok(())
            }
        }
    }

    fn stub(available: bool, fail: bool) -> (Box<dyn WavSink>, Arc<AtomicBool>) {
        let called = Arc::new(AtomicBool::new(false));
        let sink = StubSink {
            available,
            fail,
            called: called.clone(),
        };
        (Box::new(sink), called)
    }

    #[test]
    fn test_first_available_tier_wins() {
        let dir = tempfile::tempdir().unwrap();
        let (first, first_called) = stub(true, false);
        let (second, second_called) = stub(true, false);
        let processor = AudioProcessor::with_sinks(dir.path().to_path_buf(), vec![first, second]);

        assert!(processor.save_to_wav(&[0.1; 16], 16000).is_some());
        assert!(first_called.load(Ordering::SeqCst));
        assert!(!second_called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_unavailable_tier_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (first, first_called) = stub(false, false);
        let (second, second_called) = stub(true, false);
        let processor = AudioProcessor::with_sinks(dir.path().to_path_buf(), vec![first, second]);

        assert!(processor.save_to_wav(&[0.1; 16], 16000).is_some());
        assert!(!first_called.load(Ordering::SeqCst));
        assert!(second_called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_failed_tier_ends_save_without_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let (first, _) = stub(true, true);
        let (second, second_called) = stub(true, false);
        let processor = AudioProcessor::with_sinks(dir.path().to_path_buf(), vec![first, second]);

        assert!(processor.save_to_wav(&[0.1; 16], 16000).is_none());
        assert!(!second_called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_float_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let processor = AudioProcessor::new(dir.path().to_path_buf());
        let samples = vec![0.25f32; 3072];

        let path = processor.save_to_wav(&samples, 16000).unwrap();
        assert!(processor.validate_wav_file(&path));

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.duration(), 3072);
        assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
    }

    #[test]
    fn test_pcm_sink_normalization() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pcm.wav");
        PcmWavSink.write(&[0.5, -1.0, 2.0], 16000, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![16384, -32767, 32767]);
    }

    #[test]
    fn test_validate_rejects_zero_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.finalize().unwrap();

        let processor = AudioProcessor::new(dir.path().to_path_buf());
        assert!(!processor.validate_wav_file(&path));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"not a wav file").unwrap();

        let processor = AudioProcessor::new(dir.path().to_path_buf());
        assert!(!processor.validate_wav_file(&path));
        assert!(!processor.validate_wav_file(&dir.path().join("missing.wav")));
    }

    #[test]
    fn test_validate_accepts_low_amplitude_audio() {
        let dir = tempfile::tempdir().unwrap();
        let processor = AudioProcessor::new(dir.path().to_path_buf());
        // Amplitude is irrelevant to structural validity
        let path = processor.save_to_wav(&[0.00001; 64], 16000).unwrap();
        assert!(processor.validate_wav_file(&path));
    }

    #[test]
    fn test_read_wav_mono_int16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("int.wav");
        PcmWavSink.write(&[0.5; 128], 16000, &path).unwrap();

        let samples = read_wav_mono(&path, 16000).unwrap();
        assert_eq!(samples.len(), 128);
        assert!((samples[0] - 0.5).abs() < 0.01);
    }
}
