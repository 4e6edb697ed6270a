//! cpal-based hold-to-record audio capture
//!
//! A recording session runs on a dedicated thread because cpal::Stream is
//! not Send. The stream callback appends one block per invocation to the
//! session's frame sequence; `stop()` joins the thread and concatenates
//! the blocks into a single contiguous buffer.

use super::{downmix_to_mono, resample, Capture};
use crate::config::AudioConfig;
use crate::error::AudioError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Mean absolute amplitude below which a capture is considered silence
pub const SILENCE_THRESHOLD: f32 = 0.001;

/// Requested samples per stream callback block
const BLOCK_SIZE: u32 = 1024;

/// Ordered sequence of per-callback audio blocks for one recording session.
///
/// Blocks are never mutated after append; concatenation preserves both
/// block order and sample order within blocks.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: Vec<Vec<f32>>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn push(&mut self, block: Vec<f32>) {
        self.frames.push(block);
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Concatenate all blocks, in append order, into one contiguous buffer
    pub fn concatenate(&self) -> Vec<f32> {
        let total: usize = self.frames.iter().map(Vec::len).sum();
        let mut buffer = Vec::with_capacity(total);
        for frame in &self.frames {
            buffer.extend_from_slice(frame);
        }
        buffer
    }
}

/// Mean absolute amplitude of a sample buffer
pub fn mean_amplitude(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
}

/// cpal-based recorder implementing the hold-to-record session lifecycle
pub struct CpalRecorder {
    config: AudioConfig,
    recording: Arc<AtomicBool>,
    frames: Arc<Mutex<FrameBuffer>>,
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl CpalRecorder {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            recording: Arc::new(AtomicBool::new(false)),
            frames: Arc::new(Mutex::new(FrameBuffer::new())),
            stop_tx: None,
            thread_handle: None,
        }
    }

    /// Synchronous fixed-duration capture used only by `--test-mic`.
    ///
    /// Bypasses the session frame path entirely; returns true iff the mean
    /// absolute amplitude of the capture exceeds the silence threshold.
    pub fn test_microphone(&self, duration: Duration) -> bool {
        tracing::info!("Testing microphone for {:.0}s...", duration.as_secs_f32());

        let (device, stream_config, sample_format, source_channels) =
            match open_input(&self.config.device) {
                Ok(parts) => parts,
                Err(e) => {
                    tracing::error!("Error testing microphone: {}", e);
                    return false;
                }
            };

        let captured = Arc::new(Mutex::new(Vec::<f32>::new()));
        let sink = captured.clone();
        let on_block = move |mono: Vec<f32>| {
            if let Ok(mut guard) = sink.lock() {
                guard.extend_from_slice(&mono);
            }
        };

        let stream = match build_stream_for_format(
            sample_format,
            &device,
            &stream_config,
            source_channels,
            on_block,
        ) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Error testing microphone: {}", e);
                return false;
            }
        };

        {
            use cpal::traits::StreamTrait;
            if let Err(e) = stream.play() {
                tracing::error!("Error testing microphone: {}", e);
                return false;
            }
        }

        thread::sleep(duration);
        drop(stream);

        let samples = match captured.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => Vec::new(),
        };

        if samples.is_empty() {
            tracing::error!("No audio data captured.");
            return false;
        }

        let mean = mean_amplitude(&samples);
        let max = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        tracing::info!("Mean amplitude: {:.6}", mean);
        tracing::info!("Max amplitude: {:.6}", max);

        if mean < SILENCE_THRESHOLD {
            tracing::warn!("Audio levels very low. Microphone may not be working correctly.");
            false
        } else {
            tracing::info!("Microphone seems to be working.");
            true
        }
    }
}

impl Capture for CpalRecorder {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.recording.load(Ordering::SeqCst) {
            return Err(AudioError::AlreadyRecording);
        }

        if let Ok(mut guard) = self.frames.lock() {
            guard.clear();
        }
        self.recording.store(true, Ordering::SeqCst);

        let (device, stream_config, sample_format, source_channels) =
            match open_input(&self.config.device) {
                Ok(parts) => parts,
                Err(e) => {
                    self.recording.store(false, Ordering::SeqCst);
                    return Err(e);
                }
            };

        let source_rate = stream_config.sample_rate.0;
        let target_rate = self.config.sample_rate;

        let recording = self.recording.clone();
        let frames = self.frames.clone();
        let on_block = move |mono: Vec<f32>| {
            if !recording.load(Ordering::SeqCst) {
                return;
            }
            let block = if source_rate != target_rate {
                resample(&mono, source_rate, target_rate)
            } else {
                mono
            };
            // One bad block must not kill the session
            match frames.lock() {
                Ok(mut guard) => guard.push(block),
                Err(e) => tracing::error!("Error in audio callback: {}", e),
            }
        };

        // The stream lives on its own thread; a readiness handshake reports
        // build/play failures back before start() returns.
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), String>>();
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();

        let thread_handle = thread::spawn(move || {
            let stream = match build_stream_for_format(
                sample_format,
                &device,
                &stream_config,
                source_channels,
                on_block,
            ) {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };

            {
                use cpal::traits::StreamTrait;
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            }

            let _ = ready_tx.send(Ok(()));
            tracing::debug!("Audio capture thread started");

            // Hold the stream open until stop() signals
            let _ = stop_rx.recv();
            drop(stream);
            tracing::debug!("Audio capture thread stopped");
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.stop_tx = Some(stop_tx);
                self.thread_handle = Some(thread_handle);
                tracing::info!("Recording started successfully");
                Ok(())
            }
            Ok(Err(msg)) => {
                self.recording.store(false, Ordering::SeqCst);
                let _ = thread_handle.join();
                Err(AudioError::Stream(msg))
            }
            Err(_) => {
                self.recording.store(false, Ordering::SeqCst);
                let _ = thread_handle.join();
                Err(AudioError::Stream(
                    "capture thread exited before the stream started".to_string(),
                ))
            }
        }
    }

    fn stop(&mut self) -> Result<Vec<f32>, AudioError> {
        if !self.recording.load(Ordering::SeqCst) {
            return Err(AudioError::NoData);
        }

        self.recording.store(false, Ordering::SeqCst);

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }

        let buffer = match self.frames.lock() {
            Ok(mut guard) => {
                let buffer = guard.concatenate();
                tracing::info!("Number of audio frames captured: {}", guard.frame_count());
                guard.clear();
                buffer
            }
            Err(_) => return Err(AudioError::Stream("frame buffer poisoned".to_string())),
        };

        if buffer.is_empty() {
            tracing::warn!("No audio frames captured");
            return Err(AudioError::NoData);
        }

        let mean = mean_amplitude(&buffer);
        tracing::info!(
            "Recording stopped: {} samples, mean amplitude {:.6}",
            buffer.len(),
            mean
        );
        if mean < SILENCE_THRESHOLD {
            tracing::warn!("Audio appears to be mostly silence");
        }

        Ok(buffer)
    }
}

/// Resolve the input device and its stream configuration
fn open_input(
    device_name: &str,
) -> Result<(cpal::Device, cpal::StreamConfig, cpal::SampleFormat, usize), AudioError> {
    use cpal::traits::{DeviceTrait, HostTrait};

    let host = cpal::default_host();

    let device = if device_name == "default" {
        host.default_input_device()
            .ok_or_else(|| AudioError::DeviceNotFound("default".to_string()))?
    } else {
        find_input_device(&host, device_name)?
    };

    let name = device.name().unwrap_or_else(|_| "unknown".to_string());
    tracing::debug!("Using audio device: {}", name);

    let supported = device
        .default_input_config()
        .map_err(|e| AudioError::Stream(e.to_string()))?;

    let source_channels = supported.channels() as usize;
    let sample_format = supported.sample_format();

    let stream_config = cpal::StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(BLOCK_SIZE),
    };

    tracing::debug!(
        "Device config: {} Hz, {} channel(s), format: {:?}",
        stream_config.sample_rate.0,
        source_channels,
        sample_format
    );

    Ok((device, stream_config, sample_format, source_channels))
}

/// Find an input device by exact or case-insensitive substring match
fn find_input_device(host: &cpal::Host, device_name: &str) -> Result<cpal::Device, AudioError> {
    use cpal::traits::{DeviceTrait, HostTrait};

    let devices = host
        .input_devices()
        .map_err(|e| AudioError::Stream(e.to_string()))?;

    let search = device_name.to_lowercase();
    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_name || name.to_lowercase().contains(&search) {
                return Ok(device);
            }
        }
    }

    Err(AudioError::DeviceNotFound(device_name.to_string()))
}

/// Build an input stream, dispatching on the device's sample format
fn build_stream_for_format(
    sample_format: cpal::SampleFormat,
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    source_channels: usize,
    on_block: impl Fn(Vec<f32>) + Send + 'static,
) -> Result<cpal::Stream, AudioError> {
    match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(device, config, source_channels, on_block),
        cpal::SampleFormat::I16 => build_stream::<i16>(device, config, source_channels, on_block),
        cpal::SampleFormat::U16 => build_stream::<u16>(device, config, source_channels, on_block),
        format => Err(AudioError::Stream(format!(
            "Unsupported sample format: {:?}",
            format
        ))),
    }
}

/// Build an input stream for a specific sample type
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    source_channels: usize,
    on_block: impl Fn(Vec<f32>) + Send + 'static,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::Sample + cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    use cpal::traits::DeviceTrait;

    let err_fn = |err| tracing::error!("Audio stream error: {}", err);

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                // Defensive copy of the incoming block, mixed down to mono
                let block: Vec<f32> = data
                    .iter()
                    .map(|&s| <f32 as cpal::FromSample<T>>::from_sample_(s))
                    .collect();
                on_block(downmix_to_mono(&block, source_channels));
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::Stream(e.to_string()))?;

    Ok(stream)
}
