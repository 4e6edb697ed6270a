//! evdev-based trigger key listener
//!
//! Watches all keyboard devices under /dev/input and delivers press/release
//! events for exactly the configured trigger key. Key-repeat events and all
//! other keys are filtered out before they reach the daemon.

use super::HotkeyEvent;
use crate::error::HotkeyError;
use evdev::{Device, InputEventKind, Key};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

/// evdev-based trigger key listener
pub struct EvdevListener {
    /// The key to listen for
    target_key: Key,
    /// Paths to keyboard devices
    device_paths: Vec<PathBuf>,
    /// Signal to stop the listener task
    stop_signal: Option<oneshot::Sender<()>>,
}

impl EvdevListener {
    /// Create a new listener for the given trigger key
    pub fn new(target_key: Key) -> Result<Self, HotkeyError> {
        let device_paths = find_keyboard_devices()?;

        if device_paths.is_empty() {
            return Err(HotkeyError::NoKeyboard);
        }

        tracing::debug!(
            "Found {} keyboard device(s): {:?}",
            device_paths.len(),
            device_paths
        );

        Ok(Self {
            target_key,
            device_paths,
            stop_signal: None,
        })
    }

    /// Start listening; events arrive on the returned channel
    pub fn start(&mut self) -> mpsc::Receiver<HotkeyEvent> {
        let (tx, rx) = mpsc::channel(32);
        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_signal = Some(stop_tx);

        let target_key = self.target_key;
        let device_paths = self.device_paths.clone();

        tokio::task::spawn_blocking(move || {
            listener_loop(device_paths, target_key, tx, stop_rx);
        });

        rx
    }

    /// Stop listening and clean up
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop_signal.take() {
            let _ = stop.send(());
        }
    }
}

/// Main listener loop running in a blocking task
fn listener_loop(
    device_paths: Vec<PathBuf>,
    target_key: Key,
    tx: mpsc::Sender<HotkeyEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    // Open all keyboard devices in non-blocking mode
    let mut devices: Vec<Device> = device_paths
        .iter()
        .filter_map(|path| match Device::open(path) {
            Ok(device) => {
                let fd = device.as_raw_fd();
                unsafe {
                    let flags = libc::fcntl(fd, libc::F_GETFL);
                    if flags != -1 {
                        libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
                    }
                }
                tracing::debug!("Opened device (non-blocking): {:?}", path);
                Some(device)
            }
            Err(e) => {
                tracing::warn!("Failed to open {:?}: {}", path, e);
                None
            }
        })
        .collect();

    if devices.is_empty() {
        tracing::error!("No keyboard devices could be opened");
        return;
    }

    // Track held state to filter key-repeat events
    let mut is_pressed = false;

    tracing::info!("Listening for {:?}", target_key);

    loop {
        // Check for stop signal (non-blocking)
        match stop_rx.try_recv() {
            Ok(_) | Err(oneshot::error::TryRecvError::Closed) => {
                tracing::debug!("Hotkey listener stopping");
                return;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
        }

        for device in &mut devices {
            // fetch_events returns immediately if no events (non-blocking)
            if let Ok(events) = device.fetch_events() {
                for event in events {
                    let InputEventKind::Key(key) = event.kind() else {
                        continue;
                    };
                    // Any key other than the trigger is ignored
                    if key != target_key {
                        continue;
                    }

                    match event.value() {
                        1 if !is_pressed => {
                            is_pressed = true;
                            tracing::debug!("Trigger key pressed");
                            if tx.blocking_send(HotkeyEvent::Pressed).is_err() {
                                return; // Channel closed
                            }
                        }
                        0 if is_pressed => {
                            is_pressed = false;
                            tracing::debug!("Trigger key released");
                            if tx.blocking_send(HotkeyEvent::Released).is_err() {
                                return; // Channel closed
                            }
                        }
                        // Key repeat (2) and duplicate edges - ignore
                        _ => {}
                    }
                }
            }
        }

        // Small sleep to avoid busy-waiting
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
}

/// Find all keyboard input devices
fn find_keyboard_devices() -> Result<Vec<PathBuf>, HotkeyError> {
    let mut keyboards = Vec::new();

    let input_dir = std::fs::read_dir("/dev/input")
        .map_err(|e| HotkeyError::DeviceAccess(format!("/dev/input: {}", e)))?;

    for entry in input_dir {
        let entry = entry.map_err(|e| HotkeyError::DeviceAccess(e.to_string()))?;
        let path = entry.path();

        let is_event_device = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false);

        if !is_event_device {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => {
                // A keyboard should have at least some letter keys
                let has_keys = device
                    .supported_keys()
                    .map(|keys| {
                        keys.contains(Key::KEY_A)
                            && keys.contains(Key::KEY_Z)
                            && keys.contains(Key::KEY_ENTER)
                    })
                    .unwrap_or(false);

                if has_keys {
                    tracing::debug!(
                        "Found keyboard: {:?} ({:?})",
                        path,
                        device.name().unwrap_or("unknown")
                    );
                    keyboards.push(path);
                }
            }
            Err(e) => {
                // Permission denied is common for non-input-group users
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    return Err(HotkeyError::DeviceAccess(path.display().to_string()));
                }
                tracing::trace!("Skipping {:?}: {}", path, e);
            }
        }
    }

    Ok(keyboards)
}
