//! Clipboard-based text insertion
//!
//! Copies the transcript to the clipboard with xclip, then simulates the
//! paste shortcut with xdotool so the text lands at the cursor position.

use crate::error::InsertError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Trait for text insertion implementations
#[async_trait::async_trait]
pub trait TextInsert: Send + Sync {
    /// Insert text at the current cursor position
    async fn insert(&self, text: &str) -> Result<(), InsertError>;
}

/// xclip + xdotool insertion for X11 desktops
pub struct ClipboardPaste;

impl ClipboardPaste {
    /// Copy text to the clipboard selection via xclip
    async fn copy_to_clipboard(&self, text: &str) -> Result<(), InsertError> {
        let mut child = Command::new("xclip")
            .args(["-selection", "clipboard"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    InsertError::ClipboardToolMissing
                } else {
                    InsertError::Clipboard(e.to_string())
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| InsertError::Clipboard(e.to_string()))?;
            // Close stdin to signal EOF
            drop(stdin);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| InsertError::Clipboard(e.to_string()))?;

        if !status.success() {
            return Err(InsertError::Clipboard(
                "xclip exited with error".to_string(),
            ));
        }

        Ok(())
    }

    /// Simulate the paste shortcut via xdotool
    async fn simulate_paste(&self) -> Result<(), InsertError> {
        let output = Command::new("xdotool")
            .args(["key", "ctrl+v"])
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    InsertError::PasteToolMissing
                } else {
                    InsertError::Paste(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InsertError::Paste(stderr.trim().to_string()));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl TextInsert for ClipboardPaste {
    async fn insert(&self, text: &str) -> Result<(), InsertError> {
        if text.is_empty() {
            return Ok(());
        }

        self.copy_to_clipboard(text).await?;

        // Give the clipboard manager a moment before pasting
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        self.simulate_paste().await?;

        tracing::info!("Text inserted via clipboard paste ({} chars)", text.len());
        Ok(())
    }
}

/// Check that the external tools insertion depends on are installed.
/// Called once at startup; a missing tool is a fatal setup failure.
pub fn required_tools_available() -> bool {
    let mut ok = true;
    for tool in ["xclip", "xdotool"] {
        if which::which(tool).is_err() {
            tracing::error!("Required tool '{}' not found in PATH", tool);
            ok = false;
        }
    }
    ok
}
