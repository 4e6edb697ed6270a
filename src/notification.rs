//! Desktop notifications via notify-send
//!
//! Notifications are best-effort: failures are logged at debug level and
//! never propagate. Every notification is mirrored to the log so failures
//! always leave a trace even without a notification daemon.

use std::process::Stdio;
use tokio::process::Command;

/// Trait for user-facing notifications
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str);
}

/// notify-send based notifier
pub struct NotifySend;

#[async_trait::async_trait]
impl Notifier for NotifySend {
    async fn notify(&self, title: &str, body: &str) {
        tracing::info!("{}: {}", title, body);

        let result = Command::new("notify-send")
            .args(["--app-name=holdtype", "--expire-time=3000", title, body])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        if let Err(e) = result {
            tracing::debug!("Failed to send notification: {}", e);
        }
    }
}

/// Send a notification synchronously (blocking).
///
/// Used in non-async contexts like early startup.
pub fn send_sync(title: &str, body: &str) {
    tracing::info!("{}: {}", title, body);

    let _ = std::process::Command::new("notify-send")
        .args(["--app-name=holdtype", "--expire-time=5000", title, body])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
}
