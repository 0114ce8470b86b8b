// src/notify/mod.rs
//! Push alerts for the top-ranked headline. Fire-and-forget: a failing
//! backend is logged and never blocks publishing.

pub mod discord;
pub mod email;
pub mod onesignal;
pub mod slack;

use anyhow::Result;
use metrics::counter;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AlertPayload {
    pub title: String,
    pub link: String,
}

impl AlertPayload {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, alert: &AlertPayload) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Fans one alert out to every configured backend.
#[derive(Clone, Default)]
pub struct NotifierMux {
    backends: Vec<Arc<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new(backends: Vec<Arc<dyn Notifier>>) -> Self {
        Self { backends }
    }

    /// Enable every backend whose environment variables are present.
    pub fn from_env() -> Self {
        let mut backends: Vec<Arc<dyn Notifier>> = Vec::new();
        if let Some(n) = onesignal::OneSignalNotifier::from_env() {
            backends.push(Arc::new(n));
        }
        if let Some(n) = slack::SlackNotifier::from_env() {
            backends.push(Arc::new(n));
        }
        if let Some(n) = discord::DiscordNotifier::from_env() {
            backends.push(Arc::new(n));
        }
        match email::EmailNotifier::from_env() {
            Ok(Some(n)) => backends.push(Arc::new(n)),
            Ok(None) => {}
            Err(e) => tracing::warn!(target: "notify", error = ?e, "email notifier disabled"),
        }
        let names: Vec<&str> = backends.iter().map(|b| b.name()).collect();
        tracing::info!(target: "notify", backends = ?names, "notifiers configured");
        Self { backends }
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Send to all backends; returns how many succeeded.
    pub async fn notify(&self, alert: &AlertPayload) -> usize {
        if self.backends.is_empty() {
            tracing::info!(target: "notify", title = %alert.title, "no notifier configured, alert logged only");
            return 0;
        }
        let mut ok = 0usize;
        for b in &self.backends {
            match b.send(alert).await {
                Ok(()) => {
                    ok += 1;
                    counter!("pulse_notifications_total", "backend" => b.name()).increment(1);
                    tracing::info!(target: "notify", backend = b.name(), "notification sent");
                }
                Err(e) => {
                    counter!("pulse_notification_errors_total", "backend" => b.name()).increment(1);
                    tracing::error!(target: "notify", backend = b.name(), error = ?e, "notification failed");
                }
            }
        }
        ok
    }
}

// --- Test helper ---
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: std::sync::Mutex<Vec<AlertPayload>>,
    pub fail: bool,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, alert: &AlertPayload) -> Result<()> {
        if self.fail {
            anyhow::bail!("recording notifier set to fail");
        }
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(alert.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
