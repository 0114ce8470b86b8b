use super::{AlertPayload, Notifier};
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Discord incoming webhook. Retries transport errors and non-2xx replies
/// with exponential backoff.
#[derive(Clone)]
pub struct DiscordNotifier {
    webhook_url: String,
    client: Client,
    request_timeout: Duration,
    attempts: u8,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: Client::new(),
            request_timeout: Duration::from_secs(5),
            attempts: 3,
        }
    }

    pub fn from_env() -> Option<Self> {
        let url = std::env::var("DISCORD_WEBHOOK_URL").ok()?;
        (!url.is_empty()).then(|| Self::new(url))
    }

    async fn post_once(&self, body: &WebhookBody) -> Result<()> {
        let rsp = self
            .client
            .post(&self.webhook_url)
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| anyhow!("discord request failed: {e}"))?;
        rsp.error_for_status()
            .map_err(|e| anyhow!("discord HTTP error: {e}"))?;
        Ok(())
    }
}

/// 500ms, 1s, 2s, ...
fn backoff(attempt: u8) -> Duration {
    Duration::from_millis(500u64 << attempt.saturating_sub(1).min(6))
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, alert: &AlertPayload) -> Result<()> {
        let body = WebhookBody::for_alert(alert);
        let mut attempt: u8 = 1;
        loop {
            match self.post_once(&body).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= self.attempts => return Err(e),
                Err(e) => {
                    tracing::debug!(target: "notify", attempt, error = %e, "discord retry");
                    tokio::time::sleep(backoff(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}

#[derive(Serialize)]
struct Embed {
    title: String,
    description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    url: String,
}

#[derive(Serialize)]
struct WebhookBody {
    embeds: Vec<Embed>,
}

impl WebhookBody {
    fn for_alert(alert: &AlertPayload) -> Self {
        Self {
            embeds: vec![Embed {
                title: "📢 Breaking News".to_string(),
                description: alert.title.clone(),
                url: alert.link.clone(),
            }],
        }
    }
}
