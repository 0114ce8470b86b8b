// src/notify/onesignal.rs
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use super::{AlertPayload, Notifier};

pub const ONESIGNAL_URL: &str = "https://onesignal.com/api/v1/notifications";
const FALLBACK_LINK: &str = "https://pulse.news";

pub struct OneSignalNotifier {
    app_id: String,
    api_key: String,
    client: Client,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PushBody {
    app_id: String,
    included_segments: Vec<String>,
    headings: HashMap<String, String>,
    contents: HashMap<String, String>,
    url: String,
}

impl OneSignalNotifier {
    pub fn new(app_id: String, api_key: String) -> Self {
        Self {
            app_id,
            api_key,
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }

    /// `ONESIGNAL_APP_ID` + `ONESIGNAL_API_KEY`; `None` when either is missing.
    pub fn from_env() -> Option<Self> {
        let app_id = std::env::var("ONESIGNAL_APP_ID").ok().filter(|s| !s.is_empty())?;
        let api_key = std::env::var("ONESIGNAL_API_KEY").ok().filter(|s| !s.is_empty())?;
        Some(Self::new(app_id, api_key))
    }

    pub fn body(&self, alert: &AlertPayload) -> PushBody {
        let title = if alert.title.is_empty() {
            "No title".to_string()
        } else {
            alert.title.clone()
        };
        let url = if alert.link.is_empty() {
            FALLBACK_LINK.to_string()
        } else {
            alert.link.clone()
        };
        PushBody {
            app_id: self.app_id.clone(),
            included_segments: vec!["All".to_string()],
            headings: HashMap::from([("en".to_string(), "📢 Breaking News".to_string())]),
            contents: HashMap::from([("en".to_string(), title)]),
            url,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for OneSignalNotifier {
    async fn send(&self, alert: &AlertPayload) -> Result<()> {
        self.client
            .post(ONESIGNAL_URL)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", self.api_key))
            .json(&self.body(alert))
            .send()
            .await
            .context("onesignal post")?
            .error_for_status()
            .context("onesignal non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "onesignal"
    }
}
