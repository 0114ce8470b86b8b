// src/ingest/http.rs
//! Polite HTTP access for scrapers: rotating User-Agent, a random pause
//! before each request, bounded timeouts and a response size cap.

use anyhow::{anyhow, bail, Context, Result};
use rand::seq::IndexedRandom;
use rand::Rng;
use reqwest::{Client, Url};
use std::time::Duration;

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) Gecko Firefox/114.0",
];

pub const MAX_CONTENT_LENGTH: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct HttpPolicy {
    /// Random pause range before each request, in milliseconds.
    pub delay_ms: (u64, u64),
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_content_length: u64,
}

impl Default for HttpPolicy {
    fn default() -> Self {
        Self {
            delay_ms: (1_000, 3_000),
            connect_timeout: Duration::from_millis(3_050),
            timeout: Duration::from_secs(10),
            max_content_length: MAX_CONTENT_LENGTH,
        }
    }
}

impl HttpPolicy {
    /// No pause between requests (tests, local runs).
    pub fn without_delay(mut self) -> Self {
        self.delay_ms = (0, 0);
        self
    }
}

#[derive(Clone)]
pub struct PoliteClient {
    client: Client,
    policy: HttpPolicy,
}

impl PoliteClient {
    pub fn new(policy: HttpPolicy) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(policy.connect_timeout)
            .timeout(policy.timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client, policy })
    }

    pub fn random_user_agent() -> &'static str {
        USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }

    async fn pause(&self) {
        let (lo, hi) = self.policy.delay_ms;
        if hi == 0 {
            return;
        }
        let ms = if hi > lo {
            rand::rng().random_range(lo..=hi)
        } else {
            lo
        };
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// GET `url` and return the body. Non-2xx and oversized responses are errors.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.pause().await;
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, Self::random_user_agent())
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        if let Some(len) = resp.content_length() {
            if len > self.policy.max_content_length {
                bail!("response too large: {len} bytes from {url}");
            }
        }

        let resp = resp
            .error_for_status()
            .with_context(|| format!("non-2xx from {url}"))?;
        resp.text().await.with_context(|| format!("reading body of {url}"))
    }

    /// Plain GET without the politeness pause; `None` unless the status is 200.
    pub async fn get_if_ok(&self, url: &str) -> Result<Option<String>> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, Self::random_user_agent())
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        if resp.status() != reqwest::StatusCode::OK {
            return Ok(None);
        }
        Ok(Some(resp.text().await.context("reading body")?))
    }
}

/// Check that `link` is an absolute URL on an allowed host (empty list allows
/// any host) and return it without query string or fragment.
pub fn validate_url(link: &str, allowed_domains: &[String]) -> Result<String> {
    let parsed = Url::parse(link).map_err(|e| anyhow!("invalid URL {link}: {e}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("invalid URL (no host): {link}"))?;
    if !allowed_domains.is_empty() && !allowed_domains.iter().any(|d| d == host) {
        bail!("domain not allowed: {host}");
    }
    Ok(format!("{}://{}{}", parsed.scheme(), host, parsed.path()))
}
