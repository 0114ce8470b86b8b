// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::http::{validate_url, PoliteClient};
use crate::ingest::normalize_text;
use crate::ingest::robots::{self, RobotsPolicy};
use crate::ingest::types::{RawHeadline, SourceProvider};

pub const DEFAULT_MAX_ITEMS: usize = 10;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
}

enum Mode {
    // Owned copy so tests don't need 'static fixtures.
    Fixture(String),
    Http { url: String, client: PoliteClient },
}

/// RSS 2.0 feed source.
pub struct RssProvider {
    name: String,
    mode: Mode,
    allowed_domains: Vec<String>,
    max_items: usize,
    robots: RobotsPolicy,
}

impl RssProvider {
    pub fn from_url(name: &str, url: &str, client: PoliteClient) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
            allowed_domains: Vec::new(),
            max_items: DEFAULT_MAX_ITEMS,
            robots: RobotsPolicy::Check,
        }
    }

    pub fn from_fixture(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(xml.to_string()),
            allowed_domains: Vec::new(),
            max_items: DEFAULT_MAX_ITEMS,
            robots: RobotsPolicy::Skip,
        }
    }

    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = domains;
        self
    }

    pub fn with_max_items(mut self, n: usize) -> Self {
        self.max_items = n;
        self
    }

    pub fn with_robots(mut self, policy: RobotsPolicy) -> Self {
        self.robots = policy;
        self
    }

    fn parse_items_from_str(&self, s: &str) -> Result<Vec<RawHeadline>> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).with_context(|| format!("parsing {} rss xml", self.name))?;

        let mut out = Vec::with_capacity(rss.channel.item.len().min(self.max_items));
        for it in rss.channel.item {
            if out.len() >= self.max_items {
                break;
            }
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                continue;
            }
            let raw_link = it.link.as_deref().unwrap_or_default().trim();
            let link = match validate_url(raw_link, &self.allowed_domains) {
                Ok(l) => l,
                Err(e) => {
                    tracing::warn!(target: "ingest", source = %self.name, error = %e, "skipping rss item");
                    continue;
                }
            };
            out.push(RawHeadline::new(title, link, self.name.clone()));
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for RssProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawHeadline>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http { url, client } => {
                if !robots::is_allowed(client, self.robots, url).await {
                    tracing::warn!(target: "ingest", source = %self.name, %url, "scraping not allowed by robots.txt");
                    return Ok(Vec::new());
                }
                let body = client
                    .get_text(url)
                    .await
                    .with_context(|| format!("{} rss fetch", self.name))?;
                self.parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// quick-xml only knows the XML entities; feeds often carry HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
