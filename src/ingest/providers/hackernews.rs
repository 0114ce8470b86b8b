// src/ingest/providers/hackernews.rs
//! Hacker News front page scraper (HTML, no API).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::ingest::http::PoliteClient;
use crate::ingest::normalize_text;
use crate::ingest::robots::{self, RobotsPolicy};
use crate::ingest::types::{RawHeadline, SourceProvider};

pub const HN_URL: &str = "https://news.ycombinator.com/";
const SOURCE: &str = "Hacker News";

enum Mode {
    Fixture(String),
    Http { url: String, client: PoliteClient },
}

pub struct HackerNewsProvider {
    mode: Mode,
    max_items: usize,
    robots: RobotsPolicy,
}

impl HackerNewsProvider {
    pub fn from_url(url: &str, client: PoliteClient) -> Self {
        Self {
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
            max_items: super::rss::DEFAULT_MAX_ITEMS,
            robots: RobotsPolicy::Check,
        }
    }

    pub fn from_fixture(html: &str) -> Self {
        Self {
            mode: Mode::Fixture(html.to_string()),
            max_items: super::rss::DEFAULT_MAX_ITEMS,
            robots: RobotsPolicy::Skip,
        }
    }

    pub fn with_max_items(mut self, n: usize) -> Self {
        self.max_items = n;
        self
    }

    pub fn with_robots(mut self, policy: RobotsPolicy) -> Self {
        self.robots = policy;
        self
    }
}

/// Extract `(title, link)` rows from the front page markup.
pub fn parse_front_page(html: &str, max_items: usize) -> Result<Vec<RawHeadline>> {
    let document = Html::parse_document(html);
    let row_sel = Selector::parse("tr.athing").map_err(|e| anyhow!("selector: {e:?}"))?;
    let link_sel = Selector::parse(".titleline a").map_err(|e| anyhow!("selector: {e:?}"))?;

    let mut out = Vec::new();
    for row in document.select(&row_sel) {
        if out.len() >= max_items {
            break;
        }
        let Some(a) = row.select(&link_sel).next() else {
            continue;
        };
        let title = normalize_text(&a.text().collect::<String>());
        let Some(href) = a.value().attr("href") else {
            tracing::warn!(target: "ingest", source = SOURCE, "title link without href");
            continue;
        };
        if title.is_empty() {
            continue;
        }
        let link = if href.starts_with("item?id=") {
            format!("{HN_URL}{href}")
        } else {
            href.to_string()
        };
        out.push(RawHeadline::new(title, link, SOURCE));
    }
    Ok(out)
}

#[async_trait]
impl SourceProvider for HackerNewsProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawHeadline>> {
        match &self.mode {
            Mode::Fixture(html) => parse_front_page(html, self.max_items),
            Mode::Http { url, client } => {
                if !robots::is_allowed(client, self.robots, url).await {
                    tracing::warn!(target: "ingest", source = SOURCE, %url, "scraping not allowed by robots.txt");
                    return Ok(Vec::new());
                }
                let body = client.get_text(url).await.context("hacker news fetch")?;
                parse_front_page(&body, self.max_items)
            }
        }
    }

    fn name(&self) -> &str {
        SOURCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body><table>
      <tr class="athing" id="1"><td class="title"><span class="titleline">
        <a href="https://example.com/rust">Rust 2.0 announced</a><span class="sitebit">(example.com)</span>
      </span></td></tr>
      <tr><td class="subtext">12 points</td></tr>
      <tr class="athing" id="2"><td class="title"><span class="titleline">
        <a href="item?id=42">Ask HN: Is AI overhyped?</a>
      </span></td></tr>
      <tr class="athing" id="3"><td class="title">no title line here</td></tr>
    </table></body></html>"#;

    #[tokio::test]
    async fn scrapes_titles_and_absolutizes_item_links() {
        let items = HackerNewsProvider::from_fixture(PAGE).fetch_latest().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Rust 2.0 announced");
        assert_eq!(items[0].link, "https://example.com/rust");
        assert_eq!(items[1].title, "Ask HN: Is AI overhyped?");
        assert_eq!(items[1].link, "https://news.ycombinator.com/item?id=42");
        assert!(items.iter().all(|h| h.source == "Hacker News"));
    }

    #[test]
    fn max_items_is_respected() {
        assert_eq!(parse_front_page(PAGE, 1).unwrap().len(), 1);
    }
}
