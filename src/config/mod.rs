// src/config/mod.rs
//! Runtime configuration: `config/pulse.toml` (or `$PULSE_CONFIG_PATH`),
//! then environment overrides. Secrets come from the environment only.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::PulseError;
use crate::ingest::robots::RobotsPolicy;

pub const DEFAULT_CONFIG_PATH: &str = "config/pulse.toml";
pub const ENV_CONFIG_PATH: &str = "PULSE_CONFIG_PATH";
pub const ENV_API_KEY: &str = "API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Rss,
    Hackernews,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceKind,
    pub url: String,
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default)]
    pub robots: RobotsPolicy,
}

fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_max_items() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub interval_secs: u64,
    pub retry_delay_secs: u64,
    pub fetch_timeout_secs: u64,
    pub notify_threshold: i64,
    pub dedup_threshold: f64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            retry_delay_secs: 10,
            fetch_timeout_secs: 30,
            notify_threshold: 20,
            dedup_threshold: crate::analyze::DEFAULT_DEDUP_THRESHOLD,
        }
    }
}

impl CycleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            delay_min_ms: 1_000,
            delay_max_ms: 3_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub allowed_origins: Vec<String>,
    pub trending_per_minute: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            trending_per_minute: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cycle: CycleConfig,
    pub http: HttpConfig,
    pub api: ApiConfig,
    pub log_path: PathBuf,
    pub sources: Vec<SourceConfig>,
    /// Admin credential; never read from the file.
    #[serde(skip)]
    pub api_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cycle: CycleConfig::default(),
            http: HttpConfig::default(),
            api: ApiConfig::default(),
            log_path: PathBuf::from("headlines.csv"),
            sources: default_sources(),
            api_key: String::new(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing pulse config")?;
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// Resolve the config file:
    /// 1) $PULSE_CONFIG_PATH (must exist)
    /// 2) config/pulse.toml
    /// 3) built-in defaults
    ///
    /// then apply env overrides and require `API_KEY`.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(PulseError::Config(format!(
                    "{ENV_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                ))
                .into());
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            tracing::info!("no config file found, using built-in defaults");
            Self::default()
        };
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<()> {
        fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
            match std::env::var(name) {
                Ok(v) => v
                    .trim()
                    .parse::<T>()
                    .map(Some)
                    .map_err(|_| anyhow!("invalid value for {name}: {v}")),
                Err(_) => Ok(None),
            }
        }

        if let Some(v) = parse_env("PULSE_INTERVAL_SECS")? {
            self.cycle.interval_secs = v;
        }
        if let Some(v) = parse_env("PULSE_RETRY_SECS")? {
            self.cycle.retry_delay_secs = v;
        }
        if let Some(v) = parse_env("PULSE_NOTIFY_THRESHOLD")? {
            self.cycle.notify_threshold = v;
        }
        if let Some(v) = parse_env("PULSE_DEDUP_THRESHOLD")? {
            self.cycle.dedup_threshold = v;
        }
        if let Ok(p) = std::env::var("PULSE_LOG_PATH") {
            self.log_path = PathBuf::from(p);
        }

        self.api_key = std::env::var(ENV_API_KEY).unwrap_or_default();
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(PulseError::Config(format!("{ENV_API_KEY} must be set")).into());
        }
        if !(0.0..=1.0).contains(&self.cycle.dedup_threshold) {
            return Err(PulseError::Config("dedup_threshold must be within [0, 1]".into()).into());
        }
        if self.cycle.interval_secs == 0 {
            return Err(PulseError::Config("interval_secs must be > 0".into()).into());
        }
        Ok(())
    }
}

fn source(
    name: &str,
    kind: SourceKind,
    url: &str,
    domains: &[&str],
    ttl: u64,
    robots: RobotsPolicy,
) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        kind,
        url: url.to_string(),
        allowed_domains: domains.iter().map(|d| d.to_string()).collect(),
        cache_ttl_secs: ttl,
        max_items: default_max_items(),
        robots,
    }
}

/// Built-in source set.
pub fn default_sources() -> Vec<SourceConfig> {
    use RobotsPolicy::{Check, Skip};
    use SourceKind::{Hackernews, Rss};
    vec![
        // Google News is read as a plain feed, no robots check.
        source("Google News", Rss, "https://news.google.com/rss", &[], 300, Skip),
        // Reddit blocks all bots in robots.txt but serves the feed to browsers.
        source(
            "Reddit News",
            Rss,
            "https://www.reddit.com/r/news/.rss",
            &["www.reddit.com"],
            600,
            Skip,
        ),
        source("Hacker News", Hackernews, "https://news.ycombinator.com/", &[], 300, Check),
        source(
            "YC Blog",
            Rss,
            "https://www.ycombinator.com/blog/rss/",
            &["www.ycombinator.com"],
            1200,
            Skip,
        ),
        source(
            "yahoo",
            Rss,
            "https://finance.yahoo.com/news/rssindex",
            &[
                "finance.yahoo.com",
                "feeds.finance.yahoo.com",
                "www.barrons.com",
                "www.investors.com",
            ],
            1200,
            Check,
        ),
        source(
            "ESPN",
            Rss,
            "https://www.espn.com/espn/rss/news",
            &[
                "www.espn.com",
                "feeds.bbci.co.uk",
                "www.skysports.com",
                "www.cbssports.com",
                "www.foxsports.com",
                "www.wsj.com",
            ],
            1200,
            Skip,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.cycle.interval_secs, 600);
        assert_eq!(cfg.cycle.retry_delay_secs, 10);
        assert_eq!(cfg.cycle.notify_threshold, 20);
        assert_eq!(cfg.sources.len(), 6);
        assert!(cfg.api_key.is_empty());
    }

    #[test]
    fn toml_sections_override_defaults() {
        let s = r#"
            log_path = "data/log.csv"
            [cycle]
            interval_secs = 60
            [[sources]]
            name = "Feed"
            kind = "rss"
            url = "https://example.com/rss"
            robots = "skip"
        "#;
        let cfg = AppConfig::from_toml_str(s).unwrap();
        assert_eq!(cfg.cycle.interval_secs, 60);
        assert_eq!(cfg.cycle.retry_delay_secs, 10);
        assert_eq!(cfg.log_path, PathBuf::from("data/log.csv"));
        assert_eq!(cfg.sources.len(), 1);
        assert_eq!(cfg.sources[0].kind, SourceKind::Rss);
        assert_eq!(cfg.sources[0].robots, RobotsPolicy::Skip);
        assert_eq!(cfg.sources[0].cache_ttl_secs, 300);
        assert_eq!(cfg.sources[0].max_items, 10);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(AppConfig::from_toml_str("cycle = 5").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn load_requires_api_key_and_applies_env() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);

        env::remove_var(ENV_API_KEY);
        let err = AppConfig::load().unwrap_err();
        assert!(err.to_string().contains("API_KEY"));

        env::set_var(ENV_API_KEY, "s3cret");
        env::set_var("PULSE_INTERVAL_SECS", "120");
        let cfg = AppConfig::load().unwrap();
        assert_eq!(cfg.api_key, "s3cret");
        assert_eq!(cfg.cycle.interval_secs, 120);

        env::set_var("PULSE_INTERVAL_SECS", "soon");
        assert!(AppConfig::load().is_err());

        env::remove_var("PULSE_INTERVAL_SECS");
        env::remove_var(ENV_API_KEY);
        env::set_current_dir(&old).unwrap();
    }

    #[serial_test::serial]
    #[test]
    fn missing_explicit_config_path_is_an_error() {
        env::set_var(ENV_CONFIG_PATH, "__pulse_config_should_not_exist__.toml");
        env::set_var(ENV_API_KEY, "k");
        assert!(AppConfig::load().is_err());
        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_API_KEY);
    }
}
