// src/ingest/mod.rs
pub mod cache;
pub mod http;
pub mod log;
pub mod providers;
pub mod robots;
pub mod types;

use crate::ingest::types::{RawHeadline, SourceProvider};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pulse_candidates_total", "Raw headlines fetched from sources.");
        describe_counter!(
            "pulse_fetch_errors_total",
            "Source fetch/parse errors, timeouts and panics."
        );
        describe_histogram!("pulse_fetch_ms", "Per-source fetch time in milliseconds.");
    });
}

/// Normalize text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("static regex"));
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (also removes newlines, so one title == one log line)
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("static regex"));
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap: 500 chars
    if out.chars().count() > 500 {
        out = out.chars().take(500).collect();
    }

    out
}

/// Fetch every source concurrently and concatenate the results in
/// registration order. A source that errors, panics or runs past
/// `fetch_timeout` contributes nothing; the others are unaffected.
pub async fn run_once(
    providers: &[Arc<dyn SourceProvider>],
    fetch_timeout: Duration,
) -> Vec<RawHeadline> {
    ensure_metrics_described();

    let handles: Vec<_> = providers
        .iter()
        .map(|p| {
            let p = Arc::clone(p);
            tokio::spawn(async move {
                let t0 = std::time::Instant::now();
                let res = tokio::time::timeout(fetch_timeout, p.fetch_latest()).await;
                (res, t0.elapsed())
            })
        })
        .collect();

    let mut raw = Vec::new();
    for (p, handle) in providers.iter().zip(handles) {
        let source = p.name().to_string();
        match handle.await {
            Ok((Ok(Ok(mut items)), elapsed)) => {
                metrics::histogram!("pulse_fetch_ms", "source" => source.clone())
                    .record(elapsed.as_secs_f64() * 1_000.0);
                tracing::info!(target: "ingest", source = %source, items = items.len(), "source fetched");
                raw.append(&mut items);
            }
            Ok((Ok(Err(e)), _)) => {
                tracing::warn!(target: "ingest", error = ?e, source = %source, "source error");
                counter!("pulse_fetch_errors_total", "source" => source).increment(1);
            }
            Ok((Err(_elapsed), _)) => {
                tracing::warn!(
                    target: "ingest",
                    source = %source,
                    timeout_secs = fetch_timeout.as_secs_f64(),
                    "source timed out"
                );
                counter!("pulse_fetch_errors_total", "source" => source).increment(1);
            }
            Err(join_err) => {
                tracing::error!(target: "ingest", error = %join_err, source = %source, "source task failed");
                counter!("pulse_fetch_errors_total", "source" => source).increment(1);
            }
        }
    }

    counter!("pulse_candidates_total").increment(raw.len() as u64);
    raw
}
