// src/pipeline.rs
//! The aggregation cycle: fetch → score → dedup → rank → notify → publish →
//! persist, then sleep. Runs as one background tokio task.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::analyze::{deduplicate, sort_by_score_desc};
use crate::cache::PublishedCache;
use crate::config::CycleConfig;
use crate::ingest::log::HeadlineSink;
use crate::ingest::types::{Headline, LogRecord, SourceProvider};
use crate::notify::{AlertPayload, NotifierMux};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CycleState {
    Idle = 0,
    Fetching,
    Scoring,
    Deduplicating,
    Ranking,
    Publishing,
    Sleeping,
    Stopped,
}

impl CycleState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Fetching,
            2 => Self::Scoring,
            3 => Self::Deduplicating,
            4 => Self::Ranking,
            5 => Self::Publishing,
            6 => Self::Sleeping,
            7 => Self::Stopped,
            _ => Self::Idle,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Scoring => "scoring",
            Self::Deduplicating => "deduplicating",
            Self::Ranking => "ranking",
            Self::Publishing => "publishing",
            Self::Sleeping => "sleeping",
            Self::Stopped => "stopped",
        }
    }
}

/// Loop status readable from request handlers.
#[derive(Debug, Default)]
pub struct CycleStatus {
    state: AtomicU8,
    alive: AtomicBool,
    last_published: Mutex<Option<DateTime<Utc>>>,
}

impl CycleStatus {
    pub fn state(&self) -> CycleState {
        CycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, s: CycleState) {
        self.state.store(s as u8, Ordering::Release);
        tracing::debug!(target: "pipeline", state = s.as_str(), "state");
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn set_alive(&self, v: bool) {
        self.alive.store(v, Ordering::Release);
    }

    pub fn last_published(&self) -> Option<DateTime<Utc>> {
        *self.last_published.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn mark_published(&self, at: DateTime<Utc>) {
        *self.last_published.lock().unwrap_or_else(|p| p.into_inner()) = Some(at);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub published: usize,
    pub duplicates_removed: usize,
    pub top_score: Option<i64>,
    pub notified: bool,
    /// Shutdown was requested before the cycle finished.
    pub interrupted: bool,
}

pub struct Orchestrator {
    providers: Vec<Arc<dyn SourceProvider>>,
    notifier: NotifierMux,
    sink: Arc<dyn HeadlineSink>,
    cache: Arc<PublishedCache>,
    status: Arc<CycleStatus>,
    cfg: CycleConfig,
}

impl Orchestrator {
    pub fn new(
        providers: Vec<Arc<dyn SourceProvider>>,
        notifier: NotifierMux,
        sink: Arc<dyn HeadlineSink>,
        cfg: CycleConfig,
    ) -> Self {
        Self {
            providers,
            notifier,
            sink,
            cache: Arc::new(PublishedCache::new()),
            status: Arc::new(CycleStatus::default()),
            cfg,
        }
    }

    pub fn cache(&self) -> Arc<PublishedCache> {
        Arc::clone(&self.cache)
    }

    pub fn status(&self) -> Arc<CycleStatus> {
        Arc::clone(&self.status)
    }

    /// One full cycle, ignoring shutdown.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.cycle(None).await
    }

    async fn cycle(&self, stop: Option<&watch::Receiver<bool>>) -> Result<CycleReport> {
        let stopping = || stop.is_some_and(|rx| *rx.borrow());
        let mut report = CycleReport::default();

        self.status.set_state(CycleState::Fetching);
        let raw = crate::ingest::run_once(&self.providers, self.cfg.fetch_timeout()).await;
        report.fetched = raw.len();
        if stopping() {
            report.interrupted = true;
            return Ok(report);
        }

        self.status.set_state(CycleState::Scoring);
        let now = Utc::now();
        let scored: Vec<Headline> = raw.into_iter().map(|r| Headline::from_raw(r, now)).collect();
        if stopping() {
            report.interrupted = true;
            return Ok(report);
        }

        self.status.set_state(CycleState::Deduplicating);
        let before = scored.len();
        let mut kept = deduplicate(scored, self.cfg.dedup_threshold);
        report.duplicates_removed = before - kept.len();
        counter!("pulse_dedup_removed_total").increment(report.duplicates_removed as u64);
        if stopping() {
            report.interrupted = true;
            return Ok(report);
        }

        self.status.set_state(CycleState::Ranking);
        sort_by_score_desc(&mut kept);
        report.top_score = kept.first().map(|h| h.score);
        if stopping() {
            report.interrupted = true;
            return Ok(report);
        }

        self.status.set_state(CycleState::Publishing);
        if let Some(top) = kept.first().filter(|h| h.score > self.cfg.notify_threshold) {
            tracing::info!(target: "pipeline", title = %top.title, score = top.score, "alerting on top headline");
            let alert = AlertPayload::new(top.title.clone(), top.link.clone());
            let mux = self.notifier.clone();
            // Detached: slow or panicking backends never hold up the swap below.
            tokio::spawn(async move {
                mux.notify(&alert).await;
            });
            report.notified = true;
        }

        let rows: Vec<LogRecord> = kept.iter().map(LogRecord::from).collect();
        report.published = kept.len();
        self.cache.replace(kept);
        self.status.mark_published(now);
        gauge!("pulse_last_cycle_ts").set(now.timestamp() as f64);

        self.persist(rows).await?;
        Ok(report)
    }

    /// Append + compact on a separate task. I/O errors are logged; a panic
    /// fails the cycle.
    async fn persist(&self, rows: Vec<LogRecord>) -> Result<()> {
        let sink = Arc::clone(&self.sink);
        let task = tokio::spawn(async move {
            let n = rows.len();
            if let Err(e) = sink.append(rows).await {
                tracing::error!(target: "pipeline", error = ?e, "headline log append failed");
                return;
            }
            match sink.compact().await {
                Ok(removed) => {
                    tracing::debug!(target: "pipeline", appended = n, removed, "headline log compacted")
                }
                Err(e) => tracing::error!(target: "pipeline", error = ?e, "headline log compaction failed"),
            }
        });
        task.await
            .map_err(|e| anyhow!("headline log task failed: {e}"))
    }

    /// Cycle forever until `shutdown` flips to `true` (or its sender drops).
    /// Each cycle runs on its own task, so a panic in any phase counts as a
    /// failed cycle and the loop carries on after `retry_delay`.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let _alive = AliveGuard::enter(self.status());
        tracing::info!(
            target: "pipeline",
            sources = self.providers.len(),
            interval_secs = self.cfg.interval_secs,
            "cycle loop started"
        );

        let mut cycle_no: u64 = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }
            cycle_no += 1;
            let t0 = Instant::now();
            let task = {
                let me = Arc::clone(&self);
                let stop = shutdown.clone();
                tokio::spawn(async move { me.cycle(Some(&stop)).await })
            };
            let outcome = task
                .await
                .map_err(|e| anyhow!("cycle task failed: {e}"))
                .and_then(|r| r);
            let delay = match outcome {
                Ok(report) if report.interrupted => break,
                Ok(report) => {
                    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
                    counter!("pulse_cycles_total").increment(1);
                    histogram!("pulse_cycle_ms").record(ms);
                    tracing::info!(
                        target: "pipeline",
                        cycle = cycle_no,
                        fetched = report.fetched,
                        published = report.published,
                        removed = report.duplicates_removed,
                        notified = report.notified,
                        elapsed_ms = ms as u64,
                        "cycle complete"
                    );
                    self.cfg.interval()
                }
                Err(e) => {
                    counter!("pulse_cycle_failures_total").increment(1);
                    tracing::error!(
                        target: "pipeline",
                        cycle = cycle_no,
                        error = ?e,
                        retry_secs = self.cfg.retry_delay_secs,
                        "cycle failed"
                    );
                    self.cfg.retry_delay()
                }
            };

            self.status.set_state(CycleState::Sleeping);
            if !sleep_or_stop(delay, &mut shutdown).await {
                break;
            }
        }

        tracing::info!(target: "pipeline", "cycle loop stopped");
    }

    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

/// Marks the loop alive for as long as it is held. Dropping it (normal exit,
/// abort or unwind) reports the loop as stopped.
struct AliveGuard(Arc<CycleStatus>);

impl AliveGuard {
    fn enter(status: Arc<CycleStatus>) -> Self {
        status.set_alive(true);
        Self(status)
    }
}

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.set_state(CycleState::Stopped);
        self.0.set_alive(false);
    }
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(target: "pipeline", error = ?e, "ctrl_c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(target: "pipeline", error = ?e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Wait for `signal`, then flip the shutdown flag.
pub async fn stop_on<F>(signal: F, stop: watch::Sender<bool>)
where
    F: std::future::Future<Output = ()>,
{
    signal.await;
    tracing::info!(target: "pipeline", "shutdown requested");
    let _ = stop.send(true);
}

/// `true` when the full delay elapsed, `false` on shutdown.
async fn sleep_or_stop(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return false;
                }
            }
        }
    }
}
