use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already installed.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe_pulse_metrics();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

pub fn describe_pulse_metrics() {
    describe_counter!("pulse_cycles_total", "Completed aggregation cycles");
    describe_counter!("pulse_cycle_failures_total", "Cycles aborted by an unexpected failure");
    describe_counter!("pulse_dedup_removed_total", "Near-duplicate headlines dropped");
    describe_counter!("pulse_notifications_total", "Alerts delivered, by backend");
    describe_counter!("pulse_notification_errors_total", "Alert deliveries that failed, by backend");
    describe_gauge!("pulse_cache_size", "Headlines in the published cache");
    describe_gauge!("pulse_last_cycle_ts", "Unix time of the last published cycle");
    describe_histogram!("pulse_cycle_ms", "Cycle duration in milliseconds");
    crate::ingest::ensure_metrics_described();
}
