//! Pulse news service — binary entrypoint.
//! Starts the background cycle loop and serves the Axum API.

use std::sync::Arc;

use anyhow::Context;
use pulse_news::api::{self, AppState};
use pulse_news::cache::AdminAccess;
use pulse_news::config::AppConfig;
use pulse_news::ingest::http::{HttpPolicy, PoliteClient};
use pulse_news::ingest::log::CsvHeadlineLog;
use pulse_news::ingest::providers::build_sources;
use pulse_news::metrics::Metrics;
use pulse_news::notify::NotifierMux;
use pulse_news::pipeline::{shutdown_signal, stop_on, Orchestrator};
use pulse_news::rate_limit::RateLimiter;
use shuttle_axum::ShuttleAxum;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` wins; otherwise `pulse_news=info,warn`.
/// `PULSE_LOG_JSON=1` switches to one JSON object per line.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pulse_news=info,warn"));
    let json = std::env::var("PULSE_LOG_JSON").ok().is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    // Shuttle may have installed a subscriber already.
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already set");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load().context("loading configuration")?;

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = ?e, "metrics disabled");
            None
        }
    };

    let policy = HttpPolicy {
        delay_ms: (cfg.http.delay_min_ms, cfg.http.delay_max_ms),
        ..HttpPolicy::default()
    };
    let client = PoliteClient::new(policy).context("building HTTP client")?;
    let providers = build_sources(&cfg.sources, &client);
    let sink = Arc::new(CsvHeadlineLog::new(cfg.log_path.clone()));
    let orchestrator = Arc::new(Orchestrator::new(
        providers,
        NotifierMux::from_env(),
        sink,
        cfg.cycle.clone(),
    ));

    let mut state = AppState::new(
        orchestrator.cache(),
        orchestrator.status(),
        AdminAccess::new(cfg.api_key.clone()),
    )
    .with_limiter(RateLimiter::per_minute(cfg.api.trending_per_minute))
    .with_allowed_origins(cfg.api.allowed_origins.clone());
    if let Some(m) = metrics {
        state = state.with_metrics(m);
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    orchestrator.spawn(stop_rx);
    tokio::spawn(stop_on(shutdown_signal(), stop_tx));

    Ok(api::router(state).into())
}
