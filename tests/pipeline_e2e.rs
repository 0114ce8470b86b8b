// tests/pipeline_e2e.rs
//
// Full cycles through the orchestrator with in-memory sources, a recording
// notifier and either the mock sink or a real CSV log in a temp dir.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use pulse_news::config::CycleConfig;
use pulse_news::ingest::log::{CsvHeadlineLog, HeadlineSink, MockSink, LOG_HEADER};
use pulse_news::notify::{Notifier, NotifierMux, RecordingNotifier};
use pulse_news::pipeline::Orchestrator;
use pulse_news::{RawHeadline, SourceProvider};

struct Fixed {
    name: &'static str,
    items: Vec<RawHeadline>,
}

#[async_trait::async_trait]
impl SourceProvider for Fixed {
    async fn fetch_latest(&self) -> Result<Vec<RawHeadline>> {
        Ok(self.items.clone())
    }
    fn name(&self) -> &str {
        self.name
    }
}

struct Broken;

#[async_trait::async_trait]
impl SourceProvider for Broken {
    async fn fetch_latest(&self) -> Result<Vec<RawHeadline>> {
        bail!("connection reset by peer")
    }
    fn name(&self) -> &str {
        "broken"
    }
}

fn fixed(name: &'static str, titles: &[&str]) -> Arc<dyn SourceProvider> {
    let items = titles
        .iter()
        .enumerate()
        .map(|(i, t)| RawHeadline::new(*t, format!("https://{name}.example/{i}"), name))
        .collect();
    Arc::new(Fixed { name, items })
}

fn cfg() -> CycleConfig {
    CycleConfig {
        fetch_timeout_secs: 2,
        ..CycleConfig::default()
    }
}

fn mux(rec: &Arc<RecordingNotifier>) -> NotifierMux {
    let n: Arc<dyn Notifier> = rec.clone();
    NotifierMux::new(vec![n])
}

#[tokio::test]
async fn bitcoin_scenario_publishes_a_then_c() {
    let rec = Arc::new(RecordingNotifier::default());
    let providers = vec![
        fixed("A", &["Breaking: Bitcoin hits new high"]),
        fixed("B", &["Bitcoin hits a new high"]),
        fixed("C", &["Local bakery wins award"]),
    ];
    let o = Orchestrator::new(providers, mux(&rec), Arc::new(MockSink::new()), cfg());

    let report = o.run_cycle().await.expect("cycle");
    assert_eq!(report.fetched, 3);
    assert_eq!(report.duplicates_removed, 1);

    let published = o.cache().snapshot();
    let sources: Vec<&str> = published.iter().map(|h| h.source.as_str()).collect();
    assert_eq!(sources, vec!["A", "C"]);
    assert_eq!(published[0].category, "Finance");
    // "breaking" keyword + "bitcoin" entity
    assert_eq!(published[0].score, 15);
    assert_eq!(published[1].category, "Sports", "\"wins\" contains the keyword \"win\"");
    // 15 is not above the alert threshold
    assert!(rec.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failing_source_does_not_block_publishing() {
    let rec = Arc::new(RecordingNotifier::default());
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(Broken),
        fixed("ok", &["Stocks rally as inflation cools", "Cricket cup final tonight"]),
    ];
    let o = Orchestrator::new(providers, mux(&rec), Arc::new(MockSink::new()), cfg());
    let report = o.run_cycle().await.expect("cycle");
    assert_eq!(report.fetched, 2);
    assert_eq!(o.cache().len(), 2);
}

#[tokio::test]
async fn each_cycle_replaces_the_cache_wholesale() {
    struct Rotating(std::sync::atomic::AtomicUsize);

    #[async_trait::async_trait]
    impl SourceProvider for Rotating {
        async fn fetch_latest(&self) -> Result<Vec<RawHeadline>> {
            let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(if n == 0 {
                vec![
                    RawHeadline::new("Old story about gardens", "https://o/1", "rot"),
                    RawHeadline::new("Old report on rivers", "https://o/2", "rot"),
                ]
            } else {
                vec![RawHeadline::new("New film festival opens", "https://n/1", "rot")]
            })
        }
        fn name(&self) -> &str {
            "rotating"
        }
    }

    let rec = Arc::new(RecordingNotifier::default());
    let providers: Vec<Arc<dyn SourceProvider>> =
        vec![Arc::new(Rotating(std::sync::atomic::AtomicUsize::new(0)))];
    let o = Orchestrator::new(providers, mux(&rec), Arc::new(MockSink::new()), cfg());

    o.run_cycle().await.expect("first");
    let first = o.cache().snapshot();
    o.run_cycle().await.expect("second");
    let second = o.cache().snapshot();

    assert_eq!(first.len(), 2);
    assert!(first.iter().all(|h| h.title.starts_with("Old")));
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].title, "New film festival opens");
}

#[tokio::test]
async fn slow_source_times_out_and_contributes_nothing() {
    struct Slow;

    #[async_trait::async_trait]
    impl SourceProvider for Slow {
        async fn fetch_latest(&self) -> Result<Vec<RawHeadline>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![RawHeadline::new("never", "https://slow", "slow")])
        }
        fn name(&self) -> &str {
            "slow"
        }
    }

    let rec = Arc::new(RecordingNotifier::default());
    let providers: Vec<Arc<dyn SourceProvider>> =
        vec![Arc::new(Slow), fixed("fast", &["Markets open higher"])];
    let cfg = CycleConfig {
        fetch_timeout_secs: 1,
        ..CycleConfig::default()
    };
    let o = Orchestrator::new(providers, mux(&rec), Arc::new(MockSink::new()), cfg);
    let report = o.run_cycle().await.expect("cycle");
    assert_eq!(report.fetched, 1);
    assert_eq!(o.cache().snapshot()[0].source, "fast");
}

#[tokio::test]
async fn csv_log_accumulates_without_exact_duplicates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("headlines.csv");
    let sink: Arc<dyn HeadlineSink> = Arc::new(CsvHeadlineLog::new(&path));

    let rec = Arc::new(RecordingNotifier::default());
    let providers = vec![fixed(
        "Feed",
        &["Breaking: Bitcoin hits new high", "Local bakery wins award"],
    )];
    let o = Orchestrator::new(providers, mux(&rec), sink, cfg());
    o.run_cycle().await.expect("first");
    o.run_cycle().await.expect("second");

    let content = std::fs::read_to_string(&path).expect("read log");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            LOG_HEADER,
            "Breaking: Bitcoin hits new high,Finance,Feed",
            "Local bakery wins award,Sports,Feed",
        ]
    );
}

#[tokio::test]
async fn high_score_alerts_once_with_top_headline() {
    let rec = Arc::new(RecordingNotifier::default());
    let providers = vec![fixed(
        "X",
        &["Local bakery wins award", "Exclusive: Elon announces AI plan?"],
    )];
    let o = Orchestrator::new(providers, mux(&rec), Arc::new(MockSink::new()), cfg());
    o.run_cycle().await.expect("cycle");

    // delivery runs on its own task
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while rec.sent.lock().unwrap().is_empty() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let sent = rec.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Exclusive: Elon announces AI plan?");
    assert_eq!(sent[0].link, "https://X.example/1");
}
