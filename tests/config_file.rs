// tests/config_file.rs
//
// The shipped config/pulse.toml must parse and match the built-in defaults.

use pulse_news::config::{default_sources, AppConfig, SourceKind};

#[test]
fn shipped_config_matches_builtin_sources() {
    let cfg = AppConfig::load_from_file("config/pulse.toml").expect("config/pulse.toml parses");
    let defaults = default_sources();

    assert_eq!(cfg.sources.len(), defaults.len());
    for (file, builtin) in cfg.sources.iter().zip(&defaults) {
        assert_eq!(file.name, builtin.name);
        assert_eq!(file.url, builtin.url);
        assert_eq!(file.kind, builtin.kind);
        assert_eq!(file.allowed_domains, builtin.allowed_domains);
        assert_eq!(file.cache_ttl_secs, builtin.cache_ttl_secs);
        assert_eq!(file.robots, builtin.robots);
    }
    assert_eq!(
        cfg.sources.iter().filter(|s| s.kind == SourceKind::Hackernews).count(),
        1
    );
    assert_eq!(cfg.cycle.interval_secs, 600);
    assert_eq!(cfg.cycle.notify_threshold, 20);
    assert!((cfg.cycle.dedup_threshold - 0.7).abs() < f64::EPSILON);
    assert!(cfg.api_key.is_empty(), "secrets never come from the file");
}
