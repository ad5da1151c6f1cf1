use super::*;

#[test]
fn test_defaults_match_documented_constants() {
    let config = Config::default();
    assert_eq!(config.browser.endpoint, "http://localhost:9222");
    assert_eq!(config.detection.interval(), Duration::from_secs(2));
    assert_eq!(config.detection.timeout(), Duration::from_secs(30));
    assert_eq!(config.extraction.retry_interval(), Duration::from_secs(2));
    assert_eq!(config.extraction.max_attempts, 10);
    assert_eq!(config.extraction.max_elapsed(), Duration::from_secs(60));
    assert_eq!(config.extraction.min_interval(), Duration::from_millis(500));
    assert_eq!(config.extraction.debounce(), Duration::from_millis(500));
    assert_eq!(config.extraction.initial_delay(), Duration::from_secs(1));
    assert_eq!(config.bridge.globals_timeout(), Duration::from_secs(1));
    assert_eq!(config.bridge.api_timeout(), Duration::from_secs(2));
    assert_eq!(config.bridge.catalog_timeout(), Duration::from_secs(3));
    assert_eq!(config.bridge.dispatch_timeout(), Duration::from_secs(5));
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_partial_section_keeps_other_defaults() {
    let config: Config = toml::from_str(
        r#"
        [extraction]
        max_attempts = 3
        "#,
    )
    .unwrap();
    assert_eq!(config.extraction.max_attempts, 3);
    assert_eq!(config.extraction.retry_interval_ms, 2000);
    assert_eq!(config.bridge.dispatch_timeout_ms, 5000);
}

#[test]
fn test_serialize_roundtrip_through_toml() {
    let mut config = Config::default();
    config.browser.target_url = Some("/workflow/".to_string());
    let text = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed.browser.target_url.as_deref(), Some("/workflow/"));
}
