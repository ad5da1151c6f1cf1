use super::*;

#[test]
fn test_default_config_is_valid() {
    let result = ConfigValidator::validate(&Config::default());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_non_http_endpoint_is_error() {
    let mut config = Config::default();
    config.browser.endpoint = "ws://localhost:9222".to_string();
    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert_eq!(result.errors[0].path, "browser.endpoint");
}

#[test]
fn test_zero_timings_are_errors() {
    let mut config = Config::default();
    config.extraction.debounce_ms = 0;
    config.bridge.dispatch_timeout_ms = 0;
    let result = ConfigValidator::validate(&config);
    let paths: Vec<_> = result.errors.iter().map(|e| e.path.as_str()).collect();
    assert!(paths.contains(&"extraction.debounce_ms"));
    assert!(paths.contains(&"bridge.dispatch_timeout_ms"));
}

#[test]
fn test_zero_attempts_is_error() {
    let mut config = Config::default();
    config.extraction.max_attempts = 0;
    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
}

#[test]
fn test_long_debounce_is_warning() {
    let mut config = Config::default();
    config.extraction.debounce_ms = 5000;
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].path, "extraction.debounce_ms");
}

#[test]
fn test_into_result_surfaces_first_error() {
    let mut config = Config::default();
    config.detection.interval_ms = 0;
    let err = ConfigValidator::validate(&config).into_result().unwrap_err();
    assert!(err.to_string().contains("detection.interval_ms"));
}
