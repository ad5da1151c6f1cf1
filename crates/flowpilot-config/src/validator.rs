//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a `ConfigError`.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();
        Self::validate_browser(config, &mut result);
        Self::validate_detection(config, &mut result);
        Self::validate_extraction(config, &mut result);
        Self::validate_bridge(config, &mut result);
        result
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let endpoint = &config.browser.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            result.add_error(ValidationError::new(
                "browser.endpoint",
                "must be an http(s) URL",
            ));
        }
    }

    fn validate_detection(config: &Config, result: &mut ValidationResult) {
        let detection = &config.detection;
        if detection.interval_ms == 0 {
            result.add_error(ValidationError::new(
                "detection.interval_ms",
                "must be greater than 0",
            ));
        }
        if detection.timeout_ms < detection.interval_ms {
            result.add_warning(ValidationWarning::new(
                "detection.timeout_ms",
                "shorter than the detection interval; only one probe will run",
            ));
        }
    }

    fn validate_extraction(config: &Config, result: &mut ValidationResult) {
        let extraction = &config.extraction;
        for (path, value) in [
            ("extraction.retry_interval_ms", extraction.retry_interval_ms),
            ("extraction.debounce_ms", extraction.debounce_ms),
            ("extraction.max_elapsed_ms", extraction.max_elapsed_ms),
        ] {
            if value == 0 {
                result.add_error(ValidationError::new(path, "must be greater than 0"));
            }
        }
        if extraction.max_attempts == 0 {
            result.add_error(ValidationError::new(
                "extraction.max_attempts",
                "must be at least 1",
            ));
        }
        if extraction.debounce_ms > extraction.retry_interval_ms {
            result.add_warning(ValidationWarning::new(
                "extraction.debounce_ms",
                "longer than the retry interval",
            ));
        }
    }

    fn validate_bridge(config: &Config, result: &mut ValidationResult) {
        let bridge = &config.bridge;
        for (path, value) in [
            ("bridge.globals_timeout_ms", bridge.globals_timeout_ms),
            ("bridge.api_timeout_ms", bridge.api_timeout_ms),
            ("bridge.catalog_timeout_ms", bridge.catalog_timeout_ms),
            ("bridge.dispatch_timeout_ms", bridge.dispatch_timeout_ms),
        ] {
            if value == 0 {
                result.add_error(ValidationError::new(path, "must be greater than 0"));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
