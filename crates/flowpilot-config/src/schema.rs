//! Configuration schema definitions.
//!
//! Every field has a default, so an empty file is a complete configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Browser connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Remote debugging HTTP endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Substring of the page URL to attach to; the first page target otherwise.
    #[serde(default)]
    pub target_url: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            target_url: None,
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}

/// Editor detection loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_detection_interval")]
    pub interval_ms: u64,

    /// Give up detecting after this long.
    #[serde(default = "default_detection_timeout")]
    pub timeout_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_detection_interval(),
            timeout_ms: default_detection_timeout(),
        }
    }
}

impl DetectionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_detection_interval() -> u64 {
    2000
}

fn default_detection_timeout() -> u64 {
    30_000
}

/// Extraction scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Delay between self-scheduled retries.
    #[serde(default = "default_retry_interval")]
    pub retry_interval_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Retry ceiling measured from page load.
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed_ms: u64,

    /// Calls closer together than this reuse the cached result.
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,

    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Wait before the first extraction once the editor is detected.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: default_retry_interval(),
            max_attempts: default_max_attempts(),
            max_elapsed_ms: default_max_elapsed(),
            min_interval_ms: default_min_interval(),
            debounce_ms: default_debounce(),
            initial_delay_ms: default_initial_delay(),
        }
    }
}

impl ExtractionConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn max_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_ms)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

fn default_retry_interval() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    10
}

fn default_max_elapsed() -> u64 {
    60_000
}

fn default_min_interval() -> u64 {
    500
}

fn default_debounce() -> u64 {
    500
}

fn default_initial_delay() -> u64 {
    1000
}

/// Bounds for calls into the host page's script context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_globals_timeout")]
    pub globals_timeout_ms: u64,

    #[serde(default = "default_api_timeout")]
    pub api_timeout_ms: u64,

    /// Node type and credential reads.
    #[serde(default = "default_catalog_timeout")]
    pub catalog_timeout_ms: u64,

    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            globals_timeout_ms: default_globals_timeout(),
            api_timeout_ms: default_api_timeout(),
            catalog_timeout_ms: default_catalog_timeout(),
            dispatch_timeout_ms: default_dispatch_timeout(),
        }
    }
}

impl BridgeConfig {
    pub fn globals_timeout(&self) -> Duration {
        Duration::from_millis(self.globals_timeout_ms)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_millis(self.catalog_timeout_ms)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }
}

fn default_globals_timeout() -> u64 {
    1000
}

fn default_api_timeout() -> u64 {
    2000
}

fn default_catalog_timeout() -> u64 {
    3000
}

fn default_dispatch_timeout() -> u64 {
    5000
}

/// Logging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rotated log files; `~/.flowpilot/logs` when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
