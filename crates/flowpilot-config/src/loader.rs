//! Configuration loader.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid")
});

/// Loads TOML configuration with `${VAR}` substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        for cap in ENV_VAR.captures_iter(content) {
            let name = &cap[1];
            let value =
                std::env::var(name).map_err(|_| ConfigError::EnvVarNotSet(name.to_string()))?;
            result = result.replace(&cap[0], &value);
        }
        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.flowpilot`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.extraction.max_attempts, 10);
    }

    #[test]
    fn test_load_sections() {
        let content = r#"
            [browser]
            endpoint = "http://127.0.0.1:9333"
            target_url = "/workflow"

            [bridge]
            dispatch_timeout_ms = 8000
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.browser.endpoint, "http://127.0.0.1:9333");
        assert_eq!(config.browser.target_url.as_deref(), Some("/workflow"));
        assert_eq!(config.bridge.dispatch_timeout_ms, 8000);
        assert_eq!(config.bridge.api_timeout_ms, 2000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[detection]").unwrap();
        writeln!(file, "timeout_ms = 5000").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.detection.timeout_ms, 5000);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/flowpilot.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            ConfigLoader::load_or_default(Path::new("/nonexistent/path/flowpilot.toml")).unwrap();
        assert_eq!(config.browser.endpoint, "http://localhost:9222");
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: unique test-only variable
        unsafe {
            std::env::set_var("FLOWPILOT_TEST_ENDPOINT", "http://10.0.0.2:9222");
        }
        let config =
            ConfigLoader::load_str("[browser]\nendpoint = \"${FLOWPILOT_TEST_ENDPOINT}\"").unwrap();
        assert_eq!(config.browser.endpoint, "http://10.0.0.2:9222");
        unsafe {
            std::env::remove_var("FLOWPILOT_TEST_ENDPOINT");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let result = ConfigLoader::expand_env_vars("value = \"${FLOWPILOT_MISSING_12345}\"");
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(name)) if name == "FLOWPILOT_MISSING_12345"));
    }

    #[test]
    fn test_expand_path() {
        let expanded = ConfigLoader::expand_path("~/.flowpilot");
        assert!(!expanded.starts_with('~'));
    }
}
