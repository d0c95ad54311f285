//! Configuration file parsing and structures.
//!
//! carportd uses TOML for declarative configuration. Each integration gets
//! its own optional table under [integrations]; leaving the table out leaves
//! the integration out.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing_subscriber::filter::LevelFilter;

use crate::integrations::cupra::CupraConfig;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub integrations: IntegrationsConfig,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-module overrides, keyed by tracing target
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Enable the HTTP API (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address to bind
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8565
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            listen: default_listen(),
            port: default_port(),
        }
    }
}

/// Integration configuration container
#[derive(Debug, Default, Deserialize)]
pub struct IntegrationsConfig {
    /// CUPRA connected-car integration (statically typed)
    #[serde(default)]
    pub cupra: Option<CupraConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        toml::from_str(&contents).map_err(ConfigError::Parse)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.api.enabled);
        assert_eq!(config.api.listen, "127.0.0.1");
        assert_eq!(config.api.port, 8565);
        assert!(config.integrations.cupra.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [logging]
            level = "debug"

            [logging.overrides]
            "carportd::api" = "warn"

            [api]
            enabled = true
            listen = "0.0.0.0"
            port = 9000

            [integrations.cupra]
            refresh_seconds = 120
            target_temperature_c = 21.0
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(
            config.logging.overrides.get("carportd::api"),
            Some(&LogLevel::Warn)
        );
        assert_eq!(config.api.listen, "0.0.0.0");
        assert_eq!(config.api.port, 9000);

        let cupra = config.integrations.cupra.as_ref().unwrap();
        assert!(cupra.enabled);
        assert_eq!(cupra.refresh_seconds, 120);
        assert_eq!(cupra.target_temperature_c, 21.0);
    }

    #[test]
    fn test_parse_disabled_integration() {
        let toml = r#"
            [integrations.cupra]
            enabled = false
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        let cupra = config.integrations.cupra.as_ref().unwrap();
        assert!(!cupra.enabled);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carportd.toml");
        std::fs::write(&path, "[logging]\nlevel = \"trace\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.logging.level, LogLevel::Trace);
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/carportd.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }
}
