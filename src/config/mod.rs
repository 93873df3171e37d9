//! Configuration module for oiwatch
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`OIWATCH_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use oiwatch::config::WatcherConfig;
//!
//! let config = WatcherConfig::default();
//! assert_eq!(config.backend.base_url, "http://localhost:5000");
//!
//! let toml = r#"
//! [backend]
//! base_url = "http://10.0.0.5:5000"
//! "#;
//! let config: WatcherConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.backend.base_url, "http://10.0.0.5:5000");
//! assert_eq!(config.backend.timeout_seconds, 60);
//! ```

pub mod backend;
pub mod error;
pub mod logging;
pub mod server;
pub mod source;

pub use backend::BackendConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;
pub use source::SourceConfig;

use crate::source::{default_sources, Source};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Unified configuration for the watcher.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Analytics backend location and default timeout
    pub backend: BackendConfig,
    /// HTTP read API
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// Source registrations; empty means the stock set
    pub sources: Vec<SourceConfig>,
}

impl WatcherConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: p.to_path_buf(),
                    source,
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports OIWATCH_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        // Backend settings
        if let Ok(url) = std::env::var("OIWATCH_API_URL") {
            self.backend.base_url = url;
        }
        if let Ok(timeout) = std::env::var("OIWATCH_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.backend.timeout_seconds = t;
            }
        }

        // Server settings
        if let Ok(port) = std::env::var("OIWATCH_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("OIWATCH_HOST") {
            self.server.host = host;
        }

        // Logging settings
        if let Ok(level) = std::env::var("OIWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("OIWATCH_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Sources to register, in order.
    pub fn resolved_sources(&self) -> Vec<Source> {
        let timeout = self.backend.timeout();
        if self.sources.is_empty() {
            return default_sources(timeout);
        }
        self.sources.iter().map(|s| s.to_source(timeout)).collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = Url::parse(&self.backend.base_url) {
            return Err(validation("backend.base_url", e.to_string()));
        }
        if self.backend.timeout_seconds == 0 {
            return Err(validation(
                "backend.timeout_seconds",
                "timeout must be non-zero",
            ));
        }
        if self.server.port == 0 {
            return Err(validation("server.port", "port must be non-zero"));
        }
        if let Some((key, level)) = self.logging.unknown_level() {
            return Err(validation(
                format!("logging.{}", key),
                format!("unknown log level '{}'", level),
            ));
        }

        let mut seen = HashSet::new();
        for (i, entry) in self.sources.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(validation(format!("sources[{}].id", i), "id cannot be empty"));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(validation(
                    format!("sources[{}].id", i),
                    format!("duplicate source id '{}'", entry.id),
                ));
            }
            if entry.path.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err(validation(
                    format!("sources[{}].path", i),
                    "path cannot be empty",
                ));
            }
            if entry.interval_seconds == Some(0) {
                return Err(validation(
                    format!("sources[{}].interval_seconds", i),
                    "interval must be non-zero",
                ));
            }
            if entry.timeout_seconds == Some(0) {
                return Err(validation(
                    format!("sources[{}].timeout_seconds", i),
                    "timeout must be non-zero",
                ));
            }
        }

        for (i, source) in self.resolved_sources().iter().enumerate() {
            if let Err(e) = source.url(&self.backend.base_url) {
                return Err(validation(format!("sources[{}].path", i), e.to_string()));
            }
        }

        Ok(())
    }
}

/// Serializes tests that read or write `OIWATCH_*` variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn validation(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        message: message.into(),
    }
}
