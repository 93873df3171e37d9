//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or validating `oiwatch.toml`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// TOML syntax or schema error in the file at `path`
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },
}
