//! Error types for backend fetches.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching one source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// No response was received (connect refused, DNS, reset)
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// Request timeout
    #[error("request timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// HTTP status >= 400
    #[error("HTTP {status}: {body}")]
    Server { status: u16, body: String },

    /// Payload did not match the expected schema
    #[error("invalid payload: {0}")]
    Schema(String),

    /// Payload carried an `error` field
    #[error("backend error: {0}")]
    Domain(String),
}

impl FetchError {
    /// Classification used in snapshots.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Unreachable(_) => ErrorKind::NetworkUnreachable,
            FetchError::Timeout(_) => ErrorKind::Timeout,
            FetchError::Server { status, .. } => ErrorKind::ServerError { status: *status },
            FetchError::Schema(_) => ErrorKind::SchemaError,
            FetchError::Domain(_) => ErrorKind::DomainError,
        }
    }
}

/// Failure classification carried by [`FetchResult::Failure`](super::FetchResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorKind {
    NetworkUnreachable,
    Timeout,
    ServerError { status: u16 },
    SchemaError,
    DomainError,
}

impl ErrorKind {
    /// Short label for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NetworkUnreachable => "network_unreachable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ServerError { .. } => "server_error",
            ErrorKind::SchemaError => "schema_error",
            ErrorKind::DomainError => "domain_error",
        }
    }
}
