//! Outcome of a single fetch.

use super::error::{ErrorKind, FetchError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of one fetch against a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchResult<T> {
    /// Backend answered with a usable payload
    Success {
        value: T,
        fetched_at: DateTime<Utc>,
    },
    /// Fetch failed; `message` is the rendered [`FetchError`]
    Failure {
        kind: ErrorKind,
        message: String,
        occurred_at: DateTime<Utc>,
    },
}

impl<T> FetchResult<T> {
    /// Successful result stamped with the current time.
    pub fn success(value: T) -> Self {
        FetchResult::Success {
            value,
            fetched_at: Utc::now(),
        }
    }

    /// Failed result stamped with the current time.
    pub fn failure(error: FetchError) -> Self {
        FetchResult::Failure {
            kind: error.kind(),
            message: error.to_string(),
            occurred_at: Utc::now(),
        }
    }

    pub fn from_outcome(outcome: Result<T, FetchError>) -> Self {
        match outcome {
            Ok(value) => Self::success(value),
            Err(error) => Self::failure(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }

    /// `fetched_at` or `occurred_at`, whichever applies.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            FetchResult::Success { fetched_at, .. } => *fetched_at,
            FetchResult::Failure { occurred_at, .. } => *occurred_at,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FetchResult::Success { value, .. } => Some(value),
            FetchResult::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            FetchResult::Success { .. } => None,
            FetchResult::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            FetchResult::Success { .. } => None,
            FetchResult::Failure { message, .. } => Some(message),
        }
    }

    /// Convert a successful value, turning a conversion error into a
    /// failure that keeps the original timestamp.
    pub fn and_then<U, F>(self, f: F) -> FetchResult<U>
    where
        F: FnOnce(T) -> Result<U, FetchError>,
    {
        match self {
            FetchResult::Success { value, fetched_at } => match f(value) {
                Ok(value) => FetchResult::Success { value, fetched_at },
                Err(error) => FetchResult::Failure {
                    kind: error.kind(),
                    message: error.to_string(),
                    occurred_at: fetched_at,
                },
            },
            FetchResult::Failure {
                kind,
                message,
                occurred_at,
            } => FetchResult::Failure {
                kind,
                message,
                occurred_at,
            },
        }
    }
}
