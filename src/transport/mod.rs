//! HTTP transport for backend fetches.
//!
//! A [`Transport`] issues one GET and classifies the outcome into a
//! [`FetchResult`]. It never retries and never returns an error past its own
//! boundary; retry cadence belongs to the poller.

mod error;
mod result;

#[cfg(test)]
pub(crate) mod mock;

pub use error::*;
pub use result::*;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

/// Longest body excerpt carried in a server error message.
pub const BODY_EXCERPT_CHARS: usize = 200;

/// Issues GET requests against the analytics backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` and parse the body as JSON within `timeout`.
    async fn fetch(&self, url: &Url, timeout: Duration) -> FetchResult<Value>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a default connection-pooled client.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .build()?;
        Ok(Self { client })
    }

    /// Classify reqwest error into FetchError.
    fn classify_error(e: reqwest::Error, timeout: Duration) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            // Connect, DNS, TLS and resets all mean no usable response
            FetchError::Unreachable(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &Url, timeout: Duration) -> FetchResult<Value> {
        let response = match self.client.get(url.clone()).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => return FetchResult::failure(Self::classify_error(e, timeout)),
        };

        let status = response.status().as_u16();
        if status >= 400 {
            // The status alone classifies the failure; the body is best effort
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::debug!(%url, status, error = %e, "Failed to read error body");
                String::new()
            });
            return FetchResult::failure(FetchError::Server {
                status,
                body: excerpt(&body),
            });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return FetchResult::failure(Self::classify_error(e, timeout)),
        };

        FetchResult::from_outcome(parse_body(&body))
    }
}

/// Parse a response body, surfacing an embedded `error` field as a
/// domain failure.
pub fn parse_body(body: &str) -> Result<Value, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Schema(e.to_string()))?;

    match value.get("error") {
        None | Some(Value::Null) => Ok(value),
        Some(Value::String(message)) => Err(FetchError::Domain(message.clone())),
        Some(other) => Err(FetchError::Domain(other.to_string())),
    }
}

/// First [`BODY_EXCERPT_CHARS`] characters of a body, trimmed.
pub fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_EXCERPT_CHARS {
        trimmed.to_string()
    } else {
        let mut cut: String = trimmed.chars().take(BODY_EXCERPT_CHARS).collect();
        cut.push('…');
        cut
    }
}
