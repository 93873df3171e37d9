//! Data source definitions.
//!
//! A [`Source`] names one backend endpoint together with the schema it
//! returns and the cadence it is polled at. Sources are built once from
//! configuration and never change afterwards.

mod error;
mod payload;

pub use error::*;
pub use payload::*;

use crate::transport::FetchError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Default per-request timeout; the backend can be slow to compute.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Retry interval for fetch-once sources until their first success.
pub const DEFAULT_ONCE_RETRY: Duration = Duration::from_secs(30);

/// Support/resistance tuples registered by default: (interval, unit).
pub const DEFAULT_SUPPORT_RESISTANCE_TUPLES: [(u32, &str); 3] =
    [(15, "minute"), (30, "minute"), (1, "day")];

/// Which payload schema a source returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    OptionChain,
    CurrentPrice,
    PreviousDay,
    StochRsi,
    SupportResistance,
}

impl SourceKind {
    /// Backend path used when a source does not configure one.
    pub fn default_path(&self) -> &'static str {
        match self {
            SourceKind::OptionChain => "/api/oi_data",
            SourceKind::CurrentPrice => "/api/nifty_curr",
            SourceKind::PreviousDay => "/api/nifty_previous_day",
            SourceKind::StochRsi => "/stochrsi_nifty50_5m",
            SourceKind::SupportResistance => "/support_resistance?interval={interval}&unit={unit}",
        }
    }

    /// Polling cadence used when a source does not configure one.
    pub fn default_cadence(&self) -> Cadence {
        match self {
            SourceKind::OptionChain => Cadence::Every(Duration::from_secs(30)),
            SourceKind::CurrentPrice | SourceKind::StochRsi => {
                Cadence::Every(Duration::from_secs(60))
            }
            SourceKind::PreviousDay | SourceKind::SupportResistance => Cadence::Once {
                retry: DEFAULT_ONCE_RETRY,
            },
        }
    }

    /// Decode a raw JSON payload into this kind's schema.
    pub fn decode(&self, value: Value) -> Result<Payload, FetchError> {
        let decoded = match self {
            SourceKind::OptionChain => serde_json::from_value(value).map(Payload::OptionChain),
            SourceKind::CurrentPrice => serde_json::from_value(value).map(Payload::CurrentPrice),
            SourceKind::PreviousDay => serde_json::from_value(value).map(Payload::PreviousDay),
            SourceKind::StochRsi => serde_json::from_value(value).map(Payload::StochRsi),
            SourceKind::SupportResistance => {
                serde_json::from_value(value).map(Payload::SupportResistance)
            }
        };
        decoded.map_err(|e| FetchError::Schema(format!("{}: {}", self, e)))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::OptionChain => "option_chain",
            SourceKind::CurrentPrice => "current_price",
            SourceKind::PreviousDay => "previous_day",
            SourceKind::StochRsi => "stoch_rsi",
            SourceKind::SupportResistance => "support_resistance",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a source is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Fetch every interval, measured from the start of each cycle
    Every(Duration),
    /// Fetch until the first success, retrying every `retry`
    Once { retry: Duration },
}

impl Cadence {
    /// Tick period of the poller timer.
    pub fn period(&self) -> Duration {
        match self {
            Cadence::Every(interval) => *interval,
            Cadence::Once { retry } => *retry,
        }
    }

    pub fn is_once(&self) -> bool {
        matches!(self, Cadence::Once { .. })
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Every(interval) => write!(f, "every {}s", interval.as_secs_f64()),
            Cadence::Once { retry } => write!(f, "once (retry {}s)", retry.as_secs_f64()),
        }
    }
}

/// One backend endpoint with its own cadence and schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub id: String,
    pub kind: SourceKind,
    /// Path template; `{name}` placeholders are filled from `params`
    pub path: String,
    pub params: BTreeMap<String, String>,
    pub cadence: Cadence,
    pub timeout: Duration,
}

impl Source {
    /// Source with the kind's default path and cadence.
    pub fn new(id: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            path: kind.default_path().to_string(),
            params: BTreeMap::new(),
            cadence: kind.default_cadence(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fill `{name}` placeholders of the path template.
    pub fn resolve_path(&self) -> Result<String, SourceError> {
        let mut resolved = String::with_capacity(self.path.len());
        let mut rest = self.path.as_str();

        while let Some(open) = rest.find('{') {
            resolved.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| SourceError::MalformedTemplate {
                    source_id: self.id.clone(),
                    path: self.path.clone(),
                })?;
            let name = &after[..close];
            let value =
                self.params
                    .get(name)
                    .ok_or_else(|| SourceError::UnresolvedPlaceholder {
                        source_id: self.id.clone(),
                        name: name.to_string(),
                    })?;
            resolved.push_str(value);
            rest = &after[close + 1..];
        }
        resolved.push_str(rest);

        Ok(resolved)
    }

    /// Reject a zero polling period or timeout.
    pub fn check_durations(&self) -> Result<(), SourceError> {
        let zero = |field| SourceError::ZeroDuration {
            source_id: self.id.clone(),
            field,
        };
        if self.cadence.period().is_zero() {
            return Err(zero(if self.cadence.is_once() {
                "retry interval"
            } else {
                "interval"
            }));
        }
        if self.timeout.is_zero() {
            return Err(zero("timeout"));
        }
        Ok(())
    }

    /// Absolute URL of this source under `base_url`.
    pub fn url(&self, base_url: &str) -> Result<Url, SourceError> {
        let path = self.resolve_path()?;
        let joined = if path.starts_with('/') {
            format!("{}{}", base_url.trim_end_matches('/'), path)
        } else {
            format!("{}/{}", base_url.trim_end_matches('/'), path)
        };

        Url::parse(&joined).map_err(|e| SourceError::InvalidUrl {
            source_id: self.id.clone(),
            message: e.to_string(),
        })
    }
}

/// The stock registrations: one source per endpoint, and one
/// support/resistance source per default (interval, unit) tuple.
pub fn default_sources(timeout: Duration) -> Vec<Source> {
    let mut sources = vec![
        Source::new("option_chain", SourceKind::OptionChain),
        Source::new("current_price", SourceKind::CurrentPrice),
        Source::new("previous_day", SourceKind::PreviousDay),
        Source::new("stoch_rsi", SourceKind::StochRsi),
    ];

    for (interval, unit) in DEFAULT_SUPPORT_RESISTANCE_TUPLES {
        sources.push(
            Source::new(
                format!("support_resistance_{interval}{unit}"),
                SourceKind::SupportResistance,
            )
            .with_param("interval", interval.to_string())
            .with_param("unit", unit),
        );
    }

    sources
        .into_iter()
        .map(|s| s.with_timeout(timeout))
        .collect()
}
