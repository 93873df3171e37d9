//! Per-source configuration

use crate::source::{Cadence, Source, SourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One `[[sources]]` entry.
///
/// Omitted fields fall back to the defaults of `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub kind: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Polling interval, or the retry interval when `once` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub once: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl SourceConfig {
    /// Build the source, using `default_timeout` when none is configured.
    pub fn to_source(&self, default_timeout: Duration) -> Source {
        let defaults = self.kind.default_cadence();
        let once = self.once.unwrap_or(defaults.is_once());
        let period = self
            .interval_seconds
            .map(Duration::from_secs)
            .unwrap_or(defaults.period());
        let cadence = if once {
            Cadence::Once { retry: period }
        } else {
            Cadence::Every(period)
        };

        let mut source = Source::new(&self.id, self.kind)
            .with_cadence(cadence)
            .with_timeout(
                self.timeout_seconds
                    .map(Duration::from_secs)
                    .unwrap_or(default_timeout),
            );
        if let Some(path) = &self.path {
            source = source.with_path(path);
        }
        for (name, value) in &self.params {
            source = source.with_param(name, value);
        }
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_entry_uses_kind_defaults() {
        let config: SourceConfig = toml::from_str(
            r#"
            id = "price"
            kind = "current_price"
            "#,
        )
        .unwrap();

        let source = config.to_source(Duration::from_secs(45));
        assert_eq!(source.path, "/api/nifty_curr");
        assert_eq!(source.cadence, Cadence::Every(Duration::from_secs(60)));
        assert_eq!(source.timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_full_entry_overrides_defaults() {
        let config: SourceConfig = toml::from_str(
            r#"
            id = "sr_5m"
            kind = "support_resistance"
            interval_seconds = 10
            once = true
            timeout_seconds = 5

            [params]
            interval = "5"
            unit = "minute"
            "#,
        )
        .unwrap();

        let source = config.to_source(Duration::from_secs(60));
        assert_eq!(
            source.cadence,
            Cadence::Once {
                retry: Duration::from_secs(10)
            }
        );
        assert_eq!(source.timeout, Duration::from_secs(5));
        assert_eq!(
            source.resolve_path().unwrap(),
            "/support_resistance?interval=5&unit=minute"
        );
    }

    #[test]
    fn test_once_false_turns_default_once_into_interval() {
        let config: SourceConfig = toml::from_str(
            r#"
            id = "prev"
            kind = "previous_day"
            path = "/api/v1/previous-day"
            once = false
            "#,
        )
        .unwrap();

        let source = config.to_source(Duration::from_secs(60));
        assert_eq!(source.cadence, Cadence::Every(Duration::from_secs(30)));
        assert_eq!(source.path, "/api/v1/previous-day");
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result: Result<SourceConfig, _> = toml::from_str(
            r#"
            id = "x"
            kind = "volume_profile"
            "#,
        );
        assert!(result.is_err());
    }
}
