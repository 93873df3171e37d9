//! Immutable aggregate view over all sources.

use crate::poller::{SourceState, SourceStatus};
use crate::source::Payload;
use crate::transport::FetchResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Classification over all registered sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Loading,
    Healthy,
    /// Some sources failing; data from the others is live
    Degraded,
    /// Every source has failed and none ever succeeded
    Unreachable,
}

impl OverallStatus {
    /// Derive the overall status from per-source statuses.
    pub fn from_statuses(statuses: &[SourceStatus]) -> Self {
        if statuses.iter().all(|s| *s == SourceStatus::Loading) {
            return OverallStatus::Loading;
        }

        let ever_succeeded = statuses
            .iter()
            .any(|s| matches!(s, SourceStatus::Live | SourceStatus::Stale));
        let any_loading = statuses.contains(&SourceStatus::Loading);

        if !ever_succeeded {
            return if any_loading {
                OverallStatus::Loading
            } else {
                OverallStatus::Unreachable
            };
        }

        if statuses.iter().any(|s| s.is_failing()) {
            OverallStatus::Degraded
        } else if any_loading {
            OverallStatus::Loading
        } else {
            OverallStatus::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Loading => "loading",
            OverallStatus::Healthy => "healthy",
            OverallStatus::Degraded => "degraded",
            OverallStatus::Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merged view of every source at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Increases by one per publication
    pub version: u64,
    pub published_at: DateTime<Utc>,
    pub overall_status: OverallStatus,
    /// Newest successful fetch across all sources
    pub last_update: Option<DateTime<Utc>>,
    pub sources: BTreeMap<String, SourceState<Payload>>,
}

impl Snapshot {
    /// Snapshot with no sources, before anything is registered.
    pub fn empty() -> Self {
        Self::new(0, BTreeMap::new())
    }

    pub fn new(version: u64, sources: BTreeMap<String, SourceState<Payload>>) -> Self {
        let statuses: Vec<_> = sources.values().map(|s| s.status()).collect();
        let last_update = sources.values().filter_map(|s| s.last_success_at).max();

        Self {
            version,
            published_at: Utc::now(),
            overall_status: OverallStatus::from_statuses(&statuses),
            last_update,
            sources,
        }
    }

    pub fn source(&self, id: &str) -> Option<&SourceState<Payload>> {
        self.sources.get(id)
    }

    pub fn status_of(&self, id: &str) -> Option<SourceStatus> {
        self.sources.get(id).map(|s| s.status())
    }

    /// Any fetch currently outstanding.
    pub fn is_loading(&self) -> bool {
        self.sources.values().any(|s| s.is_in_flight)
    }

    /// Every source has settled at least one fetch.
    pub fn is_settled(&self) -> bool {
        !self.sources.is_empty() && self.sources.values().all(|s| s.last_result.is_some())
    }

    /// Sources whose last result is a failure, with that result.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &FetchResult<Payload>)> {
        self.sources.iter().filter_map(|(id, state)| match &state.last_result {
            Some(result @ FetchResult::Failure { .. }) => Some((id.as_str(), result)),
            _ => None,
        })
    }

    /// Count of sources per status.
    pub fn status_counts(&self) -> BTreeMap<SourceStatus, usize> {
        let mut counts = BTreeMap::new();
        for state in self.sources.values() {
            *counts.entry(state.status()).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
