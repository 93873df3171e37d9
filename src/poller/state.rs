//! Per-source state tracking.

use crate::transport::FetchResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived status of a single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// No fetch has settled yet
    Loading,
    /// Last fetch succeeded
    Live,
    /// Last fetch failed; an earlier value is still shown
    Stale,
    /// Last fetch failed and the source never succeeded
    Unreachable,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Loading => "loading",
            SourceStatus::Live => "live",
            SourceStatus::Stale => "stale",
            SourceStatus::Unreachable => "unreachable",
        }
    }

    pub fn is_failing(&self) -> bool {
        matches!(self, SourceStatus::Stale | SourceStatus::Unreachable)
    }
}

/// Tracks fetch state for a single source.
///
/// Written only by the source's own poller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceState<T> {
    /// Most recent successful value; never cleared once set
    pub last_success: Option<T>,
    /// When `last_success` was fetched
    pub last_success_at: Option<DateTime<Utc>>,
    /// Most recent applied result, success or failure
    pub last_result: Option<FetchResult<T>>,
    /// A fetch is currently outstanding
    pub is_in_flight: bool,
    /// Count of consecutive failed fetches
    pub consecutive_failures: u32,
    /// Fetches issued so far; doubles as the sequence of the latest fetch
    pub fetches_started: u64,
    /// Bumped on every transition
    pub revision: u64,
    #[serde(skip)]
    applied_seq: u64,
}

impl<T> Default for SourceState<T> {
    fn default() -> Self {
        Self {
            last_success: None,
            last_success_at: None,
            last_result: None,
            is_in_flight: false,
            consecutive_failures: 0,
            fetches_started: 0,
            revision: 0,
            applied_seq: 0,
        }
    }
}

impl<T: Clone> SourceState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SourceStatus {
        match (&self.last_result, &self.last_success) {
            (None, _) => SourceStatus::Loading,
            (Some(FetchResult::Success { .. }), _) => SourceStatus::Live,
            (Some(FetchResult::Failure { .. }), Some(_)) => SourceStatus::Stale,
            (Some(FetchResult::Failure { .. }), None) => SourceStatus::Unreachable,
        }
    }

    /// Mark a new fetch as in flight and return its sequence number.
    pub fn begin_fetch(&mut self) -> u64 {
        self.fetches_started += 1;
        self.is_in_flight = true;
        self.revision += 1;
        self.fetches_started
    }

    /// Apply the result of fetch `seq`.
    ///
    /// Returns `false` when the result is older than what is already
    /// applied; it is then discarded, though it still clears the in-flight
    /// flag if it settles the latest fetch.
    pub fn apply(&mut self, seq: u64, result: FetchResult<T>) -> bool {
        let settles_latest = self.is_in_flight && seq == self.fetches_started;
        if settles_latest {
            self.is_in_flight = false;
        }

        let newer = seq > self.applied_seq
            && self
                .last_result
                .as_ref()
                .map_or(true, |last| result.timestamp() >= last.timestamp());

        if newer {
            self.applied_seq = seq;
            match &result {
                FetchResult::Success { value, fetched_at } => {
                    self.last_success = Some(value.clone());
                    self.last_success_at = Some(*fetched_at);
                    self.consecutive_failures = 0;
                }
                FetchResult::Failure { .. } => {
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                }
            }
            self.last_result = Some(result);
        }

        if newer || settles_latest {
            self.revision += 1;
        }

        newer
    }
}
