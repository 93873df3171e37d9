//! # Metrics Collection Module
//!
//! Prometheus export of poller activity.
//!
//! ## Metrics Tracked
//!
//! **Counters:**
//! - `oiwatch_fetch_total{source, outcome}` - Fetches by outcome (`success` or an error kind)
//! - `oiwatch_skipped_ticks_total{source}` - Ticks skipped while a fetch was in flight
//!
//! **Histograms:**
//! - `oiwatch_fetch_duration_seconds{source}` - Fetch duration, including decode
//!
//! **Gauges:**
//! - `oiwatch_sources{status}` - Registered sources per status
//! - `oiwatch_snapshot_version` - Version of the latest snapshot

pub mod handler;

use crate::orchestrator::Snapshot;
use crate::poller::SourceStatus;
use crate::store::Store;
use crate::transport::FetchResult;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::{Duration, Instant};

const STATUSES: [SourceStatus; 4] = [
    SourceStatus::Loading,
    SourceStatus::Live,
    SourceStatus::Stale,
    SourceStatus::Unreachable,
];

/// Renders Prometheus text with gauges refreshed from the store.
pub struct MetricsCollector {
    store: Arc<Store>,
    start_time: Instant,
    prometheus_handle: PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(store: Arc<Store>, start_time: Instant, prometheus_handle: PrometheusHandle) -> Self {
        Self {
            store,
            start_time,
            prometheus_handle,
        }
    }

    /// Refresh snapshot-derived gauges from the current snapshot.
    pub fn update_source_gauges(&self) {
        update_source_gauges(&self.store.get());
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Record one settled fetch.
pub fn record_fetch<T>(source_id: &str, result: &FetchResult<T>, elapsed: Duration) {
    let outcome = match result.error_kind() {
        Some(kind) => kind.as_str(),
        None => "success",
    };

    metrics::counter!(
        "oiwatch_fetch_total",
        "source" => source_id.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "oiwatch_fetch_duration_seconds",
        "source" => source_id.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_skipped_tick(source_id: &str) {
    metrics::counter!("oiwatch_skipped_ticks_total", "source" => source_id.to_string())
        .increment(1);
}

pub fn update_source_gauges(snapshot: &Snapshot) {
    let counts = snapshot.status_counts();
    for status in STATUSES {
        let count = counts.get(&status).copied().unwrap_or(0);
        metrics::gauge!("oiwatch_sources", "status" => status.as_str()).set(count as f64);
    }
    metrics::gauge!("oiwatch_snapshot_version").set(snapshot.version as f64);
}

/// Initialize Prometheus metrics exporter with custom histogram buckets.
///
/// Buckets span fast cached responses up to the 60 s default timeout.
pub fn setup_metrics() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

    let duration_buckets = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("oiwatch_fetch_duration_seconds".to_string()),
            duration_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transport::FetchError;
    use std::sync::{Mutex, Once};

    static INIT: Once = Once::new();
    static TEST_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

    pub(crate) fn get_test_handle() -> PrometheusHandle {
        INIT.call_once(|| {
            // build_recorder does not need a runtime
            let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
            *TEST_HANDLE.lock().unwrap() = Some(recorder.handle());
            metrics::set_global_recorder(Box::new(recorder)).ok();
        });

        TEST_HANDLE.lock().unwrap().as_ref().unwrap().clone()
    }

    #[test]
    fn test_record_fetch_counts_outcomes() {
        let handle = get_test_handle();

        record_fetch("metrics_test_a", &FetchResult::success(1), Duration::from_millis(20));
        record_fetch(
            "metrics_test_a",
            &FetchResult::<u32>::failure(FetchError::Timeout(Duration::from_secs(60))),
            Duration::from_secs(60),
        );

        let rendered = handle.render();
        assert!(rendered.contains("oiwatch_fetch_total"));
        assert!(rendered.contains("source=\"metrics_test_a\""));
        assert!(rendered.contains("outcome=\"success\""));
        assert!(rendered.contains("outcome=\"timeout\""));
        assert!(rendered.contains("oiwatch_fetch_duration_seconds"));
    }

    #[test]
    fn test_record_skipped_tick() {
        let handle = get_test_handle();
        record_skipped_tick("metrics_test_b");
        assert!(handle
            .render()
            .contains("oiwatch_skipped_ticks_total{source=\"metrics_test_b\"}"));
    }

    #[test]
    fn test_collector_updates_gauges() {
        let handle = get_test_handle();
        let store = Arc::new(Store::new());
        let collector = MetricsCollector::new(store, Instant::now(), handle);

        collector.update_source_gauges();
        let rendered = collector.render_metrics();

        assert!(rendered.contains("oiwatch_sources{status=\"live\"}"));
        assert!(rendered.contains("oiwatch_snapshot_version"));
        assert!(collector.uptime_seconds() < 5);
    }
}
