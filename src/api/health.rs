//! Health check endpoint handler.

use crate::api::AppState;
use crate::orchestrator::OverallStatus;
use crate::poller::SourceStatus;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: OverallStatus,
    /// Version of the snapshot this was computed from
    pub version: u64,
    pub uptime_seconds: u64,
    pub sources: SourceCounts,
    pub last_update: Option<DateTime<Utc>>,
}

/// Registered sources per status.
#[derive(Debug, Serialize)]
pub struct SourceCounts {
    pub total: usize,
    pub live: usize,
    pub stale: usize,
    pub loading: usize,
    pub unreachable: usize,
}

/// GET /health - 503 while every source is unreachable, 200 otherwise.
pub async fn handle(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let snapshot = state.store.get();
    let counts = snapshot.status_counts();
    let count = |status: SourceStatus| counts.get(&status).copied().unwrap_or(0);

    let code = if snapshot.overall_status == OverallStatus::Unreachable {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let body = HealthResponse {
        status: snapshot.overall_status,
        version: snapshot.version,
        uptime_seconds: state.metrics_collector.uptime_seconds(),
        sources: SourceCounts {
            total: snapshot.sources.len(),
            live: count(SourceStatus::Live),
            stale: count(SourceStatus::Stale),
            loading: count(SourceStatus::Loading),
            unreachable: count(SourceStatus::Unreachable),
        },
        last_update: snapshot.last_update,
    };

    (code, Json(body))
}
