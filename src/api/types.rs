//! Response types for the read API.

use crate::orchestrator::{OverallStatus, Snapshot};
use crate::poller::{SourceState, SourceStatus};
use crate::source::Payload;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One source as served to clients: its derived status plus the raw state.
#[derive(Debug, Serialize)]
pub struct SourceView<'a> {
    pub id: &'a str,
    pub status: SourceStatus,
    #[serde(flatten)]
    pub state: &'a SourceState<Payload>,
}

impl<'a> SourceView<'a> {
    pub fn new(id: &'a str, state: &'a SourceState<Payload>) -> Self {
        Self {
            id,
            status: state.status(),
            state,
        }
    }
}

/// Response body for `GET /api/snapshot`.
#[derive(Debug, Serialize)]
pub struct SnapshotView<'a> {
    pub version: u64,
    pub published_at: DateTime<Utc>,
    pub overall_status: OverallStatus,
    pub last_update: Option<DateTime<Utc>>,
    /// A fetch is outstanding on at least one source
    pub is_loading: bool,
    pub sources: BTreeMap<&'a str, SourceView<'a>>,
}

impl<'a> From<&'a Snapshot> for SnapshotView<'a> {
    fn from(snapshot: &'a Snapshot) -> Self {
        Self {
            version: snapshot.version,
            published_at: snapshot.published_at,
            overall_status: snapshot.overall_status,
            last_update: snapshot.last_update,
            is_loading: snapshot.is_loading(),
            sources: snapshot
                .sources
                .iter()
                .map(|(id, state)| (id.as_str(), SourceView::new(id, state)))
                .collect(),
        }
    }
}

/// Error response: `{"error": "<message>"}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip)]
    status: StatusCode,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
