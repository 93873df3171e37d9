//! Snapshot and per-source handlers.

use super::{ApiError, AppState, SnapshotView, SourceView};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

/// GET /api/snapshot
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.store.get();
    Json(SnapshotView::from(snapshot.as_ref())).into_response()
}

/// GET /api/sources/:id
pub async fn get_source(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let snapshot = state.store.get();
    let source = snapshot
        .source(&id)
        .ok_or_else(|| ApiError::not_found(format!("unknown source '{}'", id)))?;

    Ok(Json(SourceView::new(&id, source)).into_response())
}
