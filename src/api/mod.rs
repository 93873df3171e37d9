//! # Read API
//!
//! HTTP endpoints exposing the view-state store to dashboards and scrapers.
//!
//! ## Endpoints
//!
//! - `GET /api/snapshot` - Current snapshot with per-source status
//! - `GET /api/sources/:id` - State of one source
//! - `GET /health` - Overall status with per-status source counts
//! - `GET /metrics` - Prometheus text exposition
//!
//! ## Example
//!
//! ```no_run
//! use oiwatch::api::{create_router, AppState};
//! use oiwatch::store::Store;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(Store::new());
//! let state = Arc::new(AppState::new(store));
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8700").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Errors are returned as `{"error": "<message>"}` with a matching status code.

mod health;
mod snapshot;
pub mod types;

pub use types::*;

use crate::metrics::MetricsCollector;
use crate::store::Store;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub store: Arc<Store>,
    pub metrics_collector: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(store: Arc<Store>) -> Self {
        // A recorder may already be installed (tests, or a second server in
        // the same process); fall back to a detached handle.
        let prometheus_handle = crate::metrics::setup_metrics().unwrap_or_else(|e| {
            tracing::debug!("Metrics already initialized, creating new handle: {}", e);
            PrometheusBuilder::new().build_recorder().handle()
        });

        // Uptime is measured from here
        let metrics_collector = Arc::new(MetricsCollector::new(
            Arc::clone(&store),
            Instant::now(),
            prometheus_handle,
        ));

        Self {
            store,
            metrics_collector,
        }
    }
}

/// Create the read API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/snapshot", get(snapshot::get_snapshot))
        .route("/api/sources/:id", get(snapshot::get_source))
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .fallback(handle_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn handle_not_found() -> ApiError {
    ApiError::not_found("no such endpoint")
}
