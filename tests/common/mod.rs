//! Shared test utilities for oiwatch integration tests.
//!
//! Provides canned backend payloads, wiremock mounting helpers, and a
//! polling wait for store conditions.

#![allow(dead_code)]

use axum::body::Body;
use futures::StreamExt;
use oiwatch::orchestrator::Snapshot;
use oiwatch::source::{Cadence, Source, SourceKind};
use oiwatch::store::Store;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Payloads
// =============================================================================

pub fn price_body(ltp: f64) -> Value {
    json!({"ltp": ltp, "change": 12.5, "change_percent": 0.06})
}

pub fn option_chain_body() -> Value {
    json!({
        "Nifty Price": 21480.25,
        "pcr": 0.91,
        "calls": [
            {"strike_price": 21400.0, "latest_oi": 120000.0, "oi_change": 1500.0, "ltp": 140.0},
            {"strike_price": 21500.0, "latest_oi": 185000.0, "oi_change": -800.0, "ltp": 82.5}
        ],
        "puts": [
            {"strike_price": 21400.0, "latest_oi": 160000.0, "oi_change": 2200.0, "ltp": 61.0},
            {"strike_price": 21500.0, "latest_oi": 98000.0, "oi_change": 300.0, "ltp": 103.0}
        ],
        "Call OI Change": 700.0,
        "Put OI Change": 2500.0
    })
}

pub fn previous_day_body() -> Value {
    json!({"open": 21350.0, "high": 21520.0, "low": 21290.5, "close": 21460.0, "date": "2024-01-04"})
}

pub fn stoch_rsi_body() -> Value {
    json!({"stochrsi": 0.42, "k": 0.45, "d": 0.39, "signal": "neutral"})
}

pub fn support_resistance_body() -> Value {
    json!({
        "supports": [["2024-01-02", 21300.0], ["2024-01-03", 21210.0]],
        "resistances": [["2024-01-04", 21600.0]],
        "trade_zone": "21300 - 21600"
    })
}

// =============================================================================
// Mock backend
// =============================================================================

/// Serve `body` with status 200 on GET `route`.
pub async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serve `status` with a plain-text body on GET `route`.
pub async fn mount_status(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Mount a healthy response for every stock endpoint.
pub async fn mount_all_endpoints(server: &MockServer) {
    mount_json(server, "/api/oi_data", option_chain_body()).await;
    mount_json(server, "/api/nifty_curr", price_body(21475.0)).await;
    mount_json(server, "/api/nifty_previous_day", previous_day_body()).await;
    mount_json(server, "/stochrsi_nifty50_5m", stoch_rsi_body()).await;
    mount_json(server, "/support_resistance", support_resistance_body()).await;
}

/// Number of requests the mock server received on `route`.
pub async fn request_count(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}

// =============================================================================
// Sources
// =============================================================================

/// Source polled every `interval`, with a short timeout.
pub fn fast_source(id: &str, kind: SourceKind, interval: Duration) -> Source {
    Source::new(id, kind)
        .with_cadence(Cadence::Every(interval))
        .with_timeout(Duration::from_secs(2))
}

/// The stock registrations polled fast enough for tests.
pub fn fast_default_sources() -> Vec<Source> {
    oiwatch::source::default_sources(Duration::from_secs(2))
        .into_iter()
        .map(|s| {
            let cadence = match s.cadence {
                Cadence::Every(_) => Cadence::Every(Duration::from_millis(500)),
                Cadence::Once { .. } => Cadence::Once {
                    retry: Duration::from_millis(500),
                },
            };
            s.with_cadence(cadence)
        })
        .collect()
}

// =============================================================================
// Waiting
// =============================================================================

/// Poll the store until `predicate` holds or `timeout` passes.
pub async fn wait_for<F>(store: &Arc<Store>, timeout: Duration, predicate: F) -> Arc<Snapshot>
where
    F: Fn(&Snapshot) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let snapshot = store.get();
        if predicate(snapshot.as_ref()) || tokio::time::Instant::now() >= deadline {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

// =============================================================================
// HTTP bodies
// =============================================================================

/// Read a response body as a string.
pub async fn body_to_string(body: Body) -> String {
    let mut body_stream = body.into_data_stream();
    let mut result = String::new();
    while let Some(chunk) = body_stream.next().await {
        if let Ok(bytes) = chunk {
            result.push_str(&String::from_utf8_lossy(&bytes));
        }
    }
    result
}

pub async fn body_to_json(body: Body) -> Value {
    serde_json::from_str(&body_to_string(body).await).expect("response body is JSON")
}
