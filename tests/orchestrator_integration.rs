//! End-to-end polling against a mock backend over real HTTP.

mod common;

use oiwatch::orchestrator::{Orchestrator, OverallStatus};
use oiwatch::poller::SourceStatus;
use oiwatch::source::SourceKind;
use oiwatch::transport::{ErrorKind, HttpTransport};
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

fn orchestrator(server: &MockServer) -> Orchestrator {
    Orchestrator::new(server.uri(), Arc::new(HttpTransport::new().unwrap()))
}

#[tokio::test]
async fn test_all_endpoints_healthy() {
    let server = MockServer::start().await;
    common::mount_all_endpoints(&server).await;

    let orchestrator = orchestrator(&server);
    for source in common::fast_default_sources() {
        orchestrator.register(source).unwrap();
    }
    assert_eq!(orchestrator.start_all().unwrap(), 7);

    let store = orchestrator.store();
    let snapshot = common::wait_for(&store, Duration::from_secs(5), |s| {
        s.overall_status == OverallStatus::Healthy
    })
    .await;
    orchestrator.stop_all().await;

    assert_eq!(snapshot.overall_status, OverallStatus::Healthy);
    assert_eq!(snapshot.sources.len(), 7);
    assert!(snapshot.last_update.is_some());

    let price = snapshot.source("current_price").unwrap();
    let ltp = price
        .last_success
        .as_ref()
        .and_then(|p| p.as_current_price())
        .map(|p| p.ltp);
    assert_eq!(ltp, Some(21475.0));

    let levels = snapshot
        .source("support_resistance_1day")
        .and_then(|s| s.last_success.as_ref())
        .and_then(|p| p.as_support_resistance())
        .unwrap();
    assert_eq!(levels.supports.len(), 2);
}

#[tokio::test]
async fn test_failing_endpoint_degrades_snapshot() {
    let server = MockServer::start().await;
    common::mount_json(&server, "/api/nifty_curr", common::price_body(21475.0)).await;
    common::mount_status(&server, "/api/oi_data", 500, "upstream exploded").await;

    let orchestrator = orchestrator(&server);
    orchestrator
        .register(common::fast_source(
            "current_price",
            SourceKind::CurrentPrice,
            Duration::from_millis(200),
        ))
        .unwrap();
    orchestrator
        .register(common::fast_source(
            "option_chain",
            SourceKind::OptionChain,
            Duration::from_millis(200),
        ))
        .unwrap();
    orchestrator.start_all().unwrap();

    let store = orchestrator.store();
    let snapshot = common::wait_for(&store, Duration::from_secs(5), |s| {
        s.overall_status == OverallStatus::Degraded
    })
    .await;
    orchestrator.stop_all().await;

    assert_eq!(snapshot.overall_status, OverallStatus::Degraded);
    assert_eq!(snapshot.status_of("current_price"), Some(SourceStatus::Live));
    assert_eq!(
        snapshot.status_of("option_chain"),
        Some(SourceStatus::Unreachable)
    );

    let (id, failure) = snapshot.failures().next().unwrap();
    assert_eq!(id, "option_chain");
    assert_eq!(
        failure.error_kind(),
        Some(ErrorKind::ServerError { status: 500 })
    );
}

#[tokio::test]
async fn test_unreachable_backend() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let orchestrator = Orchestrator::new(
        format!("http://127.0.0.1:{}", port),
        Arc::new(HttpTransport::new().unwrap()),
    );
    orchestrator
        .register(common::fast_source(
            "current_price",
            SourceKind::CurrentPrice,
            Duration::from_millis(200),
        ))
        .unwrap();
    orchestrator.start_all().unwrap();

    let store = orchestrator.store();
    let snapshot = common::wait_for(&store, Duration::from_secs(5), |s| {
        s.overall_status == OverallStatus::Unreachable
    })
    .await;
    orchestrator.stop_all().await;

    assert_eq!(snapshot.overall_status, OverallStatus::Unreachable);
    let state = snapshot.source("current_price").unwrap();
    assert!(state.last_success.is_none());
    assert!(state.consecutive_failures >= 1);
}

#[tokio::test]
async fn test_stop_all_halts_requests() {
    let server = MockServer::start().await;
    common::mount_json(&server, "/api/nifty_curr", common::price_body(21475.0)).await;

    let orchestrator = orchestrator(&server);
    orchestrator
        .register(common::fast_source(
            "current_price",
            SourceKind::CurrentPrice,
            Duration::from_millis(100),
        ))
        .unwrap();
    orchestrator.start_all().unwrap();

    let store = orchestrator.store();
    common::wait_for(&store, Duration::from_secs(5), |s| {
        s.status_of("current_price") == Some(SourceStatus::Live)
    })
    .await;
    orchestrator.stop_all().await;
    // Let a request detached at stop reach the server
    tokio::time::sleep(Duration::from_millis(100)).await;

    let version_at_stop = store.get().version;
    let requests_at_stop = common::request_count(&server, "/api/nifty_curr").await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(!orchestrator.is_running());
    assert_eq!(store.get().version, version_at_stop);
    assert_eq!(
        common::request_count(&server, "/api/nifty_curr").await,
        requests_at_stop
    );
}

#[tokio::test]
async fn test_once_source_stops_after_success() {
    let server = MockServer::start().await;
    common::mount_json(&server, "/api/nifty_previous_day", common::previous_day_body()).await;

    let orchestrator = orchestrator(&server);
    let source = oiwatch::source::Source::new("previous_day", SourceKind::PreviousDay)
        .with_cadence(oiwatch::source::Cadence::Once {
            retry: Duration::from_millis(100),
        })
        .with_timeout(Duration::from_secs(2));
    orchestrator.register(source).unwrap();
    orchestrator.start_all().unwrap();

    let store = orchestrator.store();
    common::wait_for(&store, Duration::from_secs(5), |s| {
        s.status_of("previous_day") == Some(SourceStatus::Live)
    })
    .await;
    tokio::time::sleep(Duration::from_millis(400)).await;
    orchestrator.stop_all().await;

    assert_eq!(
        common::request_count(&server, "/api/nifty_previous_day").await,
        1
    );
}
