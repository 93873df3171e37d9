//! Snapshot command implementation

use crate::cli::output::{format_snapshot_json, format_snapshot_table};
use crate::cli::serve::{build_orchestrator, load_config};
use crate::cli::SnapshotArgs;
use crate::config::WatcherConfig;
use crate::logging::init_tracing;
use crate::orchestrator::{OverallStatus, Snapshot};
use crate::store::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Load configuration with CLI overrides
pub fn load_snapshot_config(
    args: &SnapshotArgs,
) -> Result<WatcherConfig, Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;

    if let Some(ref url) = args.api_url {
        config.backend.base_url = url.clone();
    }
    config.logging.level = args.log_level.clone().unwrap_or_else(|| "warn".to_string());

    Ok(config)
}

/// Wait until the snapshot leaves `Loading`, or `deadline` passes.
///
/// Returns whichever snapshot is current at that point.
pub async fn wait_for_settled(store: &Arc<Store>, deadline: Duration) -> Arc<Snapshot> {
    let (tx, mut rx) = watch::channel(0u64);
    let _subscription = store.subscribe(move |snapshot: &Snapshot| {
        tx.send_replace(snapshot.version);
    });

    let settled = async {
        loop {
            let snapshot = store.get();
            if snapshot.overall_status != OverallStatus::Loading {
                return snapshot;
            }
            if rx.changed().await.is_err() {
                return snapshot;
            }
        }
    };

    match tokio::time::timeout(deadline, settled).await {
        Ok(snapshot) => snapshot,
        Err(_) => {
            tracing::warn!(
                wait_seconds = deadline.as_secs(),
                "Sources still loading at deadline"
            );
            store.get()
        }
    }
}

/// Handle `oiwatch snapshot`; returns the overall status printed.
pub async fn run_snapshot(args: SnapshotArgs) -> Result<OverallStatus, Box<dyn std::error::Error>> {
    let config = load_snapshot_config(&args)?;
    config.validate()?;
    init_tracing(&config.logging)?;

    let orchestrator = build_orchestrator(&config)?;
    orchestrator.start_all()?;

    let snapshot = wait_for_settled(&orchestrator.store(), Duration::from_secs(args.wait)).await;
    orchestrator.stop_all().await;

    let output = if args.json {
        format_snapshot_json(&snapshot)?
    } else {
        format_snapshot_table(&snapshot)
    };
    println!("{}", output);

    Ok(snapshot.overall_status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Orchestrator;
    use crate::source::{Cadence, Source, SourceKind};
    use crate::transport::mock::ScriptedTransport;
    use crate::transport::FetchError;
    use serde_json::json;

    fn orchestrator_for(transport: Arc<ScriptedTransport>) -> Orchestrator {
        let orchestrator = Orchestrator::new("http://backend.test", transport);
        for id in ["a", "b"] {
            orchestrator
                .register(
                    Source::new(id, SourceKind::CurrentPrice)
                        .with_path(format!("/{id}"))
                        .with_cadence(Cadence::Every(Duration::from_secs(60))),
                )
                .unwrap();
        }
        orchestrator
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_once_all_sources_settle() {
        let transport = ScriptedTransport::new();
        transport.push_ok("/a", json!({"ltp": 1.0}));
        transport.push("/b", Duration::from_secs(3), Ok(json!({"ltp": 2.0})));

        let orchestrator = orchestrator_for(transport);
        orchestrator.start_all().unwrap();

        let snapshot = wait_for_settled(&orchestrator.store(), Duration::from_secs(30)).await;
        assert_eq!(snapshot.overall_status, OverallStatus::Healthy);
        assert!(snapshot.is_settled());

        orchestrator.stop_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_gives_up_at_deadline() {
        let transport = ScriptedTransport::new();
        transport.push_ok("/a", json!({"ltp": 1.0}));
        transport.push("/b", Duration::from_secs(50), Ok(json!({"ltp": 2.0})));

        let orchestrator = orchestrator_for(transport);
        orchestrator.start_all().unwrap();

        let snapshot = wait_for_settled(&orchestrator.store(), Duration::from_secs(5)).await;
        assert_eq!(snapshot.overall_status, OverallStatus::Loading);
        assert_eq!(
            snapshot.status_of("a"),
            Some(crate::poller::SourceStatus::Live)
        );

        orchestrator.stop_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_reports_unreachable() {
        let transport = ScriptedTransport::new();
        transport.push_err("/a", FetchError::Unreachable("refused".into()));
        transport.push_err("/b", FetchError::Unreachable("refused".into()));

        let orchestrator = orchestrator_for(transport);
        orchestrator.start_all().unwrap();

        let snapshot = wait_for_settled(&orchestrator.store(), Duration::from_secs(30)).await;
        assert_eq!(snapshot.overall_status, OverallStatus::Unreachable);

        orchestrator.stop_all().await;
    }

    #[test]
    fn test_snapshot_defaults_to_warn_logging() {
        let args = SnapshotArgs {
            config: "nonexistent.toml".into(),
            api_url: Some("http://10.1.1.1:5000".into()),
            json: false,
            wait: 1,
            log_level: None,
        };
        let config = load_snapshot_config(&args).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.backend.base_url, "http://10.1.1.1:5000");
    }
}
