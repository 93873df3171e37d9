//! Serve command implementation

use crate::api::{create_router, AppState};
use crate::cli::ServeArgs;
use crate::config::WatcherConfig;
use crate::logging::init_tracing;
use crate::orchestrator::Orchestrator;
use crate::transport::HttpTransport;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Load the config file if present, else defaults, then apply `OIWATCH_*`
/// environment overrides.
pub fn load_config(path: &Path) -> Result<WatcherConfig, Box<dyn std::error::Error>> {
    let config = if path.exists() {
        WatcherConfig::load(Some(path))?
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        WatcherConfig::default()
    };

    Ok(config.with_env_overrides())
}

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ServeArgs,
) -> Result<WatcherConfig, Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;

    // CLI overrides (highest priority)
    if let Some(ref url) = args.api_url {
        config.backend.base_url = url.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}

/// Build an orchestrator with every configured source registered.
pub fn build_orchestrator(
    config: &WatcherConfig,
) -> Result<Orchestrator, Box<dyn std::error::Error>> {
    let transport = Arc::new(HttpTransport::new()?);
    let orchestrator = Orchestrator::new(config.backend.base_url.clone(), transport);

    for source in config.resolved_sources() {
        orchestrator.register(source)?;
    }

    Ok(orchestrator)
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
pub async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
        _ = cancel_token.cancelled() => {}
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load, merge and validate configuration
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;

    tracing::info!(backend = %config.backend.base_url, "Starting oiwatch");
    tracing::debug!(?config, "Loaded configuration");

    // 3. Register sources and start polling
    let orchestrator = build_orchestrator(&config)?;
    let started = orchestrator.start_all()?;
    tracing::info!(sources = started, "Polling started");

    // 4. Bind and serve the read API
    let state = Arc::new(AppState::new(orchestrator.store()));
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Read API listening");

    let cancel_token = CancellationToken::new();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await;

    // 5. Cleanup; pollers stop even if the server failed
    orchestrator.stop_all().await;
    served?;

    tracing::info!("oiwatch stopped");
    Ok(())
}
