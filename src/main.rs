//! Companion Worker - HTTP host for the Security Companion worker
//!
//! Installs and activates the worker at startup, then serves platform events
//! and proxies page requests through the cache-first interceptor.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use companion_worker::api::create_router;
use companion_worker::{AppState, Config, EventOutcome, WorkerEvent};

/// Main entry point for the worker host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the worker against the upstream network
/// 4. Dispatch install and activate
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "companion_worker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Companion Worker");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_version={}, app_origin={}, upstream={}, port={}, fetch_timeout={}ms",
        config.worker.cache_version,
        config.worker.app_origin,
        config.upstream_origin,
        config.server_port,
        config.worker.fetch_timeout.as_millis()
    );

    let state = AppState::from_config(&config);

    // Worker lifecycle: install then activate immediately
    if let EventOutcome::Installed(report) = state
        .worker
        .dispatch(WorkerEvent::Install)
        .await
        .context("worker installation failed")?
    {
        if !report.is_complete() {
            warn!(
                "{} of {} manifest resources could not be cached",
                report.failed.len(),
                report.failed.len() + report.cached.len()
            );
        }
    }
    state
        .worker
        .dispatch(WorkerEvent::Activate)
        .await
        .context("worker activation failed")?;

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
