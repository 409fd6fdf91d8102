//! Market Gateway Binary
//!
//! Starts the HTTP and WebSocket market gateway.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin market-gateway
//! ```
//!
//! # Environment Variables
//!
//! - `PORT`: HTTP port (default: 4000)
//! - `USE_LIVE_GATEWAY`: "true" proxies the remote gateway; anything else simulates quotes
//! - `TOPSTEP_GATEWAY_URL`: Remote gateway base URL (default: <https://api.topstepx.io>)
//! - `TOPSTEP_GATEWAY_KEY`: Remote gateway API key (default: none)
//! - `MOCK_STREAM_INTERVAL_MS`: Simulated stream interval (default: 2000)
//! - `MOCK_STREAM_CAPACITY`: Quotes buffered per WebSocket client (default: 64)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: market-gateway)
//! - `RUST_LOG`: Log filter (default: `market_gateway=info`)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use market_gateway::infrastructure::telemetry;
use market_gateway::{
    AppState, GatewayConfig, HttpServer, SessionStore, build_gateway, init_metrics,
};
use tokio::signal;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // Initialize telemetry (tracing + optional OpenTelemetry)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting market gateway");

    // Initialize Prometheus metrics
    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Metrics recorder unavailable");
    }

    let config = GatewayConfig::from_env()?;
    log_config(&config);

    let gateway = Arc::new(build_gateway(&config)?);
    let sessions = Arc::new(SessionStore::new());
    let state = AppState::new(Arc::clone(&gateway), sessions);
    let shutdown_token = state.shutdown.clone();

    let addr = SocketAddr::from((config.server.host, config.server.port));
    let mut server = tokio::spawn(HttpServer::new(addr, state).run());

    tracing::info!("Market gateway ready");

    tokio::select! {
        () = await_shutdown() => shutdown_token.cancel(),
        result = &mut server => {
            gateway.stop_all();
            result??;
            return Ok(());
        }
    }

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
    gateway.stop_all();

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "HTTP server error"),
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server task failed"),
        Err(_) => tracing::warn!("Graceful shutdown timed out"),
    }

    tracing::info!("Market gateway stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &GatewayConfig) {
    tracing::info!(
        mode = %config.mode,
        port = config.server.port,
        "Configuration loaded"
    );
    tracing::debug!(
        gateway_url = %config.live.base_url,
        credentials = ?config.live.credentials,
        stream_interval_ms = config.mock.interval.as_millis(),
        stream_capacity = config.mock.capacity,
        "Backend settings"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// A handler that cannot be installed never fires; the other still can.
async fn await_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C handler unavailable");
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
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
