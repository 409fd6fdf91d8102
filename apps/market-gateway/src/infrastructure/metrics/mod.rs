//! Prometheus Metrics Module
//!
//! Exposes gateway metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Quotes**: Quotes emitted by mock streams and quotes dropped on full channels
//! - **Streams**: Registered streams and open WebSocket connections
//! - **Sessions**: Stored sessions and recorded decisions
//! - **Gateway**: Snapshot requests by mode and backend errors by kind
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the HTTP server.

use std::sync::OnceLock;

use parking_lot::Mutex;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::application::ports::{GatewayError, GatewayMode};
use crate::domain::instrument::InstrumentSymbol;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static INIT_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Initialize the Prometheus metrics recorder.
///
/// Calling this again returns the handle installed the first time.
///
/// # Errors
///
/// Returns `BuildError` if the recorder cannot be installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let _guard = INIT_LOCK.lock();
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    // Quote counters
    describe_counter!(
        "market_gateway_quotes_emitted_total",
        "Total quotes emitted by mock streams"
    );
    describe_counter!(
        "market_gateway_quotes_dropped_total",
        "Total quotes dropped because a subscriber fell behind"
    );

    // Stream gauges
    describe_gauge!(
        "market_gateway_active_streams",
        "Number of registered quote streams"
    );
    describe_gauge!(
        "market_gateway_websocket_connections",
        "Number of open WebSocket connections"
    );

    // Session state
    describe_gauge!("market_gateway_sessions", "Number of stored sessions");
    describe_counter!(
        "market_gateway_decisions_total",
        "Total decisions appended to sessions"
    );

    // Gateway calls
    describe_counter!(
        "market_gateway_snapshots_total",
        "Total snapshot requests by backend mode"
    );
    describe_counter!(
        "market_gateway_errors_total",
        "Total gateway errors by kind"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a quote emitted by a stream.
pub fn record_quote_emitted(symbol: InstrumentSymbol) {
    counter!(
        "market_gateway_quotes_emitted_total",
        "symbol" => symbol.as_str()
    )
    .increment(1);
}

/// Record a quote dropped on a full channel.
pub fn record_quote_dropped(symbol: InstrumentSymbol) {
    counter!(
        "market_gateway_quotes_dropped_total",
        "symbol" => symbol.as_str()
    )
    .increment(1);
}

/// Update the registered stream count.
#[allow(clippy::cast_precision_loss)]
pub fn set_active_streams(count: usize) {
    gauge!("market_gateway_active_streams").set(count as f64);
}

/// A WebSocket connection was opened.
pub fn websocket_connected() {
    gauge!("market_gateway_websocket_connections").increment(1.0);
}

/// A WebSocket connection was closed.
pub fn websocket_disconnected() {
    gauge!("market_gateway_websocket_connections").decrement(1.0);
}

/// Update the stored session count.
#[allow(clippy::cast_precision_loss)]
pub fn set_sessions(count: usize) {
    gauge!("market_gateway_sessions").set(count as f64);
}

/// Record an appended decision.
pub fn record_decision() {
    counter!("market_gateway_decisions_total").increment(1);
}

/// Record a snapshot request.
pub fn record_snapshot(mode: GatewayMode) {
    counter!(
        "market_gateway_snapshots_total",
        "mode" => mode.as_str()
    )
    .increment(1);
}

/// Record a gateway error.
pub fn record_gateway_error(error: &GatewayError) {
    counter!(
        "market_gateway_errors_total",
        "kind" => error.kind()
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================
