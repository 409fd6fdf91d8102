#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Market Gateway - Futures Desk Backend
//!
//! An HTTP and WebSocket service serving quotes for seven front-month
//! futures contracts, either synthesized locally or proxied from a remote
//! gateway, plus an in-memory store of per-user trading context.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure types and rules
//!   - `instrument`: The supported futures codes and their baselines
//!   - `quote`: Deterministic quote synthesis
//!   - `session`: Risk profiles, decision history and the session store
//!   - `clock`: Injectable time source
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: `MarketDataPort` and the quote stream handle
//!   - `services`: `MarketGateway` facade and stream registry
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `mock`: Offline backend and timer-driven streams
//!   - `live`: HTTP-backed backend
//!   - `http`: REST routes and server lifecycle
//!   - `websocket`: Quote push over WebSocket
//!   - `config`: Configuration and dependency injection
//!   - `health`, `metrics`, `telemetry`: Operational endpoints and logging
//!
//! # Data Flow
//!
//! ```text
//!                        ┌───────────────┐
//! REST client ──────────►│               │──► MockMarketData ──► MockStream (timer)
//!                        │ MarketGateway │                            │
//! WebSocket client ◄────►│               │──► LiveMarketData ──► remote gateway
//!        ▲               └───────────────┘                            │
//!        └──────────────────── quotes (bounded channel) ◄─────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core market and session types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::instrument::{InstrumentSymbol, UnsupportedSymbol};
pub use domain::quote::{Quote, Snapshot};
pub use domain::session::{Session, SessionError, SessionPatch, SessionStore};

// Application
pub use application::ports::{
    GatewayError, GatewayMode, MarketDataPort, MarketPayload, QuoteStream, StreamId,
};
pub use application::services::MarketGateway;

// Infrastructure config
pub use infrastructure::config::{
    ApiCredentials, ConfigError, GatewayConfig, LiveSettings, MockStreamSettings, ServerSettings,
    build_gateway,
};

// HTTP server
pub use infrastructure::http::{AppState, HttpServer, ServerError, create_router};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
