//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, plus the inbound HTTP and WebSocket
//! adapters.

/// Offline quote synthesis backend.
pub mod mock;

/// HTTP-backed quote backend.
pub mod live;

/// REST routes and server lifecycle.
pub mod http;

/// WebSocket quote push.
pub mod websocket;

/// Configuration and dependency injection.
pub mod config;

/// Health check HTTP endpoint.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// OpenTelemetry tracing integration.
pub mod telemetry;
