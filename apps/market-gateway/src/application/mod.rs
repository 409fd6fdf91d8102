//! Application Layer - Use cases and port definitions.
//!
//! The gateway facade and the port its backends implement.

/// Port interfaces for market data backends.
pub mod ports;

/// Application services.
pub mod services;
