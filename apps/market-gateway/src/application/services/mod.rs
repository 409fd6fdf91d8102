//! Application Services
//!
//! - `MarketGateway`: backend-agnostic quotes, snapshots and stream registry

mod gateway;

pub use gateway::MarketGateway;
