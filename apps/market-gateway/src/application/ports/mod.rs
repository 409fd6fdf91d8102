//! Port Interfaces
//!
//! Contracts that infrastructure adapters implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `MarketDataPort`: quote source, either simulated or HTTP-backed
//! - `StreamControl`: lifecycle of a running quote emitter

mod market_data_port;

pub use market_data_port::{
    GatewayError, GatewayMode, MarketDataPort, MarketPayload, QuoteStream, StreamControl,
    StreamId,
};
