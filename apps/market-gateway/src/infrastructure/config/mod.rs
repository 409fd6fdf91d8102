//! Configuration Module
//!
//! Configuration loading and dependency injection for the gateway service.

mod settings;

pub use settings::{
    ApiCredentials, ConfigError, DEFAULT_GATEWAY_URL, GatewayConfig, LiveSettings,
    MockStreamSettings, ServerSettings,
};

use crate::application::ports::{GatewayError, GatewayMode, MarketDataPort};
use crate::application::services::MarketGateway;
use crate::infrastructure::live::LiveMarketData;
use crate::infrastructure::mock::MockMarketData;

/// Build the gateway facade over the configured backend.
///
/// # Errors
///
/// Returns `GatewayError` if the live HTTP client cannot be created.
pub fn build_gateway(config: &GatewayConfig) -> Result<MarketGateway, GatewayError> {
    let backend: Box<dyn MarketDataPort> = match config.mode {
        GatewayMode::Mock => Box::new(MockMarketData::new(config.mock.clone())),
        GatewayMode::Live => Box::new(LiveMarketData::new(&config.live)?),
    };

    tracing::info!(mode = %config.mode, "Market data backend selected");
    Ok(MarketGateway::new(backend))
}
