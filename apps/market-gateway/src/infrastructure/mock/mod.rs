//! Offline Market Data
//!
//! Backend that synthesizes every quote locally. Snapshots and single quotes
//! are stamped with the clock's current time; streams are timer-driven.

mod stream;

use std::sync::Arc;

use async_trait::async_trait;

pub use stream::MockStream;

use crate::application::ports::{
    GatewayError, GatewayMode, MarketDataPort, MarketPayload, QuoteStream,
};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::instrument::InstrumentSymbol;
use crate::domain::quote::{Quote, Snapshot, synthesize, synthesize_snapshot};
use crate::infrastructure::config::MockStreamSettings;

/// Simulated market data backend.
#[derive(Debug)]
pub struct MockMarketData {
    settings: MockStreamSettings,
    clock: Arc<dyn Clock>,
}

impl MockMarketData {
    /// Create a backend on the system clock.
    #[must_use]
    pub fn new(settings: MockStreamSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create a backend on a specific clock.
    #[must_use]
    pub fn with_clock(settings: MockStreamSettings, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    fn mode(&self) -> GatewayMode {
        GatewayMode::Mock
    }

    async fn fetch_quote(
        &self,
        symbol: InstrumentSymbol,
    ) -> Result<MarketPayload<Quote>, GatewayError> {
        Ok(MarketPayload::Synthesized(synthesize(symbol, self.clock.now())))
    }

    async fn fetch_snapshot(
        &self,
        symbols: &[InstrumentSymbol],
    ) -> Result<MarketPayload<Snapshot>, GatewayError> {
        Ok(MarketPayload::Synthesized(synthesize_snapshot(
            symbols,
            self.clock.now(),
        )))
    }

    fn open_stream(&self, symbols: Vec<InstrumentSymbol>) -> Result<QuoteStream, GatewayError> {
        Ok(MockStream::open(symbols, &self.settings, Arc::clone(&self.clock)))
    }
}
