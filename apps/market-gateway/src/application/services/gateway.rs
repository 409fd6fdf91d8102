//! Gateway Facade
//!
//! One API for quotes and streams regardless of which backend is plugged in.
//! Symbol filtering happens here so both backends see clean input, and every
//! stream handed out is tracked so it can be force-stopped later.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::application::ports::{
    GatewayError, GatewayMode, MarketDataPort, MarketPayload, QuoteStream, StreamControl,
    StreamId,
};
use crate::domain::instrument::{InstrumentSymbol, filter_known, filter_unique};
use crate::domain::quote::{Quote, Snapshot};

/// Market data facade over a single backend.
#[derive(Debug)]
pub struct MarketGateway {
    backend: Box<dyn MarketDataPort>,
    streams: Mutex<HashMap<StreamId, Arc<dyn StreamControl>>>,
}

impl MarketGateway {
    /// Create a gateway over `backend`.
    #[must_use]
    pub fn new(backend: Box<dyn MarketDataPort>) -> Self {
        Self {
            backend,
            streams: Mutex::new(HashMap::new()),
        }
    }

    /// Backend mode.
    #[must_use]
    pub fn mode(&self) -> GatewayMode {
        self.backend.mode()
    }

    /// Supported instruments in canonical order.
    #[must_use]
    pub fn list_symbols(&self) -> Vec<InstrumentSymbol> {
        InstrumentSymbol::ALL.to_vec()
    }

    /// Fetch one quote.
    ///
    /// # Errors
    ///
    /// Rejects unknown codes with `GatewayError::UnsupportedSymbol`; other
    /// errors come from the backend.
    pub async fn fetch_quote(&self, code: &str) -> Result<MarketPayload<Quote>, GatewayError> {
        let symbol = code.parse::<InstrumentSymbol>()?;
        self.backend.fetch_quote(symbol).await
    }

    /// Fetch a snapshot. Unknown and repeated codes are dropped silently;
    /// `None` requests every instrument.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    pub async fn fetch_snapshot(
        &self,
        codes: Option<&[String]>,
    ) -> Result<MarketPayload<Snapshot>, GatewayError> {
        let symbols = codes.map_or_else(|| InstrumentSymbol::ALL.to_vec(), filter_unique);
        tracing::debug!(symbols = symbols.len(), mode = %self.mode(), "Fetching snapshot");
        self.backend.fetch_snapshot(&symbols).await
    }

    /// Create an idle stream over the known codes in `codes` and register
    /// it. `None` subscribes to every instrument.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::StreamingUnavailable` in live mode.
    pub fn create_stream(&self, codes: Option<&[String]>) -> Result<QuoteStream, GatewayError> {
        let symbols = codes.map_or_else(|| InstrumentSymbol::ALL.to_vec(), filter_known);
        let stream = self.backend.open_stream(symbols)?;

        self.streams.lock().insert(stream.id(), stream.control());
        tracing::debug!(
            stream_id = %stream.id(),
            symbols = stream.symbols().len(),
            "Stream registered"
        );
        Ok(stream)
    }

    /// Stop and deregister a stream. Unknown ids are ignored.
    pub fn stop_stream(&self, id: StreamId) {
        let removed = self.streams.lock().remove(&id);
        if let Some(control) = removed {
            control.stop();
            tracing::debug!(stream_id = %id, "Stream stopped");
        }
    }

    /// Stop and deregister every stream.
    pub fn stop_all(&self) {
        let drained: Vec<_> = self.streams.lock().drain().collect();
        for (_, control) in &drained {
            control.stop();
        }
        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "Stopped all streams");
        }
    }

    /// Number of registered streams.
    #[must_use]
    pub fn active_streams(&self) -> usize {
        self.streams.lock().len()
    }
}

// =============================================================================
// Tests
// =============================================================================
