//! Market Data Port (Driven Port)
//!
//! Interface the gateway facade uses to reach a market data backend. Two
//! adapters implement it: the offline simulator and the HTTP-backed live
//! source. The backend is chosen once, at construction.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::domain::instrument::{InstrumentSymbol, UnsupportedSymbol};
use crate::domain::quote::{Quote, Snapshot};

/// Unique identifier of a quote stream.
pub type StreamId = uuid::Uuid;

// =============================================================================
// Gateway Mode
// =============================================================================

/// Which backend serves market data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    /// Quotes are synthesized locally.
    #[default]
    Mock,
    /// Quotes are fetched from a remote gateway.
    Live,
}

impl GatewayMode {
    /// Mode name as reported by `/health`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Live => "live",
        }
    }

    /// Live only when the flag is exactly `"true"`.
    #[must_use]
    pub fn from_live_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("true") => Self::Live,
            _ => Self::Mock,
        }
    }
}

impl fmt::Display for GatewayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payload
// =============================================================================

/// Market data as produced by a backend.
///
/// Synthesized data is typed. Upstream bodies are relayed verbatim so a
/// remote gateway may add fields, use other numeric forms or cover other
/// symbols without the relay rejecting them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarketPayload<T> {
    /// Produced locally.
    Synthesized(T),
    /// Upstream JSON body, unmodified.
    Upstream(serde_json::Value),
}

impl<T> MarketPayload<T> {
    /// The typed value, if this payload was produced locally.
    #[must_use]
    pub const fn synthesized(&self) -> Option<&T> {
        match self {
            Self::Synthesized(value) => Some(value),
            Self::Upstream(_) => None,
        }
    }

    /// The relayed body, if this payload came from upstream.
    #[must_use]
    pub const fn upstream(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Synthesized(_) => None,
            Self::Upstream(body) => Some(body),
        }
    }
}

// =============================================================================
// Streams
// =============================================================================

/// Lifecycle control of a running quote emitter.
pub trait StreamControl: Send + Sync + fmt::Debug {
    /// Stream identifier.
    fn id(&self) -> StreamId;

    /// Subscribed instruments, in emission order.
    fn symbols(&self) -> &[InstrumentSymbol];

    /// Begin emitting. Restarts the timer if already running.
    fn start(&self);

    /// Stop emitting. Safe to call any number of times.
    fn stop(&self);

    /// Whether the timer is currently running.
    fn is_running(&self) -> bool;
}

/// A quote stream handed to exactly one subscriber.
///
/// Quotes are delivered through a bounded channel. The emitter never waits
/// on the subscriber: when the channel is full, new quotes are dropped.
#[derive(Debug)]
pub struct QuoteStream {
    control: Arc<dyn StreamControl>,
    quotes: mpsc::Receiver<Quote>,
}

impl QuoteStream {
    /// Pair an emitter with the receiving end of its channel.
    #[must_use]
    pub fn new(control: Arc<dyn StreamControl>, quotes: mpsc::Receiver<Quote>) -> Self {
        Self { control, quotes }
    }

    /// Stream identifier.
    #[must_use]
    pub fn id(&self) -> StreamId {
        self.control.id()
    }

    /// Subscribed instruments.
    #[must_use]
    pub fn symbols(&self) -> &[InstrumentSymbol] {
        self.control.symbols()
    }

    /// Begin emitting.
    pub fn start(&self) {
        self.control.start();
    }

    /// Stop emitting.
    pub fn stop(&self) {
        self.control.stop();
    }

    /// Whether the emitter is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    /// Shared handle to the emitter, for registries.
    #[must_use]
    pub fn control(&self) -> Arc<dyn StreamControl> {
        Arc::clone(&self.control)
    }

    /// Wait for the next quote. `None` once the emitter is gone.
    pub async fn recv(&mut self) -> Option<Quote> {
        self.quotes.recv().await
    }

    /// Split into the control handle and a `Stream` of quotes.
    #[must_use]
    pub fn into_parts(self) -> (Arc<dyn StreamControl>, ReceiverStream<Quote>) {
        (self.control, ReceiverStream::new(self.quotes))
    }
}

// =============================================================================
// Port
// =============================================================================

/// Port for fetching and streaming quotes.
#[async_trait]
pub trait MarketDataPort: Send + Sync + fmt::Debug {
    /// Which backend this is.
    fn mode(&self) -> GatewayMode;

    /// Fetch the current quote for one instrument.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    async fn fetch_quote(
        &self,
        symbol: InstrumentSymbol,
    ) -> Result<MarketPayload<Quote>, GatewayError>;

    /// Fetch current quotes for a set of distinct instruments.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    async fn fetch_snapshot(
        &self,
        symbols: &[InstrumentSymbol],
    ) -> Result<MarketPayload<Snapshot>, GatewayError>;

    /// Open an idle quote stream for `symbols`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::StreamingUnavailable` if the backend cannot
    /// stream.
    fn open_stream(&self, symbols: Vec<InstrumentSymbol>) -> Result<QuoteStream, GatewayError>;
}

// =============================================================================
// Errors
// =============================================================================

/// Market data gateway errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Requested instrument is not supported.
    #[error(transparent)]
    UnsupportedSymbol(#[from] UnsupportedSymbol),

    /// Remote gateway answered with a non-success status.
    #[error("Gateway error {0}")]
    Status(u16),

    /// Remote gateway could not be reached.
    #[error("Gateway transport error: {0}")]
    Transport(String),

    /// Remote gateway answered with an undecodable body.
    #[error("Gateway response could not be decoded: {0}")]
    Decode(String),

    /// The backend has no streaming capability.
    #[error("streaming requires a real-time integration not available in this mode")]
    StreamingUnavailable,
}

impl GatewayError {
    /// Short label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedSymbol(_) => "unsupported_symbol",
            Self::Status(_) => "status",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::StreamingUnavailable => "streaming_unavailable",
        }
    }
}
