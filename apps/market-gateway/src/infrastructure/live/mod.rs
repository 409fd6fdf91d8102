//! Remote Gateway Adapter
//!
//! Implements `MarketDataPort` over the upstream HTTP gateway. Quotes and
//! snapshots are plain request/response calls whose JSON bodies are relayed
//! unchanged; streaming is not offered.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;

use crate::application::ports::{
    GatewayError, GatewayMode, MarketDataPort, MarketPayload, QuoteStream,
};
use crate::domain::instrument::InstrumentSymbol;
use crate::domain::quote::{Quote, Snapshot};
use crate::infrastructure::config::LiveSettings;

/// Header carrying the gateway API key.
const API_KEY_HEADER: &str = "x-api-key";

/// HTTP-backed market data backend.
#[derive(Debug, Clone)]
pub struct LiveMarketData {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct SnapshotRequest<'a> {
    symbols: &'a [InstrumentSymbol],
}

impl LiveMarketData {
    /// Create an adapter for the configured gateway.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the HTTP client cannot be built.
    pub fn new(settings: &LiveSettings) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let api_key = settings.credentials.api_key();
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: (!api_key.is_empty()).then(|| api_key.to_string()),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, GatewayError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        decode(response).await
    }
}

/// Any JSON body is accepted; only non-success statuses and non-JSON bodies
/// are errors.
async fn decode(response: Response) -> Result<Value, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(
            status = status.as_u16(),
            url = %response.url(),
            "Gateway returned error status"
        );
        return Err(GatewayError::Status(status.as_u16()));
    }

    response
        .json()
        .await
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

#[async_trait]
impl MarketDataPort for LiveMarketData {
    fn mode(&self) -> GatewayMode {
        GatewayMode::Live
    }

    async fn fetch_quote(
        &self,
        symbol: InstrumentSymbol,
    ) -> Result<MarketPayload<Quote>, GatewayError> {
        let url = format!("{}/markets/quote", self.base_url);
        let body = self
            .send(self.client.get(url).query(&[("symbol", symbol.as_str())]))
            .await?;
        Ok(MarketPayload::Upstream(body))
    }

    async fn fetch_snapshot(
        &self,
        symbols: &[InstrumentSymbol],
    ) -> Result<MarketPayload<Snapshot>, GatewayError> {
        let url = format!("{}/markets/snapshot", self.base_url);
        let body = self
            .send(self.client.post(url).json(&SnapshotRequest { symbols }))
            .await?;
        Ok(MarketPayload::Upstream(body))
    }

    fn open_stream(&self, _symbols: Vec<InstrumentSymbol>) -> Result<QuoteStream, GatewayError> {
        Err(GatewayError::StreamingUnavailable)
    }
}
