//! WebSocket quote push.
//!
//! Clients send `{"type":"subscribe","symbols":[...]}` and receive one JSON
//! quote per frame. A new subscription replaces the previous one on the same
//! socket. Malformed frames, including a bare `null`, get
//! `{"type":"error","message":...}` back and the socket stays open. Any other
//! message type is ignored.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;

use crate::application::ports::QuoteStream;
use crate::application::services::MarketGateway;
use crate::domain::quote::Quote;
use crate::infrastructure::http::AppState;
use crate::infrastructure::metrics;

// =============================================================================
// Messages
// =============================================================================

/// A message received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Replace the socket's subscription. `None` means every instrument.
    Subscribe {
        /// Requested codes, unfiltered.
        symbols: Option<Vec<String>>,
    },
    /// Any message type the server does not act on.
    Ignored,
}

/// A frame that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MalformedMessage(pub String);

/// A message sent to a client besides quotes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Something went wrong handling the client's last message.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl ClientMessage {
    /// Parse a client frame.
    ///
    /// # Errors
    ///
    /// Returns `MalformedMessage` if the frame is not JSON, is `null`, or is
    /// a subscribe carrying a non-array `symbols`.
    pub fn parse(raw: &str) -> Result<Self, MalformedMessage> {
        let payload: Value =
            serde_json::from_str(raw).map_err(|e| MalformedMessage(e.to_string()))?;

        if payload.is_null() {
            return Err(MalformedMessage("message must not be null".to_string()));
        }

        if payload.get("type").and_then(Value::as_str) != Some("subscribe") {
            return Ok(Self::Ignored);
        }

        let symbols = match payload.get("symbols") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            Some(_) => return Err(MalformedMessage("symbols must be an array".to_string())),
        };

        Ok(Self::Subscribe { symbols })
    }
}

// =============================================================================
// Connection Handling
// =============================================================================

/// WebSocket upgrade handler.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Per-socket subscription state.
#[derive(Debug)]
struct Subscription {
    gateway: Arc<MarketGateway>,
    active: Option<QuoteStream>,
}

impl Subscription {
    const fn new(gateway: Arc<MarketGateway>) -> Self {
        Self {
            gateway,
            active: None,
        }
    }

    /// Swap in a new stream. The old one is stopped first.
    fn replace(&mut self, symbols: Option<&[String]>) -> Result<(), String> {
        self.release();

        let result = match self.gateway.create_stream(symbols) {
            Ok(stream) => {
                stream.start();
                tracing::debug!(stream_id = %stream.id(), "Client subscribed");
                self.active = Some(stream);
                Ok(())
            }
            Err(e) => {
                metrics::record_gateway_error(&e);
                Err(e.to_string())
            }
        };
        metrics::set_active_streams(self.gateway.active_streams());
        result
    }

    fn release(&mut self) {
        if let Some(stream) = self.active.take() {
            stream.stop();
            self.gateway.stop_stream(stream.id());
            metrics::set_active_streams(self.gateway.active_streams());
        }
    }

    async fn next_quote(&mut self) -> Option<Quote> {
        match self.active.as_mut() {
            Some(stream) => stream.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Next quote frame. A finished emitter ends the subscription.
    async fn next_frame(&mut self) -> Option<String> {
        match self.next_quote().await {
            Some(quote) => serde_json::to_string(&quote).ok(),
            None => {
                tracing::debug!("Quote stream ended");
                self.release();
                None
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = Subscription::new(Arc::clone(&state.gateway));

    metrics::websocket_connected();
    tracing::info!("WebSocket client connected");

    loop {
        let outbound = tokio::select! {
            () = state.shutdown.cancelled() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Text(text))) => handle_frame(&mut subscription, text.as_str()),
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => handle_frame(&mut subscription, text),
                    Err(e) => Some(error_frame(&e.to_string())),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => None,
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "WebSocket receive failed");
                    break;
                }
            },
            frame = subscription.next_frame() => frame,
        };

        if let Some(frame) = outbound
            && sender.send(Message::Text(frame.into())).await.is_err()
        {
            break;
        }
    }

    drop(subscription);
    metrics::websocket_disconnected();
    tracing::info!("WebSocket client disconnected");
}

/// Apply one client frame. Returns a reply frame, if any.
fn handle_frame(subscription: &mut Subscription, raw: &str) -> Option<String> {
    match ClientMessage::parse(raw) {
        Ok(ClientMessage::Subscribe { symbols }) => subscription
            .replace(symbols.as_deref())
            .err()
            .map(|message| error_frame(&message)),
        Ok(ClientMessage::Ignored) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Malformed client message");
            Some(error_frame(&e.0))
        }
    }
}

fn error_frame(message: &str) -> String {
    let frame = ServerMessage::Error {
        message: message.to_string(),
    };
    serde_json::to_string(&frame).unwrap_or_default()
}

// =============================================================================
// Tests
// =============================================================================
