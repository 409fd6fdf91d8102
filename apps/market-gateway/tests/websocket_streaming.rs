//! WebSocket Streaming Integration Tests
//!
//! Runs the real server on a random port and drives it with a WebSocket
//! client: subscribe, replace, malformed input, live-mode rejection and
//! teardown.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use market_gateway::{
    AppState, GatewayConfig, GatewayMode, HttpServer, MarketGateway, MockStreamSettings,
    SessionStore, build_gateway,
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Start a server on a random port and return its address and state.
async fn setup_test_server(mode: GatewayMode) -> (SocketAddr, AppState) {
    let config = GatewayConfig {
        mode,
        mock: MockStreamSettings {
            interval: Duration::from_millis(40),
            capacity: 32,
        },
        ..GatewayConfig::default()
    };
    let gateway: Arc<MarketGateway> = Arc::new(build_gateway(&config).unwrap());
    let state = AppState::new(gateway, Arc::new(SessionStore::new()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(HttpServer::serve(listener, state.clone()));

    (addr, state)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/api/markets/stream"))
        .await
        .unwrap();
    client
}

async fn send(client: &mut Client, text: &str) {
    client.send(Message::text(text)).await.unwrap();
}

/// Next JSON text frame.
async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip frames until one matches `pred`.
async fn next_matching(client: &mut Client, pred: impl Fn(&Value) -> bool) -> Value {
    loop {
        let value = next_json(client).await;
        if pred(&value) {
            return value;
        }
    }
}

async fn wait_for_streams(state: &AppState, expected: usize) {
    timeout(RECV_TIMEOUT, async {
        while state.gateway.active_streams() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("stream registry did not settle");
}

#[tokio::test]
async fn subscribe_receives_quotes_for_requested_symbols() {
    let (addr, state) = setup_test_server(GatewayMode::Mock).await;
    let mut client = connect(addr).await;

    send(&mut client, r#"{"type":"subscribe","symbols":["ES=F","NQ=F","BOGUS"]}"#).await;

    let mut seen = Vec::new();
    for _ in 0..4 {
        let quote = next_json(&mut client).await;
        assert!(quote["last"].is_number());
        assert!(quote["timestamp"].as_str().unwrap().ends_with('Z'));
        seen.push(quote["symbol"].as_str().unwrap().to_string());
    }

    assert_eq!(seen, ["ES=F", "NQ=F", "ES=F", "NQ=F"]);
    assert_eq!(state.gateway.active_streams(), 1);
}

#[tokio::test]
async fn new_subscription_replaces_previous() {
    let (addr, state) = setup_test_server(GatewayMode::Mock).await;
    let mut client = connect(addr).await;

    send(&mut client, r#"{"type":"subscribe","symbols":["ES=F"]}"#).await;
    next_json(&mut client).await;

    send(&mut client, r#"{"type":"subscribe","symbols":["CL=F"]}"#).await;
    next_matching(&mut client, |q| q["symbol"] == "CL=F").await;

    for _ in 0..3 {
        let quote = next_json(&mut client).await;
        assert_eq!(quote["symbol"], "CL=F");
    }
    assert_eq!(state.gateway.active_streams(), 1);
}

#[tokio::test]
async fn malformed_message_gets_error_and_socket_stays_open() {
    let (addr, _state) = setup_test_server(GatewayMode::Mock).await;
    let mut client = connect(addr).await;

    send(&mut client, "definitely not json").await;
    let error = next_json(&mut client).await;
    assert_eq!(error["type"], "error");
    assert!(error["message"].as_str().is_some_and(|m| !m.is_empty()));

    send(&mut client, r#"{"type":"ping"}"#).await;
    send(&mut client, r#"{"type":"subscribe","symbols":["GC=F"]}"#).await;
    let quote = next_json(&mut client).await;
    assert_eq!(quote["symbol"], "GC=F");
}

#[tokio::test]
async fn subscribe_without_symbols_streams_everything() {
    let (addr, _state) = setup_test_server(GatewayMode::Mock).await;
    let mut client = connect(addr).await;

    send(&mut client, r#"{"type":"subscribe"}"#).await;

    let mut seen = Vec::new();
    for _ in 0..7 {
        seen.push(next_json(&mut client).await["symbol"].as_str().unwrap().to_string());
    }
    assert_eq!(seen, ["ES=F", "NQ=F", "YM=F", "RTY=F", "CL=F", "GC=F", "ZN=F"]);
}

#[tokio::test]
async fn live_mode_reports_streaming_unavailable() {
    let (addr, state) = setup_test_server(GatewayMode::Live).await;
    let mut client = connect(addr).await;

    send(&mut client, r#"{"type":"subscribe","symbols":["ES=F"]}"#).await;
    let error = next_json(&mut client).await;

    assert_eq!(error["type"], "error");
    assert_eq!(
        error["message"],
        "streaming requires a real-time integration not available in this mode"
    );
    assert_eq!(state.gateway.active_streams(), 0);
}

#[tokio::test]
async fn closing_socket_stops_stream() {
    let (addr, state) = setup_test_server(GatewayMode::Mock).await;
    let mut client = connect(addr).await;

    send(&mut client, r#"{"type":"subscribe","symbols":["ZN=F"]}"#).await;
    next_json(&mut client).await;
    assert_eq!(state.gateway.active_streams(), 1);

    client.close(None).await.unwrap();
    wait_for_streams(&state, 0).await;
}

#[tokio::test]
async fn shutdown_closes_connections() {
    let (addr, state) = setup_test_server(GatewayMode::Mock).await;
    let mut client = connect(addr).await;

    send(&mut client, r#"{"type":"subscribe","symbols":["YM=F"]}"#).await;
    next_json(&mut client).await;

    state.shutdown.cancel();

    let closed = timeout(RECV_TIMEOUT, async {
        while let Some(Ok(frame)) = client.next().await {
            if frame.is_close() {
                break;
            }
        }
    })
    .await;
    assert!(closed.is_ok());
    wait_for_streams(&state, 0).await;
}
