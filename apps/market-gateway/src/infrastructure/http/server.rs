//! HTTP server lifecycle.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use super::controller::{AppState, create_router};

/// Serves the API, WebSocket, health and metrics routes on one port.
#[derive(Debug)]
pub struct HttpServer {
    addr: SocketAddr,
    state: AppState,
}

impl HttpServer {
    /// Create a server for `addr`. Shuts down when `state.shutdown` fires.
    #[must_use]
    pub const fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Bind and run until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::BindFailed(self.addr, e.to_string()))?;

        Self::serve(listener, self.state).await
    }

    /// Run on an already-bound listener until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ServerFailed` if the HTTP server fails.
    pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), ServerError> {
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::ServerFailed(e.to_string()))?;
        tracing::info!(%addr, mode = %state.gateway.mode(), "Market gateway listening");

        let shutdown = state.shutdown.clone();
        axum::serve(listener, create_router(state))
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .map_err(|e| ServerError::ServerFailed(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}
