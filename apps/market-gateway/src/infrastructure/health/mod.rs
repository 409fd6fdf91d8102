//! Health Check and Metrics Endpoint
//!
//! Routes for health checks and Prometheus metrics, served on the API port.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns `{status, mode}`
//! - `GET /healthz` - Liveness probe (simple OK)
//! - `GET /metrics` - Prometheus metrics in text format

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::application::ports::GatewayMode;
use crate::infrastructure::http::AppState;
use crate::infrastructure::metrics::{self, get_metrics_handle};

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Backend mode.
    pub mode: GatewayMode,
}

/// Health and metrics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/metrics", get(metrics_handler))
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        mode: state.gateway.mode(),
    })
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    metrics::set_active_streams(state.gateway.active_streams());
    metrics::set_sessions(state.sessions.len());

    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::application::services::MarketGateway;
    use crate::domain::session::SessionStore;
    use crate::infrastructure::config::{GatewayConfig, build_gateway};
    use crate::infrastructure::http::create_router;

    fn app(mode: GatewayMode) -> Router {
        let gateway: MarketGateway = build_gateway(&GatewayConfig {
            mode,
            ..GatewayConfig::default()
        })
        .unwrap();
        create_router(AppState::new(Arc::new(gateway), Arc::new(SessionStore::new())))
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_reports_mode() {
        let (status, body) = get_body(app(GatewayMode::Mock), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok","mode":"mock"}"#);

        let (_, body) = get_body(app(GatewayMode::Live), "/health").await;
        assert_eq!(body, r#"{"status":"ok","mode":"live"}"#);
    }

    #[tokio::test]
    async fn liveness_probe() {
        let (status, body) = get_body(app(GatewayMode::Mock), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn metrics_endpoint_renders() {
        metrics::init_metrics().unwrap();
        let (status, body) = get_body(app(GatewayMode::Mock), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("market_gateway_sessions"));
    }
}
