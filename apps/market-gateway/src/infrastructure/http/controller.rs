//! HTTP Controller (Driver Adapter)
//!
//! Axum router for the market API. Handlers delegate to the gateway facade
//! and the session store.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::ports::MarketPayload;
use crate::application::services::MarketGateway;
use crate::domain::quote::{Quote, Snapshot};
use crate::domain::session::{Session, SessionStore};
use crate::infrastructure::{health, metrics, websocket};

use super::error::ApiError;
use super::request::{ContextRequest, DecisionRequest, SnapshotRequest};
use super::response::SymbolsResponse;

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Market data facade.
    pub gateway: Arc<MarketGateway>,
    /// Per-user sessions.
    pub sessions: Arc<SessionStore>,
    /// Cancelled when the server shuts down.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create state with a fresh shutdown token.
    #[must_use]
    pub fn new(gateway: Arc<MarketGateway>, sessions: Arc<SessionStore>) -> Self {
        Self {
            gateway,
            sessions,
            shutdown: CancellationToken::new(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let markets = Router::new()
        .route("/symbols", get(list_symbols))
        .route("/snapshot", post(snapshot))
        .route("/quote/{symbol}", get(quote))
        .route("/context", post(upsert_context))
        .route("/context/{user_id}", get(get_context))
        .route("/decision", post(append_decision))
        .route("/stream", get(websocket::ws_handler));

    Router::new()
        .nest("/api/markets", markets)
        .merge(health::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn list_symbols(State(state): State<AppState>) -> Json<SymbolsResponse> {
    Json(SymbolsResponse {
        symbols: state.gateway.list_symbols(),
    })
}

async fn snapshot(
    State(state): State<AppState>,
    Json(request): Json<SnapshotRequest>,
) -> Result<Json<MarketPayload<Snapshot>>, ApiError> {
    metrics::record_snapshot(state.gateway.mode());
    let snapshot = state.gateway.fetch_snapshot(request.symbols.as_deref()).await?;
    Ok(Json(snapshot))
}

async fn quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<MarketPayload<Quote>>, ApiError> {
    Ok(Json(state.gateway.fetch_quote(&symbol).await?))
}

async fn upsert_context(
    State(state): State<AppState>,
    Json(request): Json<ContextRequest>,
) -> Json<Session> {
    let user_id = request.user_id().to_string();
    let session = state
        .sessions
        .upsert(&user_id, request.profile.unwrap_or_default());
    metrics::set_sessions(state.sessions.len());
    Json(session)
}

async fn get_context(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    state
        .sessions
        .get(&user_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Session not found: {user_id}")))
}

async fn append_decision(
    State(state): State<AppState>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<Session>, ApiError> {
    let user_id = request.user_id().to_string();
    let session = state
        .sessions
        .append_decision(&user_id, request.decision.unwrap_or_default())?;
    metrics::record_decision();
    Ok(Json(session))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::infrastructure::config::MockStreamSettings;
    use crate::infrastructure::mock::MockMarketData;

    fn create_test_state() -> AppState {
        let backend = MockMarketData::new(MockStreamSettings {
            interval: Duration::from_millis(50),
            capacity: 8,
        });
        AppState::new(
            Arc::new(MarketGateway::new(Box::new(backend))),
            Arc::new(SessionStore::new()),
        )
    }

    async fn call(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn symbols_lists_all_codes() {
        let app = create_router(create_test_state());
        let (status, body) = call(app, "GET", "/api/markets/symbols", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"symbols": ["ES=F", "NQ=F", "YM=F", "RTY=F", "CL=F", "GC=F", "ZN=F"]})
        );
    }

    #[tokio::test]
    async fn snapshot_drops_unknown_and_duplicates() {
        let (status, body) = call(
            create_router(create_test_state()),
            "POST",
            "/api/markets/snapshot",
            Some(json!({"symbols": ["ES=F", "ES=F", "BADSYM"]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let quotes = body["quotes"].as_object().unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes["ES=F"]["symbol"], "ES=F");
        assert!(quotes["ES=F"]["changePct"].is_number());
    }

    #[tokio::test]
    async fn snapshot_without_symbols_returns_all() {
        let (_, body) = call(
            create_router(create_test_state()),
            "POST",
            "/api/markets/snapshot",
            Some(json!({})),
        )
        .await;

        assert_eq!(body["quotes"].as_object().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn quote_route() {
        let app = create_router(create_test_state());

        let (status, body) = call(app.clone(), "GET", "/api/markets/quote/GC=F", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "GC=F");

        let (status, body) = call(app, "GET", "/api/markets/quote/BADSYM", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
        assert_eq!(body["detail"], "Unsupported symbol: BADSYM");
    }

    #[tokio::test]
    async fn context_defaults_user_and_profile() {
        let (status, body) = call(
            create_router(create_test_state()),
            "POST",
            "/api/markets/context",
            Some(json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], "demo-user");
        assert_eq!(body["riskProfile"], json!({"maxDraw": 1500.0, "dailyGoal": 800.0}));
        assert_eq!(body["lastDecisions"], json!([]));
        assert!(body["lastUpdated"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn context_merges_profile_fields() {
        let app = create_router(create_test_state());
        call(
            app.clone(),
            "POST",
            "/api/markets/context",
            Some(json!({
                "userId": "u1",
                "profile": {"desk": "nq", "riskProfile": {"maxDraw": 900}}
            })),
        )
        .await;

        let (_, body) = call(
            app.clone(),
            "POST",
            "/api/markets/context",
            Some(json!({"userId": "u1", "profile": {"riskProfile": {"dailyGoal": 400}}})),
        )
        .await;
        assert_eq!(body["desk"], "nq");
        assert_eq!(body["riskProfile"], json!({"maxDraw": 900.0, "dailyGoal": 400.0}));

        let (status, fetched) = call(app, "GET", "/api/markets/context/u1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, body);
    }

    #[tokio::test]
    async fn get_context_missing_is_404() {
        let (status, body) = call(
            create_router(create_test_state()),
            "GET",
            "/api/markets/context/nobody",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not Found", "detail": "Session not found: nobody"}));
    }

    #[tokio::test]
    async fn decision_requires_session() {
        let (status, body) = call(
            create_router(create_test_state()),
            "POST",
            "/api/markets/decision",
            Some(json!({"userId": "unknown-user", "decision": {"side": "long"}})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"error": "Internal Server Error", "detail": "Session not found: unknown-user"})
        );
    }

    #[tokio::test]
    async fn decision_is_stamped_and_appended() {
        let app = create_router(create_test_state());
        call(app.clone(), "POST", "/api/markets/context", Some(json!({}))).await;

        let (status, body) = call(
            app,
            "POST",
            "/api/markets/decision",
            Some(json!({"decision": {"side": "short", "size": 2}})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let decisions = body["lastDecisions"].as_array().unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0]["side"], "short");
        assert_eq!(decisions[0]["size"], 2);
        assert!(decisions[0]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/markets/snapshot")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = create_router(create_test_state())
            .oneshot(request)
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
