//! HTTP error mapping.
//!
//! Every handler failure funnels through [`ApiError`], which renders
//! `{error, detail}` with the matching status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::application::ports::GatewayError;
use crate::domain::session::SessionError;
use crate::infrastructure::metrics;

use super::response::ErrorResponse;

/// An error returned from a route handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    /// 500 with the given detail.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }

    /// 404 with the given detail.
    #[must_use]
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    /// Response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Human-readable detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        metrics::record_gateway_error(&err);
        Self::internal(err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self::internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self
            .status
            .canonical_reason()
            .unwrap_or("Internal Server Error");

        if self.status.is_server_error() {
            tracing::error!(
                status = self.status.as_u16(),
                detail = %self.detail,
                "Request failed"
            );
        } else {
            tracing::debug!(
                status = self.status.as_u16(),
                detail = %self.detail,
                "Request rejected"
            );
        }

        (
            self.status,
            Json(ErrorResponse {
                error: error.to_string(),
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_are_internal() {
        let err = ApiError::from(GatewayError::Status(502));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Gateway error 502");
    }

    #[test]
    fn missing_session_is_internal() {
        let err = ApiError::from(SessionError::NotFound("ghost".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Session not found: ghost");
    }

    #[tokio::test]
    async fn renders_error_body() {
        let response = ApiError::not_found("Session not found: u9").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Not Found", "detail": "Session not found: u9"})
        );
    }
}
