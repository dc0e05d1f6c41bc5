//! Error types for the mock gateway.
//!
//! [`GatewayError`] implements [`axum::response::IntoResponse`] so handlers
//! can return `Result<…, GatewayError>` directly. Bodies use the
//! `{"message": ...}` shape the client surfaces to users.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors a gateway handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing, malformed or expired bearer token.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller lacks the role the route requires.
    #[error("{0}")]
    Forbidden(String),

    /// The addressed entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request is well-formed but cannot be applied.
    #[error("{0}")]
    BadRequest(String),

    /// Token signing failed.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();

        tracing::warn!(%status, error = %message, "request rejected");
        (status, Json(json!({ "message": message }))).into_response()
    }
}
