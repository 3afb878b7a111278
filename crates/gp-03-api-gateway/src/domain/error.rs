//! Gateway error types and their REST and WebSocket encodings.
//!
//! REST: not found → 404, forbidden → 403, missing identity → 401, else 500.
//! WebSocket: error frames carry the numeric codes in [`codes`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gp_01_group_repository::{ErrorKind, RepositoryError};
use gp_02_capability_tokens::TokenError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// WebSocket error frame codes
pub mod codes {
    pub const NO_SUFFICIENT_PERMISSIONS: i32 = 1;
    pub const MEMBER_NOT_EXISTS: i32 = 2;
    pub const GROUP_NOT_EXISTS: i32 = 3;
    pub const INTERNAL_ERROR: i32 = -1;
}

/// Payload of an outbound `error` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsErrorPayload {
    pub code: i32,
    pub message: String,
}

impl From<&RepositoryError> for WsErrorPayload {
    fn from(e: &RepositoryError) -> Self {
        let code = match e {
            RepositoryError::NoSufficientPermissions => codes::NO_SUFFICIENT_PERMISSIONS,
            RepositoryError::MemberNotExists => codes::MEMBER_NOT_EXISTS,
            RepositoryError::GroupNotExists => codes::GROUP_NOT_EXISTS,
            RepositoryError::Storage(_) => codes::INTERNAL_ERROR,
        };
        let message = match e {
            // Storage details stay in the server log.
            RepositoryError::Storage(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        Self { code, message }
    }
}

/// Errors surfaced by REST handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No identity, or an identity that failed verification
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),
}

impl ApiError {
    pub fn unauthorized(details: impl Into<String>) -> Self {
        Self::Unauthorized(details.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Repository(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let mut response = (status, Json(serde_json::json!({ "error": message }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

/// Result type for REST handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway-level errors (not request-scoped)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server stopped with an I/O error
    #[error("server error: {0}")]
    Serve(String),

    /// A frame could not be delivered to a connection
    #[error("send failed: {0}")]
    Send(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}
