//! # Error Types
//!
//! Unified error handling for the authority service, built around the seven
//! error kinds the token authority surfaces to clients: invalid parameters,
//! invalid/expired access token, invalid/expired refresh token, a directory
//! pass-through, and internal. Each variant maps to a specific HTTP status and
//! a machine-readable `code()`, so handlers can propagate `?` straight through
//! to an actix `ResponseError` impl instead of hand-building responses.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid access token")]
    InvalidAccessToken,

    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("expired access token")]
    ExpiredAccessToken,

    #[error("expired refresh token")]
    ExpiredRefreshToken,

    /// Pass-through of a non-OK response from the directory service on an org
    /// mutation (status change, password reset) — body/status are forwarded
    /// verbatim rather than translated, per §7's propagation policy.
    #[error("directory error {code}: {message}")]
    Directory { code: i64, message: String },

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        ApiError::InvalidParameters(message.into())
    }

    /// Machine-readable error code embedded in 200-with-error-code response
    /// envelopes (§7) and used by clients that branch on error kind rather
    /// than HTTP status alone.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidParameters(_) => "INVALID_PARAMETERS",
            ApiError::InvalidAccessToken => "INVALID_ACCESS_TOKEN",
            ApiError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            ApiError::ExpiredAccessToken => "EXPIRED_ACCESS_TOKEN",
            ApiError::ExpiredRefreshToken => "EXPIRED_REFRESH_TOKEN",
            ApiError::Directory { .. } => "DIRECTORY_ERROR",
            ApiError::Internal(_) => "INTERNAL",
            ApiError::Validation(_) => "INVALID_PARAMETERS",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidParameters(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidAccessToken
            | ApiError::InvalidRefreshToken
            | ApiError::ExpiredAccessToken
            | ApiError::ExpiredRefreshToken => StatusCode::UNAUTHORIZED,
            ApiError::Directory { .. } => StatusCode::OK,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        ApiError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(message) = self {
            tracing::error!(error = %message, "internal error");
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        })
    }
}

impl From<redis::RedisError> for ApiError {
    fn from(e: redis::RedisError) -> Self {
        ApiError::Internal(format!("redis: {e}"))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Internal(format!("serialization: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_401() {
        assert_eq!(ApiError::InvalidAccessToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::ExpiredRefreshToken.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn malformed_body_maps_to_400() {
        assert_eq!(
            ApiError::invalid_parameters("missing field").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_error_hides_message_but_keeps_code() {
        let err = ApiError::internal("redis connection refused");
        assert_eq!(err.code(), "INTERNAL");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
