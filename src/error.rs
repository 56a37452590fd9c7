//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "item not found: 42",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`GatewayError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Which backend a connectivity error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Backend {
    /// The persistent item store (PostgreSQL).
    #[error("store")]
    Store,
    /// The side cache (Redis).
    #[error("cache")]
    Cache,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request            |
/// | 2000–2999 | Not Found       | 404 Not Found              |
/// | 3000–3999 | Server          | 500 / 503                  |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Item with the given identifier was not found.
    #[error("item not found: {0}")]
    NotFound(String),

    /// Request payload failed validation.
    #[error("invalid request: {0}")]
    ValidationFailed(String),

    /// A required configuration setting is absent.
    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),

    /// A configuration setting is present but cannot be used.
    #[error("invalid configuration for {key}: {reason}")]
    InvalidConfiguration {
        /// Environment key that holds the bad value.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A backend could not be reached after all connection attempts.
    #[error("{backend} unreachable after {attempts} attempt(s): {reason}")]
    ConnectionUnreachable {
        /// Backend that failed.
        backend: Backend,
        /// Number of attempts made.
        attempts: u32,
        /// Last error observed.
        reason: String,
    },

    /// A single operation against an otherwise healthy backend failed.
    #[error("backend error: {0}")]
    BackendTransient(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::ValidationFailed(_) => 1001,
            Self::NotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::BackendTransient(_) => 3001,
            Self::ConfigurationMissing(_) | Self::InvalidConfiguration { .. } => 3002,
            Self::ConnectionUnreachable { .. } => 3003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ConnectionUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::BackendTransient(_)
            | Self::ConfigurationMissing(_)
            | Self::InvalidConfiguration { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
