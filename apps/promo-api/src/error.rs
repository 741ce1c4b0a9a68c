//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in promo-api                              │
//! │                                                                         │
//! │  Handler: Result<T, ApiError>                                           │
//! │       │                                                                 │
//! │       ├── DbError ──────────── NOT_FOUND / VALIDATION_ERROR / DATABASE  │
//! │       ├── CoreError ────────── VALIDATION_ERROR                         │
//! │       ├── ImportError ──────── UPSTREAM_ERROR / NOT_CONFIGURED          │
//! │       └── JsonRejection ────── VALIDATION_ERROR                         │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │  IntoResponse: status from code, body {"code": .., "message": ..}      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed rule lookup is always an error response. Handlers never turn a
//! store failure into an empty discount list.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use promo_core::CoreError;
use promo_db::DbError;

use crate::erp::ImportError;

/// Error body returned by every failing endpoint.
///
/// ```json
/// { "code": "UNAUTHORIZED", "message": "Missing bearer token" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing or wrong bearer token (401)
    Unauthorized,

    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// A required setting is absent (503)
    NotConfigured,

    /// ERP feed unreachable or malformed (502)
    UpstreamError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status.is_server_error() {
            error!(code = ?self.code, message = %self.message, "Request failed");
        }
        (status, Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::ConstraintViolation(e) => ApiError::validation(e),
            DbError::Validation(e) => ApiError::validation(e.to_string()),
            DbError::CorruptRecord { id, reason } => {
                error!(id, %reason, "Corrupt discount record");
                ApiError::new(
                    ErrorCode::DatabaseError,
                    format!("Discount {id} is stored in an unreadable form"),
                )
            }
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database unavailable")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) | DbError::TransactionFailed(e) | DbError::Internal(e) => {
                error!(error = %e, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::NotConfigured => {
                ApiError::new(ErrorCode::NotConfigured, "ERP feed URL is not configured")
            }
            ImportError::Store(db) => db.into(),
            other => ApiError::new(ErrorCode::UpstreamError, other.to_string()),
        }
    }
}

/// Malformed or mistyped JSON bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}
