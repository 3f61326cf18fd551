//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Shopfloor                              │
//! │                                                                         │
//! │  Till                          Server                                   │
//! │  ────                          ──────                                   │
//! │                                                                         │
//! │  POST /carts/t1/checkout                                                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler → ApiResult<T>                                          │  │
//! │  │         │                                                        │  │
//! │  │  DbError::Rejected(InsufficientStock) ──┐                        │  │
//! │  │  DbError::TransactionAborted ───────────┤                        │  │
//! │  │  CoreError::EmptyCart ──────────────────┼──► ApiError ──► JSON   │  │
//! │  │  ValidationError ───────────────────────┘    + status            │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  409 { "code": "INSUFFICIENT_STOCK",                                   │
//! │        "message": "Insufficient stock for 'Widget': ..." }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures are logged in full and reach the client only as a
//! generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shopfloor_core::{CoreError, ValidationError};
use shopfloor_db::DbError;

use crate::barcode::BarcodeError;
use crate::export::ExportError;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 42"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Missing or unknown payment method (400)
    InvalidPaymentMethod,

    /// No credentials, or wrong ones (401)
    Unauthorized,

    /// Signed in but not allowed (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Duplicate name, barcode or username (409)
    Conflict,

    /// Not enough on the shelf (409)
    InsufficientStock,

    /// Product has no stock at all (409)
    OutOfStock,

    /// Product is referenced by sales or returns (409)
    ProductHasHistory,

    /// Checkout of an empty cart (422)
    EmptyCart,

    /// Cart line or quantity limit reached (422)
    CartLimit,

    /// Writer lock timed out, nothing committed (503)
    TransactionAborted,

    /// Database unreachable or pool exhausted (503)
    StorageUnavailable,

    /// Anything else (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::InvalidPaymentMethod => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict
            | ErrorCode::InsufficientStock
            | ErrorCode::OutOfStock
            | ErrorCode::ProductHasHistory => StatusCode::CONFLICT,
            ErrorCode::EmptyCart | ErrorCode::CartLimit => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::TransactionAborted | ErrorCode::StorageUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
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

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::TransactionAborted(e) => {
                tracing::warn!(error = %e, "Transaction aborted");
                ApiError::new(
                    ErrorCode::TransactionAborted,
                    "The store is busy, nothing was saved. Please try again",
                )
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::StorageUnavailable, "Database unavailable")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::StorageUnavailable, "Database pool exhausted")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::internal("Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::internal("Database operation failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::internal("Database operation failed")
            }
            DbError::Rejected(core) => ApiError::from(core),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_) | CoreError::NotInCart(_) => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::OutOfStock { .. } => ErrorCode::OutOfStock,
            CoreError::EmptyCart => ErrorCode::EmptyCart,
            CoreError::InvalidPaymentMethod(_) => ErrorCode::InvalidPaymentMethod,
            CoreError::ProductHasHistory { .. } => ErrorCode::ProductHasHistory,
            CoreError::CartTooLarge { .. } | CoreError::QuantityTooLarge { .. } => {
                ErrorCode::CartLimit
            }
            CoreError::UsernameTaken(_) => ErrorCode::Conflict,
            CoreError::Validation(e) => return ApiError::from(e.clone()),
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<BarcodeError> for ApiError {
    fn from(err: BarcodeError) -> Self {
        match err {
            BarcodeError::Io(e) => {
                tracing::error!("Barcode image write failed: {}", e);
                ApiError::internal("Cannot write barcode image")
            }
            other => ApiError::validation(other.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        tracing::error!("Export failed: {}", err);
        ApiError::internal("Export failed")
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
        (self.status(), Json(self)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
