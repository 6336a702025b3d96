//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally                                  │
//! │                                                                         │
//! │  Handler: Result<Json<T>, ApiError>                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  DbError::Core(CoreError::InsufficientStock{..}) ──┐                   │
//! │  DbError::QueryFailed("...")  (logged, generic) ───┼──► ApiError       │
//! │  missing X-User-Id ────────────────────────────────┘        │          │
//! │                                                              ▼          │
//! │                                  HTTP status + { "code", "message" }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! | code                  | status |
//! |-----------------------|--------|
//! | VALIDATION_ERROR      | 400    |
//! | UNAUTHORIZED          | 401    |
//! | NOT_FOUND             | 404    |
//! | CONFLICT              | 409    |
//! | INVALID_STATE         | 409    |
//! | INSUFFICIENT_STOCK    | 422    |
//! | DATABASE_ERROR        | 500    |
//! | INTERNAL              | 500    |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tally_core::CoreError;
use tally_db::DbError;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for product p-1 at location s-1: available 6, requested 7"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
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

    /// Caller identity missing (401)
    Unauthorized,

    /// Resource not found (404)
    NotFound,

    /// Duplicate key (409)
    Conflict,

    /// Sale is not in a state that allows the operation (409)
    InvalidState,

    /// Not enough available or reserved stock (422)
    InsufficientStock,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict | ErrorCode::InvalidState => StatusCode::CONFLICT,
            ErrorCode::InsufficientStock => StatusCode::UNPROCESSABLE_ENTITY,
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

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Core(core) => core.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConstraintViolation { message } => {
                tracing::warn!("Constraint violation: {}", message);
                ApiError::validation(message)
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::Internal, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::Validation(_) | CoreError::SaleTooLarge { .. } => {
                ErrorCode::ValidationError
            }
            CoreError::SaleNotFound(_) => ErrorCode::NotFound,
            CoreError::InvalidSaleStatus { .. } => ErrorCode::InvalidState,
            CoreError::InsufficientStock { .. } | CoreError::InsufficientReservation { .. } => {
                ErrorCode::InsufficientStock
            }
        };

        let message = match err {
            CoreError::Validation(e) => e.to_string(),
            other => other.to_string(),
        };

        ApiError::new(code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status_code(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Handler result.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::ValidationError;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(DbError, StatusCode)> = vec![
            (
                CoreError::Validation(ValidationError::Required {
                    field: "reason".to_string(),
                })
                .into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::insufficient_stock("p", "l", 1, 2).into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CoreError::insufficient_reservation("p", "l", 0, 2).into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CoreError::SaleNotFound("s".to_string()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                CoreError::invalid_status("s", "completed", "cancel").into(),
                StatusCode::CONFLICT,
            ),
            (
                DbError::QueryFailed("disk I/O error".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.code.status_code(), status, "{}", api);
        }
    }

    #[test]
    fn test_infrastructure_details_are_hidden() {
        let api: ApiError = DbError::QueryFailed("near \"SELEC\": syntax error".to_string()).into();
        assert_eq!(api.code, ErrorCode::DatabaseError);
        assert_eq!(api.message, "Database operation failed");
    }

    #[test]
    fn test_validation_message_is_unwrapped() {
        let api: ApiError = CoreError::Validation(ValidationError::Required {
            field: "reason".to_string(),
        })
        .into();
        assert_eq!(api.message, "reason is required");
    }
}
