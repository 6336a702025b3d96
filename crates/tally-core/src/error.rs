//! # Error Types
//!
//! Domain error taxonomy for the stock ledger and sale workflow.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Malformed input, rejected before any write     │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Storage failures + wrapped CoreError           │
//! │                                                                         │
//! │  REST errors (apps/api)                                                │
//! │  └── ApiError         - { code, message } + HTTP status                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors raised by ledger and sale operations.
///
/// None of these are retried automatically: repeating the same request
/// without caller intervention produces the same outcome.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested quantity exceeds `quantity - reserved_quantity`.
    ///
    /// ## When This Occurs
    /// - `transfer`, `write_off` or `reserve` asks for more than is available
    /// - A sale line cannot be reserved during checkout
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout line (qty: 5)
    ///      │
    ///      ▼
    /// reserve: available = 3
    ///      │
    ///      ▼
    /// InsufficientStock { available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole sale rolled back, cashier sees "available 3, requested 5"
    /// ```
    #[error(
        "Insufficient stock for product {product_id} at location {location_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: String,
        location_id: String,
        available: i64,
        requested: i64,
    },

    /// Releasing or selling more than is currently reserved.
    #[error(
        "Insufficient reservation for product {product_id} at location {location_id}: reserved {reserved}, requested {requested}"
    )]
    InsufficientReservation {
        product_id: String,
        location_id: String,
        reserved: i64,
        requested: i64,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Sale is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Cancelling a completed sale (refunds are a separate flow)
    /// - Cancelling an already cancelled sale
    /// - Completing a sale that is not pending
    #[error("Sale {sale_id} is {current_status}, cannot {operation}")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
        operation: String,
    },

    /// Sale has more lines than allowed.
    #[error("Sale cannot have more than {max} items")]
    SaleTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InsufficientStock error.
    pub fn insufficient_stock(
        product_id: impl Into<String>,
        location_id: impl Into<String>,
        available: i64,
        requested: i64,
    ) -> Self {
        CoreError::InsufficientStock {
            product_id: product_id.into(),
            location_id: location_id.into(),
            available,
            requested,
        }
    }

    /// Creates an InsufficientReservation error.
    pub fn insufficient_reservation(
        product_id: impl Into<String>,
        location_id: impl Into<String>,
        reserved: i64,
        requested: i64,
    ) -> Self {
        CoreError::InsufficientReservation {
            product_id: product_id.into(),
            location_id: location_id.into(),
            reserved,
            requested,
        }
    }

    /// Creates an InvalidSaleStatus error.
    pub fn invalid_status(
        sale_id: impl Into<String>,
        current_status: impl std::fmt::Display,
        operation: impl Into<String>,
    ) -> Self {
        CoreError::InvalidSaleStatus {
            sale_id: sale_id.into(),
            current_status: current_status.to_string(),
            operation: operation.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any storage write, so they never leave partial effects.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is below a bound that depends on current state.
    #[error("{field} must be at least {min}")]
    BelowMinimum { field: String, min: i64 },

    /// Two fields that must differ are equal.
    #[error("{field} must differ from {other}")]
    MustDiffer { field: String, other: String },

    /// Arithmetic on the input would overflow.
    #[error("{field} is too large")]
    Overflow { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::insufficient_stock("p-1", "store-1", 6, 7);
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-1 at location store-1: available 6, requested 7"
        );
    }

    #[test]
    fn test_invalid_status_message() {
        let err = CoreError::invalid_status("s-1", "completed", "cancel");
        assert_eq!(err.to_string(), "Sale s-1 is completed, cannot cancel");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "reason".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: reason is required");
    }
}
