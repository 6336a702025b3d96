//! # Validation Module
//!
//! Input validation for ledger and checkout requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: REST handler (apps/api)                                      │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── 0 < quantity <= MAX_QUANTITY, reason present, ids well-formed     │
//! │  └── Runs before any storage write                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (0 <= reserved_quantity <= quantity)                        │
//! │  ├── UNIQUE (product_id, location_id), movement_number, sale_number    │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::CreateSaleRequest;
use crate::{MAX_QUANTITY, MAX_REASON_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a movement or sale-line quantity.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-3).is_err());
/// assert!(validate_quantity(i64::MAX).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_QUANTITY {
        return Err(ValidationError::Overflow {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a stock-take count. Zero is a legal count.
pub fn validate_counted_quantity(counted: i64) -> ValidationResult<()> {
    if counted < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "countedQuantity".to_string(),
        });
    }
    if counted > MAX_QUANTITY {
        return Err(ValidationError::Overflow {
            field: "countedQuantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a non-negative money amount in minor units.
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required reason (write-offs, adjustments).
///
/// ## Returns
/// The trimmed reason.
pub fn validate_reason(reason: &str) -> ValidationResult<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    validate_optional_reason(Some(reason)).map(|r| r.unwrap_or_default())
}

/// Validates an optional reason: blank becomes `None`, length is capped.
pub fn validate_optional_reason(reason: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    if reason.chars().count() > MAX_REASON_LENGTH {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LENGTH,
        });
    }

    Ok(Some(reason.to_string()))
}

/// Validates an identifier passed in from outside the core.
///
/// Ids are opaque: existence is enforced by foreign keys, only presence and
/// shape are checked here.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > 64 || id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a compact identifier (no whitespace, at most 64 characters)"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a transfer's endpoints.
pub fn validate_distinct_locations(from: &str, to: &str) -> ValidationResult<()> {
    if from == to {
        return Err(ValidationError::MustDiffer {
            field: "toLocationId".to_string(),
            other: "fromLocationId".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Checkout Validation
// =============================================================================

/// Validates a checkout request before anything is written.
///
/// ## Rules
/// - At least one line (the upper bound is [`crate::MAX_SALE_ITEMS`],
///   reported as [`crate::CoreError::SaleTooLarge`] by the workflow)
/// - Every line: quantity > 0, unit price >= 0, discount >= 0
/// - Ids present and well-formed
///
/// Line amounts are priced (and overflow-checked) by
/// [`crate::pricing::price_sale`], not here.
pub fn validate_sale_request(request: &CreateSaleRequest) -> ValidationResult<()> {
    validate_id("locationId", &request.location_id)?;

    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    for item in &request.items {
        validate_id("productId", &item.product_id)?;
        validate_quantity(item.quantity)?;
        validate_amount_cents("unitPriceCents", item.unit_price_cents)?;
        validate_amount_cents("discountCents", item.discount_cents)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
