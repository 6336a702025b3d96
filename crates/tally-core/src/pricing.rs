//! # Pricing
//!
//! Sale totals from checkout lines.
//!
//! ```text
//!   line.total_price = quantity × unit_price − line.discount
//!   subtotal         = Σ quantity × unit_price
//!   discount         = Σ line.discount
//!   total            = subtotal − discount        (not clamped at zero)
//! ```
//!
//! Promotions and gift certificates are priced upstream; by the time a
//! request reaches this module every discount is a plain per-line amount.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::CreateSaleItem;

/// One priced checkout line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    /// `quantity × unit_price`.
    pub gross: Money,
    pub discount: Money,
    /// `gross − discount`.
    pub total_price: Money,
}

/// Header amounts of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

/// A fully priced sale: one entry per request line, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedSale {
    pub lines: Vec<PricedLine>,
    pub totals: SaleTotals,
}

fn overflow(field: &str) -> ValidationError {
    ValidationError::Overflow {
        field: field.to_string(),
    }
}

/// Prices a single line.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::pricing::price_line;
///
/// let line = price_line(2, Money::from_cents(100), Money::from_cents(500)).unwrap();
/// assert_eq!(line.total_price.cents(), -300);
/// ```
pub fn price_line(
    quantity: i64,
    unit_price: Money,
    discount: Money,
) -> Result<PricedLine, ValidationError> {
    let gross = unit_price
        .checked_mul_quantity(quantity)
        .ok_or_else(|| overflow("unitPriceCents"))?;
    let total_price = gross
        .checked_sub(discount)
        .ok_or_else(|| overflow("discountCents"))?;

    Ok(PricedLine {
        gross,
        discount,
        total_price,
    })
}

/// Prices every line of a checkout and sums the header amounts.
pub fn price_sale(items: &[CreateSaleItem]) -> Result<PricedSale, ValidationError> {
    let mut lines = Vec::with_capacity(items.len());
    let mut totals = SaleTotals::default();

    for item in items {
        let line = price_line(
            item.quantity,
            Money::from_cents(item.unit_price_cents),
            Money::from_cents(item.discount_cents),
        )?;

        totals.subtotal = totals
            .subtotal
            .checked_add(line.gross)
            .ok_or_else(|| overflow("subtotal"))?;
        totals.discount = totals
            .discount
            .checked_add(line.discount)
            .ok_or_else(|| overflow("discount"))?;
        lines.push(line);
    }

    totals.total = totals
        .subtotal
        .checked_sub(totals.discount)
        .ok_or_else(|| overflow("total"))?;

    Ok(PricedSale { lines, totals })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(qty: i64, price: i64, discount: i64) -> CreateSaleItem {
        CreateSaleItem {
            product_id: "p".to_string(),
            quantity: qty,
            unit_price_cents: price,
            discount_cents: discount,
            is_gift: false,
        }
    }

    #[test]
    fn test_price_sale_sums_lines() {
        let priced = price_sale(&[item(2, 1500, 100), item(1, 999, 0), item(3, 250, 50)]).unwrap();

        assert_eq!(priced.lines.len(), 3);
        assert_eq!(priced.lines[0].total_price.cents(), 2900);
        assert_eq!(priced.lines[2].total_price.cents(), 700);

        assert_eq!(priced.totals.subtotal.cents(), 3000 + 999 + 750);
        assert_eq!(priced.totals.discount.cents(), 150);
        assert_eq!(priced.totals.total.cents(), 4749 - 150);
    }

    #[test]
    fn test_negative_total_is_kept() {
        let priced = price_sale(&[item(1, 100, 300)]).unwrap();
        assert_eq!(priced.totals.total.cents(), -200);
    }

    #[test]
    fn test_free_gift_line() {
        let priced = price_sale(&[item(1, 0, 0)]).unwrap();
        assert!(priced.totals.total.is_zero());
    }

    #[test]
    fn test_overflow_is_a_validation_error() {
        let result = price_sale(&[item(i64::MAX, 2, 0)]);
        assert!(matches!(result, Err(ValidationError::Overflow { .. })));

        let result = price_sale(&[item(1, i64::MAX, 0), item(1, 1, 0)]);
        assert!(matches!(result, Err(ValidationError::Overflow { .. })));
    }
}
