//! # Document Numbering
//!
//! Human-readable numbers for sales and movements.
//!
//! ```text
//!   SALE-20261019-0042        sale, 4-digit daily sequence
//!   RCP-20261019-000007       movement, 6-digit daily sequence per prefix
//!   └┬┘ └──┬───┘ └──┬──┘
//!  prefix  day    sequence (starts at 1 each day, grows past the pad width)
//! ```
//!
//! Formatting and parsing live here; picking the next sequence number has to
//! happen under the database write lock and lives in `tally-db`.

use chrono::NaiveDate;

use crate::types::MovementType;

/// Prefix of every sale number.
pub const SALE_PREFIX: &str = "SALE";

/// Zero-pad width of the sale sequence.
pub const SALE_SEQUENCE_WIDTH: usize = 4;

/// Zero-pad width of the movement sequence.
pub const MOVEMENT_SEQUENCE_WIDTH: usize = 6;

/// `PREFIX-YYYYMMDD-` for a given day.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tally_core::numbering::day_prefix;
///
/// let day = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
/// assert_eq!(day_prefix("SALE", day), "SALE-20260307-");
/// ```
pub fn day_prefix(prefix: &str, day: NaiveDate) -> String {
    format!("{}-{}-", prefix, day.format("%Y%m%d"))
}

/// Formats a sale number.
pub fn format_sale_number(day: NaiveDate, sequence: u64) -> String {
    format!(
        "{}{:0width$}",
        day_prefix(SALE_PREFIX, day),
        sequence,
        width = SALE_SEQUENCE_WIDTH
    )
}

/// Formats a movement number.
pub fn format_movement_number(kind: MovementType, day: NaiveDate, sequence: u64) -> String {
    format!(
        "{}{:0width$}",
        day_prefix(kind.number_prefix(), day),
        sequence,
        width = MOVEMENT_SEQUENCE_WIDTH
    )
}

/// Extracts the sequence of a number that starts with `day_prefix`.
///
/// Returns `None` for numbers from another day/prefix or with a non-numeric
/// suffix.
pub fn parse_sequence(number: &str, day_prefix: &str) -> Option<u64> {
    let suffix = number.strip_prefix(day_prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Sequence following the highest one issued so far (1 when none).
pub fn next_sequence(max_issued: Option<u64>) -> u64 {
    max_issued.map_or(1, |max| max + 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_sale_number_format() {
        assert_eq!(format_sale_number(day(), 1), "SALE-20261019-0001");
        assert_eq!(format_sale_number(day(), 42), "SALE-20261019-0042");
        assert_eq!(format_sale_number(day(), 12345), "SALE-20261019-12345");
    }

    #[test]
    fn test_movement_number_format() {
        assert_eq!(
            format_movement_number(MovementType::Receipt, day(), 7),
            "RCP-20261019-000007"
        );
        assert_eq!(
            format_movement_number(MovementType::WriteOff, day(), 1),
            "WOF-20261019-000001"
        );
        assert_eq!(
            format_movement_number(MovementType::Sale, day(), 3),
            "SALE-20261019-000003"
        );
    }

    #[test]
    fn test_parse_sequence() {
        let prefix = day_prefix(SALE_PREFIX, day());
        assert_eq!(parse_sequence("SALE-20261019-0042", &prefix), Some(42));
        assert_eq!(parse_sequence("SALE-20261019-10000", &prefix), Some(10000));
        assert_eq!(parse_sequence("SALE-20261018-0042", &prefix), None);
        assert_eq!(parse_sequence("SALE-20261019-", &prefix), None);
        assert_eq!(parse_sequence("SALE-20261019-00a1", &prefix), None);
    }

    #[test]
    fn test_next_sequence() {
        assert_eq!(next_sequence(None), 1);
        assert_eq!(next_sequence(Some(9999)), 10000);
    }
}
