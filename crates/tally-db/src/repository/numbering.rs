//! # Sale & Movement Numbering
//!
//! Picks the next daily sequence for a document prefix.
//!
//! ```text
//!   touch day lock / earlier write   ──► write lock held
//!          │
//!          ▼
//!   highest issued number for "SALE-20261019-"   (range scan on UNIQUE index)
//!          │
//!          ▼
//!   parse suffix, +1, pad                         SALE-20261019-0043
//!          │
//!          ▼
//!   INSERT in the same transaction; UNIQUE(sale_number) as backstop
//! ```
//!
//! Both functions must run inside a transaction that already holds the
//! write lock, otherwise two writers can compute the same number.

use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use tally_core::numbering::{
    day_prefix, format_movement_number, format_sale_number, next_sequence, parse_sequence,
    SALE_PREFIX,
};
use tally_core::MovementType;

use crate::error::DbResult;

/// Next `SALE-YYYYMMDD-NNNN` for `day`.
///
/// Touches the day's row in `sale_number_days` first, which takes the write
/// lock when the caller has not written anything yet.
pub async fn next_sale_number(conn: &mut SqliteConnection, day: NaiveDate) -> DbResult<String> {
    sqlx::query(
        r#"
        INSERT INTO sale_number_days (day, touched_at)
        VALUES (?1, ?2)
        ON CONFLICT (day) DO UPDATE SET touched_at = excluded.touched_at
        "#,
    )
    .bind(day.format("%Y%m%d").to_string())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    let prefix = day_prefix(SALE_PREFIX, day);
    let latest = latest_number(conn, LatestOf::Sales, &prefix).await?;
    let sequence = next_sequence(latest.as_deref().and_then(|n| parse_sequence(n, &prefix)));
    let number = format_sale_number(day, sequence);

    debug!(sale_number = %number, "Allocated sale number");
    Ok(number)
}

/// Next `PREFIX-YYYYMMDD-NNNNNN` for a movement kind on `day`.
pub async fn next_movement_number(
    conn: &mut SqliteConnection,
    kind: MovementType,
    day: NaiveDate,
) -> DbResult<String> {
    let prefix = day_prefix(kind.number_prefix(), day);
    let latest = latest_number(conn, LatestOf::Movements, &prefix).await?;
    let sequence = next_sequence(latest.as_deref().and_then(|n| parse_sequence(n, &prefix)));
    Ok(format_movement_number(kind, day, sequence))
}

enum LatestOf {
    Sales,
    Movements,
}

/// Highest number starting with `prefix`.
///
/// All suffixes are digits, so "longest, then lexicographically greatest" is
/// the numeric maximum even after the sequence outgrows its padding. The
/// range `prefix < n < prefix-with-'-'-bumped-to-'.'` selects exactly the
/// numbers under `prefix` and can use the UNIQUE index.
async fn latest_number(
    conn: &mut SqliteConnection,
    of: LatestOf,
    prefix: &str,
) -> DbResult<Option<String>> {
    let sql = match of {
        LatestOf::Sales => {
            r#"
            SELECT sale_number FROM sales
            WHERE sale_number > ?1 AND sale_number < ?2
            ORDER BY length(sale_number) DESC, sale_number DESC
            LIMIT 1
            "#
        }
        LatestOf::Movements => {
            r#"
            SELECT movement_number FROM stock_movements
            WHERE movement_number > ?1 AND movement_number < ?2
            ORDER BY length(movement_number) DESC, movement_number DESC
            LIMIT 1
            "#
        }
    };

    let upper = format!("{}.", prefix.trim_end_matches('-'));

    let latest: Option<String> = sqlx::query_scalar(sql)
        .bind(prefix)
        .bind(upper)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(latest)
}
