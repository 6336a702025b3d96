//! # Stock Ledger
//!
//! Authoritative per-(product, location) quantity and reservation
//! bookkeeping. Every quantity change is paired with one movement in the
//! same transaction.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  operation   quantity        reserved        guard             movement │
//! │  ─────────   ────────        ────────        ─────             ──────── │
//! │  receipt     + qty           ·               ·                 RCP  →to │
//! │  transfer    − qty @from     ·               available ≥ qty   TRF      │
//! │              + qty @to                                                  │
//! │  write_off   − qty           ·               available ≥ qty   WOF from→│
//! │  adjust      = counted       ·               counted ≥ reserved ADJ ±   │
//! │  reserve     ·               + qty           available ≥ qty   ·        │
//! │  unreserve   ·               − qty           reserved ≥ qty    ·        │
//! │  sell        − qty           − qty           reserved ≥ qty    SALE     │
//! │                                                                         │
//! │  available = quantity − reserved_quantity                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## No Oversell
//! Each guard is part of the `UPDATE`'s `WHERE` clause, so the check and the
//! write are one statement under the SQLite write lock. Zero affected rows
//! means the guard failed; the row is re-read for the error message.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tally_core::validation::{
    validate_counted_quantity, validate_distinct_locations, validate_id,
    validate_optional_reason, validate_quantity, validate_reason,
};
use tally_core::{
    AdjustRequest, CoreError, Movement, MovementType, NewMovement, ReceiptRequest, StockLevel,
    StockRecord, TransferRequest, ValidationError, WriteOffRequest, MAX_QUANTITY,
};

use super::movement;
use crate::error::{DbError, DbResult};

const LEVEL_SELECT: &str = r#"
    SELECT s.product_id AS product_id,
           p.sku AS product_sku,
           p.name AS product_name,
           s.location_id AS location_id,
           l.name AS location_name,
           l.location_type AS location_type,
           s.quantity AS quantity,
           s.reserved_quantity AS reserved_quantity,
           s.quantity - s.reserved_quantity AS available,
           s.updated_at AS updated_at
    FROM stock s
    JOIN products p ON p.id = s.product_id
    JOIN locations l ON l.id = s.location_id
"#;

/// Repository for stock ledger operations.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    /// Creates a new StockLedger.
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns the record for a pair, creating it at zero if absent.
    pub async fn get_or_create(&self, product_id: &str, location_id: &str) -> DbResult<StockRecord> {
        validate_id("productId", product_id)?;
        validate_id("locationId", location_id)?;

        let mut tx = self.pool.begin().await?;
        let record = ensure_record(&mut tx, product_id, location_id).await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Gets the enriched stock level of one pair, if a record exists.
    pub async fn get(&self, product_id: &str, location_id: &str) -> DbResult<Option<StockLevel>> {
        let sql = format!("{LEVEL_SELECT} WHERE s.product_id = ?1 AND s.location_id = ?2");
        let level = sqlx::query_as::<_, StockLevel>(&sql)
            .bind(product_id)
            .bind(location_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(level)
    }

    /// All stock at a location, by product name.
    pub async fn get_by_location(&self, location_id: &str) -> DbResult<Vec<StockLevel>> {
        let sql = format!("{LEVEL_SELECT} WHERE s.location_id = ?1 ORDER BY p.name, p.sku");
        let levels = sqlx::query_as::<_, StockLevel>(&sql)
            .bind(location_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(location_id = %location_id, count = levels.len(), "Stock by location");
        Ok(levels)
    }

    /// Stock of one product across every location, by location name.
    pub async fn get_by_product(&self, product_id: &str) -> DbResult<Vec<StockLevel>> {
        let sql = format!("{LEVEL_SELECT} WHERE s.product_id = ?1 ORDER BY l.name");
        let levels = sqlx::query_as::<_, StockLevel>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(product_id = %product_id, count = levels.len(), "Stock by product");
        Ok(levels)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Receives stock at a location.
    pub async fn receipt(&self, request: &ReceiptRequest, actor_id: &str) -> DbResult<Movement> {
        validate_id("productId", &request.product_id)?;
        validate_id("locationId", &request.location_id)?;
        validate_id("performedBy", actor_id)?;
        validate_quantity(request.quantity)?;
        let reason = validate_optional_reason(request.reason.as_deref())?;

        let mut tx = self.pool.begin().await?;

        increase_in(&mut tx, &request.product_id, &request.location_id, request.quantity).await?;
        let movement = movement::append(
            &mut tx,
            NewMovement {
                movement_type: MovementType::Receipt,
                product_id: request.product_id.clone(),
                from_location_id: None,
                to_location_id: Some(request.location_id.clone()),
                quantity: request.quantity,
                reason,
                performed_by: actor_id.to_string(),
                sale_id: None,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            movement_number = %movement.movement_number,
            product_id = %request.product_id,
            location_id = %request.location_id,
            quantity = request.quantity,
            "Stock received"
        );
        Ok(movement)
    }

    /// Moves stock between two locations in one transaction.
    pub async fn transfer(&self, request: &TransferRequest, actor_id: &str) -> DbResult<Movement> {
        validate_id("productId", &request.product_id)?;
        validate_id("fromLocationId", &request.from_location_id)?;
        validate_id("toLocationId", &request.to_location_id)?;
        validate_id("performedBy", actor_id)?;
        validate_distinct_locations(&request.from_location_id, &request.to_location_id)?;
        validate_quantity(request.quantity)?;
        let reason = validate_optional_reason(request.reason.as_deref())?;

        let product_id = request.product_id.as_str();
        let (from, to) = (request.from_location_id.as_str(), request.to_location_id.as_str());

        let mut tx = self.pool.begin().await?;

        // both rows exist before either is touched, in location-id order
        let (first, second) = if from < to { (from, to) } else { (to, from) };
        ensure_record(&mut tx, product_id, first).await?;
        ensure_record(&mut tx, product_id, second).await?;

        decrease_available_in(&mut tx, product_id, from, request.quantity).await?;
        increase_in(&mut tx, product_id, to, request.quantity).await?;

        let movement = movement::append(
            &mut tx,
            NewMovement {
                movement_type: MovementType::Transfer,
                product_id: product_id.to_string(),
                from_location_id: Some(from.to_string()),
                to_location_id: Some(to.to_string()),
                quantity: request.quantity,
                reason,
                performed_by: actor_id.to_string(),
                sale_id: None,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            movement_number = %movement.movement_number,
            product_id = %product_id,
            from = %from,
            to = %to,
            quantity = request.quantity,
            "Stock transferred"
        );
        Ok(movement)
    }

    /// Removes damaged, expired or lost stock. A reason is mandatory.
    pub async fn write_off(&self, request: &WriteOffRequest, actor_id: &str) -> DbResult<Movement> {
        validate_id("productId", &request.product_id)?;
        validate_id("locationId", &request.location_id)?;
        validate_id("performedBy", actor_id)?;
        validate_quantity(request.quantity)?;
        let reason = validate_reason(&request.reason)?;

        let mut tx = self.pool.begin().await?;

        decrease_available_in(&mut tx, &request.product_id, &request.location_id, request.quantity)
            .await?;
        let movement = movement::append(
            &mut tx,
            NewMovement {
                movement_type: MovementType::WriteOff,
                product_id: request.product_id.clone(),
                from_location_id: Some(request.location_id.clone()),
                to_location_id: None,
                quantity: request.quantity,
                reason: Some(reason),
                performed_by: actor_id.to_string(),
                sale_id: None,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            movement_number = %movement.movement_number,
            product_id = %request.product_id,
            location_id = %request.location_id,
            quantity = request.quantity,
            "Stock written off"
        );
        Ok(movement)
    }

    /// Sets a pair's quantity to a stock-take count.
    ///
    /// Writes one adjustment movement for `|counted - quantity|`, inbound when
    /// the count is higher, outbound when lower. Returns `None` (and writes no
    /// movement) when the count matches.
    pub async fn adjust(
        &self,
        request: &AdjustRequest,
        actor_id: &str,
    ) -> DbResult<Option<Movement>> {
        validate_id("productId", &request.product_id)?;
        validate_id("locationId", &request.location_id)?;
        validate_id("performedBy", actor_id)?;
        validate_counted_quantity(request.counted_quantity)?;
        let reason = validate_reason(&request.reason)?;

        let product_id = request.product_id.as_str();
        let location_id = request.location_id.as_str();

        let mut tx = self.pool.begin().await?;

        let current = ensure_record(&mut tx, product_id, location_id).await?;
        if request.counted_quantity < current.reserved_quantity {
            warn!(
                product_id = %product_id,
                location_id = %location_id,
                counted = request.counted_quantity,
                reserved = current.reserved_quantity,
                "Adjustment below reserved quantity rejected"
            );
            return Err(ValidationError::BelowMinimum {
                field: "countedQuantity".to_string(),
                min: current.reserved_quantity,
            }
            .into());
        }

        let delta = request.counted_quantity - current.quantity;
        if delta == 0 {
            tx.commit().await?;
            debug!(product_id = %product_id, location_id = %location_id, "Count matches, nothing to adjust");
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE stock
            SET quantity = ?3, updated_at = ?4
            WHERE product_id = ?1 AND location_id = ?2
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .bind(request.counted_quantity)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let (from_location_id, to_location_id) = if delta > 0 {
            (None, Some(location_id.to_string()))
        } else {
            (Some(location_id.to_string()), None)
        };

        let movement = movement::append(
            &mut tx,
            NewMovement {
                movement_type: MovementType::Adjustment,
                product_id: product_id.to_string(),
                from_location_id,
                to_location_id,
                quantity: delta.abs(),
                reason: Some(reason),
                performed_by: actor_id.to_string(),
                sale_id: None,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            movement_number = %movement.movement_number,
            product_id = %product_id,
            location_id = %location_id,
            from = current.quantity,
            to = request.counted_quantity,
            "Stock adjusted"
        );
        Ok(Some(movement))
    }

    /// Earmarks stock for an in-flight sale.
    pub async fn reserve(
        &self,
        product_id: &str,
        location_id: &str,
        qty: i64,
    ) -> DbResult<StockRecord> {
        validate_quantity(qty)?;

        let mut tx = self.pool.begin().await?;
        let record = reserve_in(&mut tx, product_id, location_id, qty).await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Releases a reservation. Releasing more than is reserved fails.
    pub async fn unreserve(
        &self,
        product_id: &str,
        location_id: &str,
        qty: i64,
    ) -> DbResult<StockRecord> {
        validate_quantity(qty)?;

        let mut tx = self.pool.begin().await?;
        let record = unreserve_in(&mut tx, product_id, location_id, qty).await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Converts a reservation into a physical deduction.
    pub async fn sell(
        &self,
        product_id: &str,
        location_id: &str,
        qty: i64,
        actor_id: &str,
        sale_id: &str,
    ) -> DbResult<Movement> {
        validate_quantity(qty)?;
        validate_id("performedBy", actor_id)?;
        validate_id("saleId", sale_id)?;

        let mut tx = self.pool.begin().await?;
        let movement = sell_in(&mut tx, product_id, location_id, qty, actor_id, sale_id).await?;
        tx.commit().await?;

        Ok(movement)
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================
// These run on the caller's connection and never commit; the sale workflow
// composes them into one checkout transaction.

/// Inserts the pair's row at zero if missing, then returns it.
pub(crate) async fn ensure_record(
    conn: &mut SqliteConnection,
    product_id: &str,
    location_id: &str,
) -> DbResult<StockRecord> {
    sqlx::query(
        r#"
        INSERT INTO stock (id, product_id, location_id, quantity, reserved_quantity, updated_at)
        VALUES (?1, ?2, ?3, 0, 0, ?4)
        ON CONFLICT (product_id, location_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(product_id)
    .bind(location_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    fetch_record(conn, product_id, location_id).await
}

async fn fetch_record(
    conn: &mut SqliteConnection,
    product_id: &str,
    location_id: &str,
) -> DbResult<StockRecord> {
    sqlx::query_as::<_, StockRecord>(
        r#"
        SELECT id, product_id, location_id, quantity, reserved_quantity, updated_at
        FROM stock
        WHERE product_id = ?1 AND location_id = ?2
        "#,
    )
    .bind(product_id)
    .bind(location_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Stock", format!("{product_id}@{location_id}")))
}

/// `quantity += qty` while the result stays within [`MAX_QUANTITY`].
pub(crate) async fn increase_in(
    conn: &mut SqliteConnection,
    product_id: &str,
    location_id: &str,
    qty: i64,
) -> DbResult<StockRecord> {
    ensure_record(conn, product_id, location_id).await?;

    let result = sqlx::query(
        r#"
        UPDATE stock
        SET quantity = quantity + ?3, updated_at = ?4
        WHERE product_id = ?1 AND location_id = ?2
          AND quantity <= ?5 - ?3
        "#,
    )
    .bind(product_id)
    .bind(location_id)
    .bind(qty)
    .bind(Utc::now())
    .bind(MAX_QUANTITY)
    .execute(&mut *conn)
    .await?;

    let record = fetch_record(conn, product_id, location_id).await?;
    if result.rows_affected() == 0 {
        warn!(
            product_id = %product_id,
            location_id = %location_id,
            quantity = record.quantity,
            requested = qty,
            "Increase would exceed the quantity limit"
        );
        return Err(ValidationError::Overflow {
            field: "quantity".to_string(),
        }
        .into());
    }
    Ok(record)
}

/// `quantity -= qty` when `available >= qty`.
pub(crate) async fn decrease_available_in(
    conn: &mut SqliteConnection,
    product_id: &str,
    location_id: &str,
    qty: i64,
) -> DbResult<StockRecord> {
    ensure_record(conn, product_id, location_id).await?;

    let result = sqlx::query(
        r#"
        UPDATE stock
        SET quantity = quantity - ?3, updated_at = ?4
        WHERE product_id = ?1 AND location_id = ?2
          AND quantity - reserved_quantity >= ?3
        "#,
    )
    .bind(product_id)
    .bind(location_id)
    .bind(qty)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    let record = fetch_record(conn, product_id, location_id).await?;
    if result.rows_affected() == 0 {
        return Err(insufficient_stock(&record, qty));
    }
    Ok(record)
}

/// `reserved_quantity += qty` when `available >= qty`.
pub(crate) async fn reserve_in(
    conn: &mut SqliteConnection,
    product_id: &str,
    location_id: &str,
    qty: i64,
) -> DbResult<StockRecord> {
    ensure_record(conn, product_id, location_id).await?;

    let result = sqlx::query(
        r#"
        UPDATE stock
        SET reserved_quantity = reserved_quantity + ?3, updated_at = ?4
        WHERE product_id = ?1 AND location_id = ?2
          AND quantity - reserved_quantity >= ?3
        "#,
    )
    .bind(product_id)
    .bind(location_id)
    .bind(qty)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    let record = fetch_record(conn, product_id, location_id).await?;
    if result.rows_affected() == 0 {
        return Err(insufficient_stock(&record, qty));
    }

    debug!(
        product_id = %product_id,
        location_id = %location_id,
        qty,
        reserved = record.reserved_quantity,
        "Stock reserved"
    );
    Ok(record)
}

/// `reserved_quantity -= qty` when `reserved_quantity >= qty`.
pub(crate) async fn unreserve_in(
    conn: &mut SqliteConnection,
    product_id: &str,
    location_id: &str,
    qty: i64,
) -> DbResult<StockRecord> {
    ensure_record(conn, product_id, location_id).await?;

    let result = sqlx::query(
        r#"
        UPDATE stock
        SET reserved_quantity = reserved_quantity - ?3, updated_at = ?4
        WHERE product_id = ?1 AND location_id = ?2
          AND reserved_quantity >= ?3
        "#,
    )
    .bind(product_id)
    .bind(location_id)
    .bind(qty)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    let record = fetch_record(conn, product_id, location_id).await?;
    if result.rows_affected() == 0 {
        return Err(insufficient_reservation(&record, qty));
    }

    debug!(
        product_id = %product_id,
        location_id = %location_id,
        qty,
        reserved = record.reserved_quantity,
        "Reservation released"
    );
    Ok(record)
}

/// `quantity -= qty` and `reserved_quantity -= qty`, plus a sale movement.
pub(crate) async fn sell_in(
    conn: &mut SqliteConnection,
    product_id: &str,
    location_id: &str,
    qty: i64,
    actor_id: &str,
    sale_id: &str,
) -> DbResult<Movement> {
    ensure_record(conn, product_id, location_id).await?;

    let result = sqlx::query(
        r#"
        UPDATE stock
        SET quantity = quantity - ?3,
            reserved_quantity = reserved_quantity - ?3,
            updated_at = ?4
        WHERE product_id = ?1 AND location_id = ?2
          AND reserved_quantity >= ?3 AND quantity >= ?3
        "#,
    )
    .bind(product_id)
    .bind(location_id)
    .bind(qty)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let record = fetch_record(conn, product_id, location_id).await?;
        return Err(insufficient_reservation(&record, qty));
    }

    movement::append(
        conn,
        NewMovement {
            movement_type: MovementType::Sale,
            product_id: product_id.to_string(),
            from_location_id: Some(location_id.to_string()),
            to_location_id: None,
            quantity: qty,
            reason: None,
            performed_by: actor_id.to_string(),
            sale_id: Some(sale_id.to_string()),
        },
    )
    .await
}

fn insufficient_stock(record: &StockRecord, requested: i64) -> DbError {
    warn!(
        product_id = %record.product_id,
        location_id = %record.location_id,
        available = record.available(),
        requested,
        "Insufficient stock"
    );
    CoreError::insufficient_stock(
        &record.product_id,
        &record.location_id,
        record.available(),
        requested,
    )
    .into()
}

fn insufficient_reservation(record: &StockRecord, requested: i64) -> DbError {
    warn!(
        product_id = %record.product_id,
        location_id = %record.location_id,
        reserved = record.reserved_quantity,
        requested,
        "Insufficient reservation"
    );
    CoreError::insufficient_reservation(
        &record.product_id,
        &record.location_id,
        record.reserved_quantity,
        requested,
    )
    .into()
}
