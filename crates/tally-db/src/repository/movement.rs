//! # Movement Log
//!
//! Append-only audit trail of every stock-affecting event.
//!
//! ```text
//!   ledger operation (open transaction)
//!        │
//!        ├── UPDATE stock ...            quantity changes
//!        └── append(conn, NewMovement)   exactly one row, same transaction
//!                 │
//!                 ▼
//!            stock_movements   (UPDATE / DELETE abort via trigger)
//! ```
//!
//! There is no update or delete API. Appends only happen through
//! [`append`], which needs the connection of the transaction that changed the
//! stock, so a rolled-back operation never leaves a movement behind.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use tally_core::{Movement, MovementFilter, NewMovement};

use super::{clamp_limit, numbering};
use crate::error::DbResult;

const MOVEMENT_SELECT: &str = r#"
    SELECT id, movement_number, movement_type, product_id,
           from_location_id, to_location_id, quantity, reason,
           performed_by, sale_id, created_at
    FROM stock_movements
"#;

/// Read side of the movement log.
#[derive(Debug, Clone)]
pub struct MovementLog {
    pool: SqlitePool,
}

impl MovementLog {
    /// Creates a new MovementLog.
    pub fn new(pool: SqlitePool) -> Self {
        MovementLog { pool }
    }

    /// Lists movements, newest first.
    ///
    /// `location_id` matches either side of a movement.
    pub async fn list(&self, filter: &MovementFilter) -> DbResult<Vec<Movement>> {
        let mut qb = QueryBuilder::<Sqlite>::new(MOVEMENT_SELECT);
        qb.push(" WHERE 1 = 1");

        if let Some(product_id) = &filter.product_id {
            qb.push(" AND product_id = ").push_bind(product_id.clone());
        }
        if let Some(location_id) = &filter.location_id {
            qb.push(" AND (from_location_id = ")
                .push_bind(location_id.clone())
                .push(" OR to_location_id = ")
                .push_bind(location_id.clone())
                .push(")");
        }
        if let Some(sale_id) = &filter.sale_id {
            qb.push(" AND sale_id = ").push_bind(sale_id.clone());
        }
        if let Some(kind) = filter.movement_type {
            qb.push(" AND movement_type = ").push_bind(kind);
        }

        qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(clamp_limit(filter.limit));

        let movements = qb
            .build_query_as::<Movement>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = movements.len(), "Listed movements");
        Ok(movements)
    }

    /// Gets a movement by its human-readable number.
    pub async fn get_by_number(&self, movement_number: &str) -> DbResult<Option<Movement>> {
        let sql = format!("{MOVEMENT_SELECT} WHERE movement_number = ?1");
        let movement = sqlx::query_as::<_, Movement>(&sql)
            .bind(movement_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(movement)
    }
}

/// Appends a movement inside the caller's transaction.
///
/// Assigns the id, the daily-sequenced movement number and the timestamp.
pub async fn append(conn: &mut SqliteConnection, new: NewMovement) -> DbResult<Movement> {
    let now = Utc::now();
    let movement_number =
        numbering::next_movement_number(conn, new.movement_type, now.date_naive()).await?;

    let movement = Movement {
        id: Uuid::new_v4().to_string(),
        movement_number,
        movement_type: new.movement_type,
        product_id: new.product_id,
        from_location_id: new.from_location_id,
        to_location_id: new.to_location_id,
        quantity: new.quantity,
        reason: new.reason,
        performed_by: new.performed_by,
        sale_id: new.sale_id,
        created_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, movement_number, movement_type, product_id,
            from_location_id, to_location_id, quantity, reason,
            performed_by, sale_id, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8,
            ?9, ?10, ?11
        )
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.movement_number)
    .bind(movement.movement_type)
    .bind(&movement.product_id)
    .bind(&movement.from_location_id)
    .bind(&movement.to_location_id)
    .bind(movement.quantity)
    .bind(&movement.reason)
    .bind(&movement.performed_by)
    .bind(&movement.sale_id)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    debug!(
        movement_number = %movement.movement_number,
        movement_type = %movement.movement_type,
        product_id = %movement.product_id,
        quantity = movement.quantity,
        "Movement appended"
    );

    Ok(movement)
}
