//! # Sale Workflow
//!
//! Checkout as a single unit of work, plus completion and cancellation.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  create(request, cashier)                  ONE transaction             │
//! │  ├── 1. next_sale_number()   SALE-YYYYMMDD-NNNN (day lock taken)       │
//! │  ├── 2. price_sale()         subtotal − discount = total               │
//! │  ├── 3. INSERT sale (pending) + sale_items                             │
//! │  ├── 4. reserve_in() per line ──► InsufficientStock → ROLLBACK all     │
//! │  ├── 5. complete: pending → completed, sell_in() per line              │
//! │  └── 6. COMMIT, return SaleDetail                                      │
//! │                                                                         │
//! │  complete_sale(id)   pending → completed   (sell each line)            │
//! │  cancel(id)          pending → cancelled   (unreserve each line)       │
//! │  completed / cancelled are terminal here; refunds live elsewhere       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status changes are claimed with `UPDATE ... WHERE status = 'pending'`, so
//! two racing completions (or a completion racing a cancellation) cannot
//! both apply.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tally_core::pricing::{price_sale, PricedSale};
use tally_core::validation::{validate_id, validate_sale_request};
use tally_core::{
    CoreError, CreateSaleRequest, Sale, SaleDetail, SaleFilter, SaleItem, SaleListing,
    SaleStatus, MAX_SALE_ITEMS,
};

use super::{clamp_limit, numbering, stock};
use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = r#"
    s.id AS id,
    s.sale_number AS sale_number,
    s.location_id AS location_id,
    s.cashier_id AS cashier_id,
    s.customer_phone AS customer_phone,
    s.customer_name AS customer_name,
    s.subtotal_cents AS subtotal_cents,
    s.discount_cents AS discount_cents,
    s.total_cents AS total_cents,
    s.payment_method AS payment_method,
    s.status AS status,
    s.promotion_id AS promotion_id,
    s.certificate_id AS certificate_id,
    s.notes AS notes,
    s.created_at AS created_at,
    s.updated_at AS updated_at,
    s.completed_at AS completed_at
"#;

/// A sale row joined with its display names.
#[derive(Debug, FromRow)]
struct SaleWithNames {
    #[sqlx(flatten)]
    sale: Sale,
    location_name: Option<String>,
    cashier_name: Option<String>,
}

/// Repository for the sale workflow.
#[derive(Debug, Clone)]
pub struct SaleWorkflow {
    pool: SqlitePool,
}

impl SaleWorkflow {
    /// Creates a new SaleWorkflow.
    pub fn new(pool: SqlitePool) -> Self {
        SaleWorkflow { pool }
    }

    /// Rings up a sale: number, persist, reserve every line, complete.
    ///
    /// All-or-nothing. If any line cannot be reserved no sale row, item,
    /// reservation or movement survives.
    pub async fn create(
        &self,
        request: &CreateSaleRequest,
        cashier_id: &str,
    ) -> DbResult<SaleDetail> {
        if request.items.len() > MAX_SALE_ITEMS {
            return Err(CoreError::SaleTooLarge {
                max: MAX_SALE_ITEMS,
            }
            .into());
        }
        validate_sale_request(request)?;
        validate_id("cashierId", cashier_id)?;
        let priced = price_sale(&request.items)?;

        debug!(
            location_id = %request.location_id,
            lines = request.items.len(),
            total = %priced.totals.total,
            "Creating sale"
        );

        let mut tx = self.pool.begin().await?;

        let sale = open_in(&mut tx, request, &priced, cashier_id).await?;
        complete_in(&mut tx, &sale.id, cashier_id).await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            total = %sale.total(),
            "Sale completed"
        );

        self.get(&sale.id).await
    }

    /// Completes a pending sale: each line's reservation becomes a deduction.
    pub async fn complete_sale(&self, sale_id: &str, actor_id: &str) -> DbResult<SaleDetail> {
        validate_id("saleId", sale_id)?;
        validate_id("performedBy", actor_id)?;

        let mut tx = self.pool.begin().await?;
        complete_in(&mut tx, sale_id, actor_id).await?;
        tx.commit().await?;

        info!(sale_id = %sale_id, "Sale completed");
        self.get(sale_id).await
    }

    /// Cancels a pending sale and releases its reservations.
    ///
    /// Completed sales need a refund instead; cancelled sales stay cancelled.
    pub async fn cancel(&self, sale_id: &str) -> DbResult<SaleDetail> {
        validate_id("saleId", sale_id)?;

        let mut tx = self.pool.begin().await?;

        let claimed = claim_status(&mut tx, sale_id, SaleStatus::Cancelled, None).await?;
        if !claimed {
            return Err(status_error(&mut tx, sale_id, "cancel").await);
        }

        let sale = fetch_sale(&mut tx, sale_id).await?;
        for item in fetch_items(&mut tx, sale_id).await? {
            stock::unreserve_in(&mut tx, &item.product_id, &sale.location_id, item.quantity)
                .await?;
        }

        tx.commit().await?;

        info!(sale_id = %sale_id, sale_number = %sale.sale_number, "Sale cancelled");
        self.get(sale_id).await
    }

    /// Loads a sale with its items and display names.
    pub async fn get(&self, sale_id: &str) -> DbResult<SaleDetail> {
        let sql = format!(
            r#"
            SELECT {SALE_COLUMNS},
                   l.name AS location_name,
                   u.full_name AS cashier_name
            FROM sales s
            LEFT JOIN locations l ON l.id = s.location_id
            LEFT JOIN users u ON u.id = s.cashier_id
            WHERE s.id = ?1
            "#
        );

        let row = sqlx::query_as::<_, SaleWithNames>(&sql)
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let mut conn = self.pool.acquire().await?;
        let items = fetch_items(&mut conn, sale_id).await?;

        Ok(SaleDetail {
            sale: row.sale,
            items,
            location_name: row.location_name,
            cashier_name: row.cashier_name,
        })
    }

    /// Lists sales newest first, with the total count of matches.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<SaleListing> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM sales s WHERE 1 = 1");
        push_sale_filters(&mut count_qb, filter);
        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {SALE_COLUMNS} FROM sales s WHERE 1 = 1"
        ));
        push_sale_filters(&mut qb, filter);
        qb.push(" ORDER BY s.created_at DESC, s.rowid DESC LIMIT ")
            .push_bind(clamp_limit(filter.limit));

        let data = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;

        debug!(count = data.len(), total, "Listed sales");
        Ok(SaleListing { data, total })
    }
}

fn push_sale_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &SaleFilter) {
    if let Some(location_id) = &filter.location_id {
        qb.push(" AND s.location_id = ").push_bind(location_id.clone());
    }
    if let Some(cashier_id) = &filter.cashier_id {
        qb.push(" AND s.cashier_id = ").push_bind(cashier_id.clone());
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND s.created_at >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND s.created_at <= ").push_bind(end);
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Numbers and persists a pending sale and reserves every line.
async fn open_in(
    conn: &mut SqliteConnection,
    request: &CreateSaleRequest,
    priced: &PricedSale,
    cashier_id: &str,
) -> DbResult<Sale> {
    let now = Utc::now();
    // first statement is a write: the day lock serializes numbering
    let sale_number = numbering::next_sale_number(conn, now.date_naive()).await?;

    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        sale_number,
        location_id: request.location_id.clone(),
        cashier_id: cashier_id.to_string(),
        customer_phone: request.customer_phone.clone(),
        customer_name: request.customer_name.clone(),
        subtotal_cents: priced.totals.subtotal.cents(),
        discount_cents: priced.totals.discount.cents(),
        total_cents: priced.totals.total.cents(),
        payment_method: request.payment_method,
        status: SaleStatus::Pending,
        promotion_id: request.promotion_id.clone(),
        certificate_id: request.certificate_id.clone(),
        notes: request.notes.clone(),
        created_at: now,
        updated_at: now,
        completed_at: None,
    };

    insert_sale(conn, &sale).await?;

    for (item, line) in request.items.iter().zip(&priced.lines) {
        let sale_item = SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale.id.clone(),
            product_id: item.product_id.clone(),
            product_sku: None,
            product_name: None,
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            discount_cents: line.discount.cents(),
            total_price_cents: line.total_price.cents(),
            is_gift: item.is_gift,
            created_at: now,
        };
        insert_item(conn, &sale_item).await?;
    }

    for item in &request.items {
        stock::reserve_in(conn, &item.product_id, &sale.location_id, item.quantity).await?;
    }

    debug!(sale_id = %sale.id, sale_number = %sale.sale_number, "Sale opened");
    Ok(sale)
}

/// pending → completed, then sells every line.
async fn complete_in(conn: &mut SqliteConnection, sale_id: &str, actor_id: &str) -> DbResult<()> {
    let claimed = claim_status(conn, sale_id, SaleStatus::Completed, Some(Utc::now())).await?;
    if !claimed {
        return Err(status_error(conn, sale_id, "complete").await);
    }

    let sale = fetch_sale(conn, sale_id).await?;
    for item in fetch_items(conn, sale_id).await? {
        stock::sell_in(
            conn,
            &item.product_id,
            &sale.location_id,
            item.quantity,
            actor_id,
            sale_id,
        )
        .await?;
    }

    Ok(())
}

/// Moves a pending sale to `next`. `false` when the sale is missing or not pending.
async fn claim_status(
    conn: &mut SqliteConnection,
    sale_id: &str,
    next: SaleStatus,
    completed_at: Option<DateTime<Utc>>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE sales
        SET status = ?2,
            completed_at = COALESCE(?3, completed_at),
            updated_at = ?4
        WHERE id = ?1 AND status = ?5
        "#,
    )
    .bind(sale_id)
    .bind(next)
    .bind(completed_at)
    .bind(Utc::now())
    .bind(SaleStatus::Pending)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Explains a failed claim: the sale is missing or in the wrong state.
async fn status_error(conn: &mut SqliteConnection, sale_id: &str, operation: &str) -> DbError {
    let status = sqlx::query_scalar::<_, SaleStatus>("SELECT status FROM sales WHERE id = ?1")
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await;

    match status {
        Ok(Some(current)) => {
            warn!(sale_id = %sale_id, status = %current, operation, "Invalid sale transition");
            CoreError::invalid_status(sale_id, current, operation).into()
        }
        Ok(None) => CoreError::SaleNotFound(sale_id.to_string()).into(),
        Err(e) => e.into(),
    }
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, sale_number, location_id, cashier_id,
            customer_phone, customer_name,
            subtotal_cents, discount_cents, total_cents,
            payment_method, status,
            promotion_id, certificate_id, notes,
            created_at, updated_at, completed_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6,
            ?7, ?8, ?9,
            ?10, ?11,
            ?12, ?13, ?14,
            ?15, ?16, ?17
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.sale_number)
    .bind(&sale.location_id)
    .bind(&sale.cashier_id)
    .bind(&sale.customer_phone)
    .bind(&sale.customer_name)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(sale.status)
    .bind(&sale.promotion_id)
    .bind(&sale.certificate_id)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .bind(sale.completed_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id,
            quantity, unit_price_cents, discount_cents, total_price_cents,
            is_gift, created_at
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5, ?6, ?7,
            ?8, ?9
        )
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.discount_cents)
    .bind(item.total_price_cents)
    .bind(item.is_gift)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn fetch_sale(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Sale> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales s WHERE s.id = ?1");
    sqlx::query_as::<_, Sale>(&sql)
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
}

/// Items in the order they were rung up.
async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT i.id AS id,
               i.sale_id AS sale_id,
               i.product_id AS product_id,
               p.sku AS product_sku,
               p.name AS product_name,
               i.quantity AS quantity,
               i.unit_price_cents AS unit_price_cents,
               i.discount_cents AS discount_cents,
               i.total_price_cents AS total_price_cents,
               i.is_gift AS is_gift,
               i.created_at AS created_at
        FROM sale_items i
        LEFT JOIN products p ON p.id = i.product_id
        WHERE i.sale_id = ?1
        ORDER BY i.rowid
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================
// Pending sales are never visible through the public API (checkout completes
// in the same transaction), so the pending-state transitions are exercised
// here through `open_in`.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use tally_core::{
        CreateSaleItem, LocationType, MovementFilter, MovementType, PaymentMethod,
        ReceiptRequest, UserRole,
    };

    struct Fixture {
        db: Database,
        store: String,
        product: String,
        cashier: String,
    }

    async fn fixture(stock: i64) -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();
        let store = catalog
            .create_location("Store 1", LocationType::Store)
            .await
            .unwrap();
        let product = catalog.create_product("TEA-001", "Green Tea", 450).await.unwrap();
        let cashier = catalog
            .create_user("Alex Doe", UserRole::Cashier, Some(&store.id))
            .await
            .unwrap();

        db.stock()
            .receipt(
                &ReceiptRequest {
                    product_id: product.id.clone(),
                    location_id: store.id.clone(),
                    quantity: stock,
                    reason: None,
                },
                &cashier.id,
            )
            .await
            .unwrap();

        Fixture {
            db,
            store: store.id,
            product: product.id,
            cashier: cashier.id,
        }
    }

    fn checkout(f: &Fixture, qty: i64) -> CreateSaleRequest {
        CreateSaleRequest {
            location_id: f.store.clone(),
            items: vec![CreateSaleItem {
                product_id: f.product.clone(),
                quantity: qty,
                unit_price_cents: 450,
                discount_cents: 0,
                is_gift: false,
            }],
            payment_method: PaymentMethod::Cash,
            customer_phone: None,
            customer_name: None,
            promotion_id: None,
            certificate_id: None,
            notes: None,
        }
    }

    /// Persists a pending, reserved sale without completing it.
    async fn open_pending(f: &Fixture, qty: i64) -> Sale {
        let request = checkout(f, qty);
        let priced = price_sale(&request.items).unwrap();
        let mut tx = f.db.pool().begin().await.unwrap();
        let sale = open_in(&mut tx, &request, &priced, &f.cashier).await.unwrap();
        tx.commit().await.unwrap();
        sale
    }

    #[tokio::test]
    async fn test_cancel_pending_releases_reservation() {
        let f = fixture(10).await;
        let sale = open_pending(&f, 4).await;

        let level = f.db.stock().get(&f.product, &f.store).await.unwrap().unwrap();
        assert_eq!(level.reserved_quantity, 4);

        let cancelled = f.db.sales().cancel(&sale.id).await.unwrap();
        assert_eq!(cancelled.sale.status, SaleStatus::Cancelled);

        let level = f.db.stock().get(&f.product, &f.store).await.unwrap().unwrap();
        assert_eq!(level.quantity, 10);
        assert_eq!(level.reserved_quantity, 0);
    }

    #[tokio::test]
    async fn test_complete_pending_sells_reserved_stock() {
        let f = fixture(10).await;
        let sale = open_pending(&f, 3).await;

        let completed = f.db.sales().complete_sale(&sale.id, &f.cashier).await.unwrap();
        assert_eq!(completed.sale.status, SaleStatus::Completed);
        assert!(completed.sale.completed_at.is_some());

        let level = f.db.stock().get(&f.product, &f.store).await.unwrap().unwrap();
        assert_eq!((level.quantity, level.reserved_quantity), (7, 0));

        let movements = f
            .db
            .movements()
            .list(&MovementFilter {
                sale_id: Some(sale.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::Sale);
        assert_eq!(movements[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_cancel_cancelled_is_invalid_state() {
        let f = fixture(10).await;
        let sale = open_pending(&f, 1).await;
        f.db.sales().cancel(&sale.id).await.unwrap();

        let err = f.db.sales().cancel(&sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidSaleStatus { .. })
        ));

        let err = f
            .db
            .sales()
            .complete_sale(&sale.id, &f.cashier)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidSaleStatus { .. })
        ));

        // the failed transitions released nothing twice
        let level = f.db.stock().get(&f.product, &f.store).await.unwrap().unwrap();
        assert_eq!(level.reserved_quantity, 0);
    }

    #[tokio::test]
    async fn test_unknown_sale_is_not_found() {
        let f = fixture(1).await;
        let err = f.db.sales().cancel("no-such-sale").await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::SaleNotFound(_))));
    }
}
