//! Shared fixtures for tally-db integration tests.

#![allow(dead_code)]

use std::time::Duration;

use tally_core::{
    CreateSaleItem, CreateSaleRequest, LocationType, PaymentMethod, ReceiptRequest, UserRole,
};
use tally_db::{Database, DbConfig};
use tempfile::TempDir;

/// A small chain: one warehouse, two stores, two products, one user.
pub struct Chain {
    pub db: Database,
    pub warehouse: String,
    pub store1: String,
    pub store2: String,
    pub product_a: String,
    pub product_b: String,
    pub user: String,
    /// Keeps a file-backed database alive for the test's duration.
    _dir: Option<TempDir>,
}

impl Chain {
    /// In-memory, single connection.
    pub async fn in_memory() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Self::populate(db, None).await
    }

    /// File-backed with a real multi-connection pool, for concurrency tests.
    pub async fn on_disk() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("tally.db"))
            .max_connections(8)
            .busy_timeout(Duration::from_secs(30));
        let db = Database::new(config).await.unwrap();
        Self::populate(db, Some(dir)).await
    }

    async fn populate(db: Database, dir: Option<TempDir>) -> Self {
        let catalog = db.catalog();
        let warehouse = catalog
            .create_location("Central Warehouse", LocationType::CentralWarehouse)
            .await
            .unwrap();
        let store1 = catalog
            .create_location("Store 1", LocationType::Store)
            .await
            .unwrap();
        let store2 = catalog
            .create_location("Store 2", LocationType::Store)
            .await
            .unwrap();
        let product_a = catalog.create_product("A-001", "Product A", 1500).await.unwrap();
        let product_b = catalog.create_product("B-001", "Product B", 250).await.unwrap();
        let user = catalog
            .create_user("Jordan Smith", UserRole::Manager, Some(&store1.id))
            .await
            .unwrap();

        Chain {
            db,
            warehouse: warehouse.id,
            store1: store1.id,
            store2: store2.id,
            product_a: product_a.id,
            product_b: product_b.id,
            user: user.id,
            _dir: dir,
        }
    }

    pub async fn receive(&self, product: &str, location: &str, qty: i64) {
        self.db
            .stock()
            .receipt(
                &ReceiptRequest {
                    product_id: product.to_string(),
                    location_id: location.to_string(),
                    quantity: qty,
                    reason: None,
                },
                &self.user,
            )
            .await
            .unwrap();
    }

    /// `(quantity, reserved_quantity)` of a pair, `(0, 0)` when no record exists.
    pub async fn levels(&self, product: &str, location: &str) -> (i64, i64) {
        self.db
            .stock()
            .get(product, location)
            .await
            .unwrap()
            .map(|l| (l.quantity, l.reserved_quantity))
            .unwrap_or((0, 0))
    }

    pub fn checkout(&self, location: &str, lines: &[(&str, i64)]) -> CreateSaleRequest {
        CreateSaleRequest {
            location_id: location.to_string(),
            items: lines
                .iter()
                .map(|(product, qty)| CreateSaleItem {
                    product_id: product.to_string(),
                    quantity: *qty,
                    unit_price_cents: 1000,
                    discount_cents: 0,
                    is_gift: false,
                })
                .collect(),
            payment_method: PaymentMethod::Cash,
            customer_phone: None,
            customer_name: None,
            promotion_id: None,
            certificate_id: None,
            notes: None,
        }
    }
}
