//! # Catalog Repository
//!
//! Minimal reference data: locations, products and users.
//!
//! Full CRUD for these belongs to the catalog and user modules. The ledger
//! only needs the rows to exist (foreign keys) and their names for display,
//! so this repository offers creation and lookup for seeding, tests and
//! operators.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use tally_core::{Location, LocationType, Product, User, UserRole};

use crate::error::DbResult;

/// Repository for reference data.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Locations
    // =========================================================================

    /// Creates an active location.
    pub async fn create_location(
        &self,
        name: &str,
        location_type: LocationType,
    ) -> DbResult<Location> {
        let location = Location {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            location_type,
            address: None,
            is_active: true,
            created_at: Utc::now(),
        };
        self.insert_location(&location).await?;
        Ok(location)
    }

    /// Inserts a location as given.
    pub async fn insert_location(&self, location: &Location) -> DbResult<()> {
        debug!(id = %location.id, name = %location.name, "Inserting location");

        sqlx::query(
            r#"
            INSERT INTO locations (id, name, location_type, address, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&location.id)
        .bind(&location.name)
        .bind(location.location_type)
        .bind(&location.address)
        .bind(location.is_active)
        .bind(location.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a location by ID.
    pub async fn get_location(&self, id: &str) -> DbResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, location_type, address, is_active, created_at
            FROM locations
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    /// Lists active locations by name.
    pub async fn list_locations(&self) -> DbResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, location_type, address, is_active, created_at
            FROM locations
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Creates an active product.
    pub async fn create_product(
        &self,
        sku: &str,
        name: &str,
        base_price_cents: i64,
    ) -> DbResult<Product> {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            name: name.to_string(),
            barcode: None,
            base_price_cents,
            is_active: true,
            created_at: Utc::now(),
        };
        self.insert_product(&product).await?;
        Ok(product)
    }

    /// Inserts a product as given. Duplicate SKUs fail with `UniqueViolation`.
    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, barcode, base_price_cents, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(product.base_price_cents)
        .bind(product.is_active)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts products (used by the seeder to stay idempotent).
    pub async fn count_products(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Creates an active user.
    pub async fn create_user(
        &self,
        full_name: &str,
        role: UserRole,
        location_id: Option<&str>,
    ) -> DbResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            role,
            location_id: location_id.map(str::to_string),
            is_active: true,
            created_at: Utc::now(),
        };
        self.insert_user(&user).await?;
        Ok(user)
    }

    /// Inserts a user as given.
    pub async fn insert_user(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, full_name, role, location_id, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(&user.location_id)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a user by ID.
    pub async fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, role, location_id, is_active, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::{Database, DbConfig};
    use tally_core::{LocationType, UserRole};

    #[tokio::test]
    async fn test_reference_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let warehouse = catalog
            .create_location("Central", LocationType::CentralWarehouse)
            .await
            .unwrap();
        let user = catalog
            .create_user("Sam Lee", UserRole::WarehouseWorker, Some(&warehouse.id))
            .await
            .unwrap();

        catalog
            .create_location("Airport Store", LocationType::Store)
            .await
            .unwrap();

        let loaded = catalog.get_location(&warehouse.id).await.unwrap().unwrap();
        assert_eq!(loaded.location_type, LocationType::CentralWarehouse);

        let names: Vec<String> = catalog
            .list_locations()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, ["Airport Store", "Central"]);

        let loaded = catalog.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(loaded.role, UserRole::WarehouseWorker);
        assert_eq!(loaded.location_id.as_deref(), Some(warehouse.id.as_str()));
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_unique_violation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        catalog.create_product("SKU-1", "First", 100).await.unwrap();
        let err = catalog.create_product("SKU-1", "Second", 100).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(catalog.count_products().await.unwrap(), 1);
    }
}
