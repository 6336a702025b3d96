//! # Seed Data Generator
//!
//! Populates a database with a small demo chain for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally_dev.db with 100 units of each product at the warehouse
//! cargo run -p tally-db --bin seed
//!
//! # Custom database and stock level
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db --units 250
//! ```
//!
//! ## Generated Data
//! - One central warehouse and two stores
//! - An admin, a warehouse worker and one cashier per store
//! - A product list across a few categories
//! - A receipt per product at the warehouse, transfers of a fifth of it to
//!   each store, and one sample sale per store

use std::env;

use tally_core::{
    CreateSaleItem, CreateSaleRequest, LocationType, PaymentMethod, ReceiptRequest,
    TransferRequest, UserRole,
};
use tally_db::{Database, DbConfig};

/// `(sku prefix, names)` per category.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "Sparkling Water",
            "Orange Juice",
            "Apple Juice",
            "Iced Tea",
            "Cold Brew Coffee",
            "Lemonade",
        ],
    ),
    (
        "SNK",
        &[
            "Sea Salt Chips",
            "Dark Chocolate Bar",
            "Trail Mix",
            "Pretzels",
            "Granola Bar",
        ],
    ),
    (
        "HOM",
        &[
            "Dish Soap",
            "Paper Towels",
            "Trash Bags",
            "Sponges 3-Pack",
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tally_db::init_tracing("warn,tally_db=info");

    let args: Vec<String> = env::args().collect();

    let mut units: i64 = 100;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--units" | "-u" => {
                if i + 1 < args.len() {
                    units = args[i + 1].parse().unwrap_or(100);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -u, --units <N>    Units received per product (default: 100)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tally Seed Data Generator");
    println!("=========================");
    println!("Database: {}", db_path);
    println!("Units per product: {}", units);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let catalog = db.catalog();
    let existing = catalog.count_products().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Locations and staff
    let warehouse = catalog
        .create_location("Central Warehouse", LocationType::CentralWarehouse)
        .await?;
    let stores = [
        catalog.create_location("Downtown Store", LocationType::Store).await?,
        catalog.create_location("Riverside Store", LocationType::Store).await?,
    ];

    let admin = catalog.create_user("Admin", UserRole::Admin, None).await?;
    let keeper = catalog
        .create_user("Warehouse Keeper", UserRole::WarehouseWorker, Some(&warehouse.id))
        .await?;
    let mut cashiers = Vec::with_capacity(stores.len());
    for store in &stores {
        let name = format!("{} Cashier", store.name);
        cashiers.push(
            catalog
                .create_user(&name, UserRole::Cashier, Some(&store.id))
                .await?,
        );
    }
    println!("✓ Created {} locations and {} users", 1 + stores.len(), 2 + cashiers.len());

    // Products, received at the warehouse and spread to the stores
    let mut products = Vec::new();
    for (prefix, names) in CATEGORIES {
        for (idx, name) in names.iter().enumerate() {
            let sku = format!("{}-{:03}", prefix, idx + 1);
            let price = 149 + (products.len() as i64 * 37) % 900;
            let product = catalog.create_product(&sku, name, price).await?;

            db.stock()
                .receipt(
                    &ReceiptRequest {
                        product_id: product.id.clone(),
                        location_id: warehouse.id.clone(),
                        quantity: units,
                        reason: Some("Initial stock".to_string()),
                    },
                    &keeper.id,
                )
                .await?;

            let share = units / 5;
            if share > 0 {
                for store in &stores {
                    db.stock()
                        .transfer(
                            &TransferRequest {
                                product_id: product.id.clone(),
                                from_location_id: warehouse.id.clone(),
                                to_location_id: store.id.clone(),
                                quantity: share,
                                reason: Some("Store replenishment".to_string()),
                            },
                            &admin.id,
                        )
                        .await?;
                }
            }

            products.push(product);
        }
    }
    println!("✓ Created and stocked {} products", products.len());

    // One sample sale per store
    if units / 5 >= 2 {
        for (store, cashier) in stores.iter().zip(&cashiers) {
            let items = products
                .iter()
                .take(3)
                .map(|p| CreateSaleItem {
                    product_id: p.id.clone(),
                    quantity: 2,
                    unit_price_cents: p.base_price_cents,
                    discount_cents: 0,
                    is_gift: false,
                })
                .collect();

            let sale = db
                .sales()
                .create(
                    &CreateSaleRequest {
                        location_id: store.id.clone(),
                        items,
                        payment_method: PaymentMethod::Card,
                        customer_phone: None,
                        customer_name: None,
                        promotion_id: None,
                        certificate_id: None,
                        notes: Some("Seeded sample sale".to_string()),
                    },
                    &cashier.id,
                )
                .await?;
            println!(
                "✓ Sale {} at {}: {}",
                sale.sale.sale_number,
                store.name,
                sale.sale.total()
            );
        }
    }

    println!();
    println!("✓ Seed complete!");
    for location in catalog.list_locations().await? {
        let lines = db.stock().get_by_location(&location.id).await?;
        let on_hand: i64 = lines.iter().map(|l| l.quantity).sum();
        println!("  {} ({}): {} units on hand", location.name, location.id, on_hand);
    }
    println!("  Admin user id: {}", admin.id);

    Ok(())
}
