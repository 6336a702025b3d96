//! # Repository Module
//!
//! The stock ledger, movement log, sale workflow and their numbering.
//!
//! ## Transaction Composition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Public methods (StockLedger::receipt, SaleWorkflow::create, ...)      │
//! │  ├── validate input (tally-core)           no storage touched yet      │
//! │  ├── pool.begin()                                                      │
//! │  ├── inner steps on &mut SqliteConnection                              │
//! │  │     stock::reserve_in / sell_in / ...   guarded UPDATEs             │
//! │  │     movement::append                    numbered INSERT             │
//! │  │     numbering::next_*                   max-scan under write lock   │
//! │  └── tx.commit()  (any `?` before this drops tx → ROLLBACK)            │
//! │                                                                         │
//! │  Every transaction starts with a write statement, so the SQLite write  │
//! │  lock is held before any read a decision depends on.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StockLedger`](stock::StockLedger) - Per-(product, location) quantities
//! - [`MovementLog`](movement::MovementLog) - Append-only audit trail
//! - [`SaleWorkflow`](sale::SaleWorkflow) - Checkout, completion, cancellation
//! - [`CatalogRepository`](catalog::CatalogRepository) - Reference data

pub mod catalog;
pub mod movement;
pub mod numbering;
pub mod sale;
pub mod stock;

/// Default page size for list queries.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Upper bound for list page sizes.
pub const MAX_LIST_LIMIT: u32 = 500;

pub(crate) fn clamp_limit(limit: Option<u32>) -> i64 {
    i64::from(limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT))
}
