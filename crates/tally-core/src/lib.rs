//! # tally-core: Pure Domain Logic for the Tally Inventory Ledger
//!
//! This crate holds everything about stock, movements and sales that can be
//! decided without touching storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Admin dashboard / POS screen (external)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST (apps/api)                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ numbering │  │   │
//! │  │   │StockRecord│  │   Money   │  │ SaleTotals│  │ SALE-…-NN │  │   │
//! │  │   │ Movement  │  │           │  │ PricedLine│  │ RCP-…-NNN │  │   │
//! │  │   │   Sale    │  │           │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Storage Layer)                     │   │
//! │  │     Stock ledger, movement log, sale workflow, numbering        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockRecord, Movement, Sale, ...)
//! - [`money`] - Integer money in minor units
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Input validation for ledger and checkout requests
//! - [`pricing`] - Sale subtotal / discount / total computation
//! - [`numbering`] - Sale and movement number formatting
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::pricing::price_line;
//!
//! let line = price_line(3, Money::from_cents(250), Money::from_cents(50)).unwrap();
//! assert_eq!(line.total_price.cents(), 700);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod numbering;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines accepted in a single sale.
///
/// ## Business Reason
/// Bounds the size of the checkout transaction (one reservation and one sale
/// movement per line are written while the store's write lock is held).
pub const MAX_SALE_ITEMS: usize = 100;

/// Upper bound for a single movement quantity and for a pair's on-hand
/// quantity.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Maximum length of a free-text movement reason.
pub const MAX_REASON_LENGTH: usize = 500;
