//! # Domain Types
//!
//! Types shared by the ledger, the sale workflow and the REST layer.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  StockRecord    │   │    Movement     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id  ┐  │   │  movement_number│   │  sale_number    │       │
//! │  │  location_id ┘PK│   │  movement_type  │   │  status         │       │
//! │  │  quantity       │   │  from / to      │   │  total_cents    │       │
//! │  │  reserved_qty   │   │  quantity       │   │  items[]        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │   mutable, 1 per pair    append-only           status-only mutation    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Movements and sales carry both:
//! - `id`: UUID v4, used for relations
//! - a human-readable number (`RCP-20261019-000001`, `SALE-20261019-0001`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Reference Data (owned by the catalog modules, read here for display)
// =============================================================================

/// Kind of stock-holding location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    CentralWarehouse,
    #[default]
    Store,
}

/// A warehouse or store.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub location_type: LocationType,
    pub address: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A sellable product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub barcode: Option<String>,
    pub base_price_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    #[default]
    Cashier,
    Salesperson,
    WarehouseWorker,
}

/// A user that performs movements or rings up sales.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub role: UserRole,
    pub location_id: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock
// =============================================================================

/// Per-(product, location) stock state.
///
/// ## Invariant (at rest)
/// `0 <= reserved_quantity <= quantity`, so `available() >= 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub id: String,
    pub product_id: String,
    pub location_id: String,
    /// Physical units on hand.
    pub quantity: i64,
    /// Units earmarked for in-flight sales.
    pub reserved_quantity: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// Units that can be newly reserved or directly deducted.
    #[inline]
    pub fn available(&self) -> i64 {
        self.quantity - self.reserved_quantity
    }
}

/// A stock record enriched with product and location display fields.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: String,
    pub product_sku: String,
    pub product_name: String,
    pub location_id: String,
    pub location_name: String,
    pub location_type: LocationType,
    pub quantity: i64,
    pub reserved_quantity: i64,
    pub available: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Movements
// =============================================================================

/// Kind of stock-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Receipt,
    Transfer,
    Sale,
    WriteOff,
    Adjustment,
}

impl MovementType {
    /// Prefix of the human-readable movement number.
    pub const fn number_prefix(&self) -> &'static str {
        match self {
            MovementType::Receipt => "RCP",
            MovementType::Transfer => "TRF",
            MovementType::Sale => "SALE",
            MovementType::WriteOff => "WOF",
            MovementType::Adjustment => "ADJ",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::Receipt => "receipt",
            MovementType::Transfer => "transfer",
            MovementType::Sale => "sale",
            MovementType::WriteOff => "write_off",
            MovementType::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "receipt" => Ok(MovementType::Receipt),
            "transfer" => Ok(MovementType::Transfer),
            "sale" => Ok(MovementType::Sale),
            "write_off" | "writeoff" => Ok(MovementType::WriteOff),
            "adjustment" => Ok(MovementType::Adjustment),
            other => Err(ValidationError::InvalidFormat {
                field: "type".to_string(),
                reason: format!(
                    "unknown movement type '{}' (receipt, transfer, sale, write_off, adjustment)",
                    other
                ),
            }),
        }
    }
}

/// An immutable audit record of one stock-affecting event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: String,
    pub movement_number: String,
    pub movement_type: MovementType,
    pub product_id: String,
    /// Absent for receipts and positive adjustments.
    pub from_location_id: Option<String>,
    /// Absent for outbound-only events (sale, write-off, negative adjustment).
    pub to_location_id: Option<String>,
    /// Always positive; direction is given by from/to.
    pub quantity: i64,
    pub reason: Option<String>,
    pub performed_by: String,
    /// Set only for sale movements.
    pub sale_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A movement about to be appended (id, number and timestamp are assigned by the log).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub movement_type: MovementType,
    pub product_id: String,
    pub from_location_id: Option<String>,
    pub to_location_id: Option<String>,
    pub quantity: i64,
    pub reason: Option<String>,
    pub performed_by: String,
    pub sale_id: Option<String>,
}

/// Movement log query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MovementFilter {
    pub product_id: Option<String>,
    /// Matches either side of a movement.
    pub location_id: Option<String>,
    pub sale_id: Option<String>,
    #[serde(rename = "type")]
    pub movement_type: Option<MovementType>,
    pub limit: Option<u32>,
}

// =============================================================================
// Ledger Requests
// =============================================================================

/// Stock arriving at a location.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    pub product_id: String,
    pub location_id: String,
    pub quantity: i64,
    pub reason: Option<String>,
}

/// Stock moving between two locations.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub product_id: String,
    pub from_location_id: String,
    pub to_location_id: String,
    pub quantity: i64,
    pub reason: Option<String>,
}

/// Stock removed as damaged, expired or lost. A reason is mandatory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WriteOffRequest {
    pub product_id: String,
    pub location_id: String,
    pub quantity: i64,
    pub reason: String,
}

/// Stock-take correction to a counted quantity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AdjustRequest {
    pub product_id: String,
    pub location_id: String,
    pub counted_quantity: i64,
    pub reason: String,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// ## State Machine
/// ```text
///            complete_sale
///   Pending ───────────────► Completed   (terminal)
///      │
///      │ cancel
///      ▼
///   Cancelled                            (terminal)
///
///   Refunded: produced only by the refund flow, never by this workflow.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
    Refunded,
}

impl SaleStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
            SaleStatus::Refunded => "refunded",
        }
    }

    /// Only pending sales may be completed or cancelled.
    #[inline]
    pub const fn is_pending(&self) -> bool {
        matches!(self, SaleStatus::Pending)
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Certificate,
    Mixed,
}

// =============================================================================
// Sale
// =============================================================================

/// A sale header. Only `status` (and its timestamps) change after creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub sale_number: String,
    pub location_id: String,
    pub cashier_id: String,
    pub customer_phone: Option<String>,
    pub customer_name: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    /// `subtotal_cents - discount_cents`, unclamped.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub promotion_id: Option<String>,
    pub certificate_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of a sale, immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Joined from the catalog on read, not stored on the line.
    pub product_sku: Option<String>,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    /// `quantity * unit_price_cents - discount_cents`.
    pub total_price_cents: i64,
    pub is_gift: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A sale with its lines and display names.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub location_name: Option<String>,
    pub cashier_name: Option<String>,
}

// =============================================================================
// Sale Requests
// =============================================================================

/// One checkout line as sent by the POS screen.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub is_gift: bool,
}

/// A checkout request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub location_id: String,
    pub items: Vec<CreateSaleItem>,
    pub payment_method: PaymentMethod,
    pub customer_phone: Option<String>,
    pub customer_name: Option<String>,
    pub promotion_id: Option<String>,
    pub certificate_id: Option<String>,
    pub notes: Option<String>,
}

/// Sale list query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleFilter {
    pub location_id: Option<String>,
    pub cashier_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub start_date: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

/// A page of sales plus the unpaged match count.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleListing {
    pub data: Vec<Sale>,
    pub total: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
