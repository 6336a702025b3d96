//! # Tally API
//!
//! REST server for the stock ledger, movement log and sale workflow.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tally API Routes                                │
//! │                                                                         │
//! │  ┌────────────────────────────────┐  ┌────────────────────────────────┐│
//! │  │  /inventory                    │  │  /sales                        ││
//! │  │                                │  │                                ││
//! │  │ • GET  ?locationId=            │  │ • GET  ?locationId=&cashierId= ││
//! │  │ • GET  /product/{productId}    │  │ • GET  /{id}                   ││
//! │  │ • POST /receipt                │  │ • POST /                       ││
//! │  │ • POST /transfer               │  │ • POST /{id}/complete          ││
//! │  │ • POST /writeoff               │  │ • POST /{id}/cancel            ││
//! │  │ • POST /adjust                 │  │                                ││
//! │  │ • GET  /movements              │  │                                ││
//! │  └────────────────────────────────┘  └────────────────────────────────┘│
//! │                                                                         │
//! │  GET /health                    X-User-Id required on every POST       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `TALLY_HTTP_PORT` - HTTP port (default: 8080)
//! - `TALLY_DB_PATH` - SQLite database file (default: ./tally.db)
//! - `TALLY_DB_MAX_CONNECTIONS` - Pool size (default: 8)
//! - `TALLY_DB_BUSY_TIMEOUT_MS` - Write-lock wait (default: 5000)
//! - `RUST_LOG` - Log filter (default: info,tally=debug,sqlx=warn)

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

// Re-exports
pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::router;

use tally_db::Database;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}
