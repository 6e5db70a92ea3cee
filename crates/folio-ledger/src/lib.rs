//! Persistent ledger for folio
//!
//! Users and their holdings live in a single SQLite file:
//!
//! ```text
//! users(telegram_id INTEGER PRIMARY KEY)
//! holdings(id, owner_id -> users, ticker, quantity, unit_price, purchased_at)
//! ```
//!
//! The schema is created on first open and versioned through
//! `PRAGMA user_version`.

pub mod error;
pub mod schema;
pub mod sqlite;

pub use error::{LedgerError, Result};
pub use sqlite::SqliteLedger;
