//! Schema creation and versioning

use crate::error::{LedgerError, Result};
use rusqlite::Connection;
use tracing::info;

/// Version written to `PRAGMA user_version`
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = r"
CREATE TABLE IF NOT EXISTS users (
    telegram_id INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS holdings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES users(telegram_id) ON DELETE CASCADE,
    ticker TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_price TEXT NOT NULL,
    purchased_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_holdings_owner ON holdings(owner_id);
";

/// Connection pragmas applied on every open
pub fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
    Ok(())
}

/// Bring the database up to [`SCHEMA_VERSION`]; safe to run on every start
pub fn migrate(conn: &Connection) -> Result<()> {
    let found: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if found > SCHEMA_VERSION {
        return Err(LedgerError::SchemaVersion {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    if found < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        info!(version = SCHEMA_VERSION, "ledger schema created");
    }

    Ok(())
}
