//! SQLite-backed [`Ledger`]
//!
//! One connection guarded by a mutex; every statement runs on the blocking
//! pool so the async runtime never waits on disk. Prices are stored as
//! decimal text and never pass through a float.

use crate::error::{LedgerError, Result};
use crate::schema;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::{Decimal, Holding, Ledger, Ticker, UserId};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Raw `holdings` row before validation
type HoldingRow = (i64, String, i64, String, DateTime<Utc>);

#[derive(Debug, Clone)]
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteLedger {
    /// Open (or create) the database file and bring its schema up to date
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Private database that disappears with the ledger
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        schema::configure(&conn)?;
        schema::migrate(&conn)?;
        info!(path = ?path, "ledger opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Database file, `None` for in-memory ledgers
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` against the connection on the blocking pool
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| LedgerError::Poisoned(e.to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| LedgerError::Task(e.to_string()))?
    }

    /// Insert the user; `false` if already present
    pub async fn register(&self, user: UserId) -> Result<bool> {
        self.run(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO users (telegram_id) VALUES (?1)",
                params![user.0],
            )?;
            if inserted == 1 {
                info!(user = %user, "user registered");
            }
            Ok(inserted == 1)
        })
        .await
    }

    /// Whether the user is registered
    pub async fn contains_user(&self, user: UserId) -> Result<bool> {
        self.run(move |conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM users WHERE telegram_id = ?1",
                    params![user.0],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    /// Append one holding; the owner must already be registered
    pub async fn insert_holding(&self, holding: Holding) -> Result<i64> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO holdings (owner_id, ticker, quantity, unit_price, purchased_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    holding.owner_id.0,
                    holding.ticker.as_str(),
                    i64::from(holding.quantity),
                    holding.unit_price.to_string(),
                    holding.purchased_at,
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(id, owner = %holding.owner_id, ticker = %holding.ticker, "holding stored");
            Ok(id)
        })
        .await
    }

    /// Holdings of `owner` in insertion order
    pub async fn holdings(&self, owner: UserId) -> Result<Vec<Holding>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, ticker, quantity, unit_price, purchased_at
                 FROM holdings WHERE owner_id = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map(params![owner.0], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                })?
                .collect::<rusqlite::Result<Vec<HoldingRow>>>()?;

            rows.into_iter().map(|row| decode_holding(owner, row)).collect()
        })
        .await
    }
}

fn decode_holding(owner: UserId, (id, ticker, quantity, unit_price, purchased_at): HoldingRow) -> Result<Holding> {
    let corrupt = |reason: String| LedgerError::Corrupt {
        table: "holdings",
        reason: format!("row {id}: {reason}"),
    };

    let ticker = Ticker::parse(&ticker).map_err(|e| corrupt(e.to_string()))?;
    let quantity = u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| corrupt(format!("quantity {quantity} out of range")))?;
    let unit_price =
        Decimal::from_str(&unit_price).map_err(|e| corrupt(format!("unit price {unit_price:?}: {e}")))?;

    Ok(Holding::new(owner, ticker, quantity, unit_price, purchased_at))
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn register_user(&self, user: UserId) -> folio_core::Result<bool> {
        Ok(self.register(user).await?)
    }

    async fn user_exists(&self, user: UserId) -> folio_core::Result<bool> {
        Ok(self.contains_user(user).await?)
    }

    async fn add_holding(&self, holding: &Holding) -> folio_core::Result<()> {
        self.insert_holding(holding.clone()).await?;
        Ok(())
    }

    async fn list_holdings(&self, owner: UserId) -> folio_core::Result<Vec<Holding>> {
        Ok(self.holdings(owner).await?)
    }
}
