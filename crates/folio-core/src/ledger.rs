//! Durable store of users and holdings

use crate::error::Result;
use crate::models::{Holding, UserId};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

/// Record/query operations the core needs from persistence.
///
/// Every call is an independent atomic operation; nothing spans a conversation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Register a user. Returns `true` when the user was newly created.
    async fn register_user(&self, user: UserId) -> Result<bool>;

    async fn user_exists(&self, user: UserId) -> Result<bool>;

    /// Append one holding
    async fn add_holding(&self, holding: &Holding) -> Result<()>;

    /// All holdings of `owner` in insertion order (possibly empty)
    async fn list_holdings(&self, owner: UserId) -> Result<Vec<Holding>>;
}

/// Ledger kept in process memory; contents are lost on restart
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    users: RwLock<BTreeSet<UserId>>,
    holdings: RwLock<HashMap<UserId, Vec<Holding>>>,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn register_user(&self, user: UserId) -> Result<bool> {
        Ok(self.users.write().await.insert(user))
    }

    async fn user_exists(&self, user: UserId) -> Result<bool> {
        Ok(self.users.read().await.contains(&user))
    }

    async fn add_holding(&self, holding: &Holding) -> Result<()> {
        self.holdings
            .write()
            .await
            .entry(holding.owner_id)
            .or_default()
            .push(holding.clone());
        Ok(())
    }

    async fn list_holdings(&self, owner: UserId) -> Result<Vec<Holding>> {
        Ok(self
            .holdings
            .read()
            .await
            .get(&owner)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ticker;
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let ledger = InMemoryLedger::new();
        assert!(!ledger.user_exists(UserId(7)).await.unwrap());
        assert!(ledger.register_user(UserId(7)).await.unwrap());
        assert!(!ledger.register_user(UserId(7)).await.unwrap());
        assert!(ledger.user_exists(UserId(7)).await.unwrap());
    }

    #[tokio::test]
    async fn test_holdings_are_per_owner_and_not_merged() {
        let ledger = InMemoryLedger::new();
        let sber = Ticker::parse("SBER").unwrap();
        let first = Holding::new(UserId(1), sber.clone(), 10, Decimal::new(250, 0), Utc::now());
        let second = Holding::new(UserId(1), sber, 5, Decimal::new(260, 0), Utc::now());

        ledger.add_holding(&first).await.unwrap();
        ledger.add_holding(&second).await.unwrap();

        let listed = ledger.list_holdings(UserId(1)).await.unwrap();
        assert_eq!(listed, vec![first, second]);
        assert!(ledger.list_holdings(UserId(2)).await.unwrap().is_empty());
    }
}
