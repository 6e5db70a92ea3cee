//! Market-data boundary

use crate::error::Result;
use crate::models::{Quote, Ticker};
use async_trait::async_trait;

/// Read-only market-data source consulted once per lookup.
///
/// Implementations report transport or server failures as
/// [`Error::Gateway`](crate::Error::Gateway); callers decide whether that is
/// shown as "unavailable" or folded into "not found".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Whether the exchange lists `ticker`
    async fn exists(&self, ticker: &Ticker) -> Result<bool>;

    /// Last price of `ticker`, `None` when the exchange returns no quote data
    async fn quote(&self, ticker: &Ticker) -> Result<Option<Quote>>;
}
