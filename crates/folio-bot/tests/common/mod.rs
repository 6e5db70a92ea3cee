//! Shared fixtures for the bot integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use folio_bot::PortfolioBot;
use folio_bot::interface::ConversationStore;
use folio_core::{Decimal, InMemoryLedger, Ledger, MarketDataGateway, Quote, Ticker};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Gateway answering from a fixed table
#[derive(Default)]
pub struct StaticGateway {
    listed: HashMap<String, Option<Decimal>>,
    down: AtomicBool,
    pub lookups: AtomicUsize,
}

impl StaticGateway {
    pub fn new() -> Self {
        Self::default()
            .listing("SBER", Some(Decimal::new(2855, 1)))
            .listing("GAZP", Some(Decimal::new(1620, 1)))
            .listing("LKOH", None)
    }

    pub fn listing(mut self, symbol: &str, price: Option<Decimal>) -> Self {
        self.listed.insert(symbol.to_string(), price);
        self
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> folio_core::Result<()> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(folio_core::Error::Gateway("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataGateway for StaticGateway {
    async fn exists(&self, ticker: &Ticker) -> folio_core::Result<bool> {
        self.check()?;
        Ok(self.listed.contains_key(ticker.as_str()))
    }

    async fn quote(&self, ticker: &Ticker) -> folio_core::Result<Option<Quote>> {
        self.check()?;
        Ok(self
            .listed
            .get(ticker.as_str())
            .copied()
            .flatten()
            .map(|price| Quote {
                ticker: ticker.clone(),
                price,
                currency: "RUB".to_string(),
            }))
    }
}

pub struct Harness {
    pub bot: Arc<PortfolioBot>,
    pub gateway: Arc<StaticGateway>,
    pub ledger: Arc<InMemoryLedger>,
}

pub fn harness() -> Harness {
    let gateway = Arc::new(StaticGateway::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let bot = bot_with(gateway.clone(), ledger.clone());
    Harness {
        bot: Arc::new(bot),
        gateway,
        ledger,
    }
}

pub fn bot_with(gateway: Arc<dyn MarketDataGateway>, ledger: Arc<dyn Ledger>) -> PortfolioBot {
    PortfolioBot::new(gateway, ledger, Arc::new(ConversationStore::default()))
}
