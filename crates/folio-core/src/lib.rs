//! Core of the folio portfolio tracker
//!
//! This crate holds everything that has sequencing or accumulation logic and
//! nothing that talks to the outside world directly:
//!
//! - [`PurchaseConversation`]: the ticker → price → quantity state machine
//! - [`PortfolioSummary`]: valuation of a user's holdings
//! - [`check_stock`]: one-shot existence/price lookup
//! - [`MarketDataGateway`] and [`Ledger`]: the seams to market data and storage
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_core::{Advance, InMemoryLedger, PurchaseConversation, UserId};
//!
//! let ledger = InMemoryLedger::new();
//! let mut conversation = PurchaseConversation::start(UserId(1));
//! for answer in ["sber", "12,5", "10"] {
//!     match conversation.advance(answer, &gateway, &ledger).await {
//!         Advance::Continue { conversation: next, .. } => conversation = next,
//!         Advance::Committed(holding) => println!("saved {holding:?}"),
//!         Advance::Cancelled => break,
//!     }
//! }
//! ```

pub mod conversation;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod lookup;
pub mod models;
pub mod portfolio;
pub mod validate;

pub use conversation::{Advance, PurchaseConversation, PurchasePrompt, PurchaseStep};
pub use error::{Error, Result};
pub use gateway::MarketDataGateway;
pub use ledger::{InMemoryLedger, Ledger};
pub use lookup::{LookupOutcome, check_stock};
pub use models::{Holding, Quote, Ticker, UserId};
pub use portfolio::{PortfolioSummary, Position};

// Re-export the decimal type used for prices and values
pub use rust_decimal::Decimal;
