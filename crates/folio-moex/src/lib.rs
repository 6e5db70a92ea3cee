//! Moscow Exchange market data for folio
//!
//! [`MoexClient`] implements [`folio_core::MarketDataGateway`] on top of the
//! exchange's public ISS API:
//!
//! - existence: a security exists when ISS lists at least one board for it
//! - quote: previous-session price (`PREVPRICE`) and currency on the
//!   configured board (`TQBR` by default)
//!
//! ISS uses the legacy code `SUR` for the rouble; quotes are normalized to
//! `RUB` here, so nothing downstream needs to know about it.
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_core::{MarketDataGateway, Ticker};
//! use folio_moex::MoexClient;
//!
//! let client = MoexClient::with_defaults()?;
//! let sber = Ticker::parse("sber")?;
//! if client.exists(&sber).await? {
//!     println!("{:?}", client.quote(&sber).await?);
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod response;

pub use client::MoexClient;
pub use config::MoexConfig;
pub use error::{MoexError, Result};
pub use response::normalize_currency;
