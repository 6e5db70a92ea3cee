//! Domain types: users, tickers, holdings and quotes

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static TICKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9][A-Z0-9._-]{0,19}$").expect("ticker pattern is valid")
});

/// Chat-platform identity of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Exchange symbol, always uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Normalize user input into a ticker.
    ///
    /// Input is trimmed and uppercased; only `[A-Z0-9._-]` is accepted since
    /// the symbol ends up in a request path.
    pub fn parse(input: &str) -> Result<Self> {
        let symbol = input.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(Error::InvalidInput("empty ticker".to_string()));
        }
        if !TICKER_PATTERN.is_match(&symbol) {
            return Err(Error::InvalidInput(format!("malformed ticker: {symbol}")));
        }
        Ok(Self(symbol))
    }

    /// Normalised symbol
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ticker {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One recorded purchase. Never updated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub owner_id: UserId,
    pub ticker: Ticker,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub purchased_at: DateTime<Utc>,
}

impl Holding {
    /// Holding of `quantity` units bought at `unit_price`
    pub fn new(
        owner_id: UserId,
        ticker: Ticker,
        quantity: u32,
        unit_price: Decimal,
        purchased_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id,
            ticker,
            quantity,
            unit_price,
            purchased_at,
        }
    }

    /// `quantity × unit_price`, `None` when the product leaves the decimal range
    pub fn cost(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Last known price of a ticker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: Ticker,
    pub price: Decimal,
    /// ISO-like currency code as reported by the gateway (after normalization)
    pub currency: String,
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.price.normalize(), self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_normalization() {
        let ticker = Ticker::parse("  sber ").unwrap();
        assert_eq!(ticker.as_str(), "SBER");

        let ticker = Ticker::parse("ru000a0jx0j2").unwrap();
        assert_eq!(ticker.as_str(), "RU000A0JX0J2");
    }

    #[test]
    fn test_ticker_rejects_malformed() {
        assert!(Ticker::parse("").is_err());
        assert!(Ticker::parse("   ").is_err());
        assert!(Ticker::parse("SB ER").is_err());
        assert!(Ticker::parse("../etc").is_err());
        assert!(Ticker::parse("/stop").is_err());
        assert!(Ticker::parse(&"A".repeat(21)).is_err());
    }

    #[test]
    fn test_holding_cost() {
        let holding = Holding::new(
            UserId(1),
            Ticker::parse("GAZP").unwrap(),
            5,
            Decimal::new(2000, 1),
            Utc::now(),
        );
        assert_eq!(holding.cost(), Some(Decimal::new(1000, 0)));
    }

    #[test]
    fn test_holding_cost_out_of_range() {
        let holding = Holding::new(
            UserId(1),
            Ticker::parse("GAZP").unwrap(),
            10,
            Decimal::from_scientific("1e28").unwrap(),
            Utc::now(),
        );
        assert_eq!(holding.cost(), None);
    }

    #[test]
    fn test_quote_display() {
        let quote = Quote {
            ticker: Ticker::parse("SBER").unwrap(),
            price: Decimal::new(28550, 2),
            currency: "RUB".to_string(),
        };
        assert_eq!(quote.to_string(), "285.5 RUB");
    }
}
