//! Portfolio valuation over recorded holdings
//!
//! The summary is a fold with an exact decimal sum, so merging partial
//! summaries in any grouping or order gives the same result. Values are taken
//! at purchase price in a single nominal currency; no conversion happens here.
//! A sum that leaves the decimal range is an error, never a clamped value.

use crate::error::{Error, Result};
use crate::models::{Holding, Ticker};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accumulated purchases of one ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Number of purchase records
    pub purchases: usize,
    /// Units bought across all purchases
    pub quantity: u64,
    /// Sum of `quantity × unit_price`
    pub cost: Decimal,
}

impl Position {
    fn add(&mut self, holding: &Holding, cost: Decimal) -> Result<()> {
        self.merge(&Position {
            purchases: 1,
            quantity: u64::from(holding.quantity),
            cost,
        })
    }

    fn merge(&mut self, other: &Position) -> Result<()> {
        let quantity = self
            .quantity
            .checked_add(other.quantity)
            .ok_or_else(|| out_of_range("quantity"))?;
        let cost = checked_sum(self.cost, other.cost)?;
        self.purchases += other.purchases;
        self.quantity = quantity;
        self.cost = cost;
        Ok(())
    }

    /// Average unit price paid, `None` when nothing was bought
    pub fn average_price(&self) -> Option<Decimal> {
        (self.quantity > 0).then(|| (self.cost / Decimal::from(self.quantity)).round_dp(4))
    }
}

/// Aggregate of a user's holdings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Number of holding records (repeated purchases count separately)
    pub count: usize,
    /// Sum over holdings of `quantity × unit_price`
    pub total_value: Decimal,
    /// Breakdown by ticker, ordered by symbol
    pub positions: BTreeMap<Ticker, Position>,
}

impl PortfolioSummary {
    /// Summary of an empty portfolio
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarise holdings; order of the input does not matter
    pub fn from_holdings<'a, I>(holdings: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Holding>,
    {
        let mut summary = Self::new();
        for holding in holdings {
            summary.add(holding)?;
        }
        Ok(summary)
    }

    /// Add one holding; on error the summary is left unchanged
    pub fn add(&mut self, holding: &Holding) -> Result<()> {
        let cost = holding
            .cost()
            .ok_or_else(|| out_of_range(&format!("cost of {} × {}", holding.quantity, holding.ticker)))?;
        let total_value = checked_sum(self.total_value, cost)?;

        let mut position = self.positions.get(&holding.ticker).copied().unwrap_or_default();
        position.add(holding, cost)?;

        self.count += 1;
        self.total_value = total_value;
        self.positions.insert(holding.ticker.clone(), position);
        Ok(())
    }

    /// Combine with a summary computed over a disjoint batch of holdings
    pub fn merge(mut self, other: PortfolioSummary) -> Result<Self> {
        self.count += other.count;
        self.total_value = checked_sum(self.total_value, other.total_value)?;
        for (ticker, position) in &other.positions {
            self.positions.entry(ticker.clone()).or_default().merge(position)?;
        }
        Ok(self)
    }

    /// Whether no holding was recorded
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

fn checked_sum(left: Decimal, right: Decimal) -> Result<Decimal> {
    left.checked_add(right).ok_or_else(|| out_of_range("portfolio value"))
}

fn out_of_range(what: &str) -> Error {
    Error::OutOfRange(format!("{what} exceeds {}", Decimal::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use chrono::Utc;

    fn holding(ticker: &str, quantity: u32, unit_price: Decimal) -> Holding {
        Holding::new(
            UserId(1),
            Ticker::parse(ticker).unwrap(),
            quantity,
            unit_price,
            Utc::now(),
        )
    }

    #[test]
    fn test_empty_portfolio() {
        let summary = PortfolioSummary::from_holdings(std::iter::empty::<&Holding>()).unwrap();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total_value, Decimal::ZERO);
        assert!(summary.is_empty());
        assert!(summary.positions.is_empty());
    }

    #[test]
    fn test_two_holdings() {
        let holdings = vec![
            holding("SBER", 100, Decimal::new(100, 1)),
            holding("GAZP", 5, Decimal::new(2000, 1)),
        ];
        let summary = PortfolioSummary::from_holdings(&holdings).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_value, Decimal::new(2000, 0));
    }

    #[test]
    fn test_repeated_purchases_count_separately() {
        let holdings = vec![
            holding("SBER", 10, Decimal::new(250, 0)),
            holding("SBER", 30, Decimal::new(270, 0)),
        ];
        let summary = PortfolioSummary::from_holdings(&holdings).unwrap();
        assert_eq!(summary.count, 2);

        let sber = summary.positions[&Ticker::parse("SBER").unwrap()];
        assert_eq!(sber.purchases, 2);
        assert_eq!(sber.quantity, 40);
        assert_eq!(sber.cost, Decimal::new(10_600, 0));
        assert_eq!(sber.average_price(), Some(Decimal::new(265, 0)));
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let holdings = vec![
            holding("SBER", 100, Decimal::new(100, 1)),
            holding("GAZP", 5, Decimal::new(2000, 1)),
            holding("SBER", 1, Decimal::new(3333, 2)),
        ];
        let whole = PortfolioSummary::from_holdings(&holdings).unwrap();
        let merged = PortfolioSummary::from_holdings(&holdings[2..])
            .unwrap()
            .merge(PortfolioSummary::from_holdings(&holdings[..2]).unwrap())
            .unwrap();
        assert_eq!(whole, merged);
    }

    #[test]
    fn test_total_out_of_range_is_an_error() {
        let huge = Decimal::from_scientific("7e28").unwrap();
        let holdings = vec![holding("SBER", 1, huge), holding("GAZP", 1, huge)];
        let err = PortfolioSummary::from_holdings(&holdings).unwrap_err();
        assert!(matches!(err, crate::Error::OutOfRange(_)), "{err:?}");

        let mut summary = PortfolioSummary::from_holdings(&holdings[..1]).unwrap();
        assert!(summary.add(&holdings[1]).is_err());
        assert_eq!(summary.count, 1);
        assert_eq!(summary.total_value, huge);
        assert!(!summary.positions.contains_key(&Ticker::parse("GAZP").unwrap()));
    }

    #[test]
    fn test_cost_out_of_range_is_an_error() {
        let holdings = vec![holding("SBER", 10, Decimal::from_scientific("1e28").unwrap())];
        assert!(PortfolioSummary::from_holdings(&holdings).is_err());
    }
}
