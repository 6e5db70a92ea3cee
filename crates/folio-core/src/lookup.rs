//! One-shot ticker lookup (`/checkStock`)

use crate::gateway::MarketDataGateway;
use crate::models::{Quote, Ticker};
use tracing::warn;

/// Answer to a ticker lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Listed and priced
    Found(Quote),
    /// Listed, but the exchange returned no price (or the price query failed)
    ListedWithoutQuote(Ticker),
    /// Not listed on the exchange
    NotFound(Ticker),
    /// The existence check itself could not be answered
    Unavailable(Ticker),
    /// Input is not a syntactically valid ticker
    Invalid(String),
}

/// Check whether `input` names a listed security and fetch its last price.
///
/// The price is only requested once existence is confirmed, so an unlisted
/// ticker yields [`LookupOutcome::NotFound`] regardless of the quote endpoint.
pub async fn check_stock(gateway: &dyn MarketDataGateway, input: &str) -> LookupOutcome {
    let ticker = match Ticker::parse(input) {
        Ok(ticker) => ticker,
        Err(_) => return LookupOutcome::Invalid(input.trim().to_uppercase()),
    };

    match gateway.exists(&ticker).await {
        Ok(true) => {}
        Ok(false) => return LookupOutcome::NotFound(ticker),
        Err(e) => {
            warn!(%ticker, error = %e, "existence check failed");
            return LookupOutcome::Unavailable(ticker);
        }
    }

    match gateway.quote(&ticker).await {
        Ok(Some(quote)) => LookupOutcome::Found(quote),
        Ok(None) => LookupOutcome::ListedWithoutQuote(ticker),
        Err(e) => {
            warn!(%ticker, error = %e, "quote request failed");
            LookupOutcome::ListedWithoutQuote(ticker)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::gateway::MockMarketDataGateway;
    use rust_decimal::Decimal;

    fn sber_quote() -> Quote {
        Quote {
            ticker: Ticker::parse("SBER").unwrap(),
            price: Decimal::new(28_550, 2),
            currency: "RUB".to_string(),
        }
    }

    #[tokio::test]
    async fn test_found_with_price() {
        let mut gateway = MockMarketDataGateway::new();
        gateway.expect_exists().times(1).returning(|_| Ok(true));
        gateway
            .expect_quote()
            .withf(|t| t.as_str() == "SBER")
            .times(1)
            .returning(|_| Ok(Some(sber_quote())));

        assert_eq!(
            check_stock(&gateway, "sber").await,
            LookupOutcome::Found(sber_quote())
        );
    }

    #[tokio::test]
    async fn test_listed_without_quote() {
        let mut gateway = MockMarketDataGateway::new();
        gateway.expect_exists().returning(|_| Ok(true));
        gateway.expect_quote().returning(|_| Ok(None));

        assert_eq!(
            check_stock(&gateway, "SBER").await,
            LookupOutcome::ListedWithoutQuote(Ticker::parse("SBER").unwrap())
        );
    }

    #[tokio::test]
    async fn test_not_found_never_asks_for_price() {
        let mut gateway = MockMarketDataGateway::new();
        gateway.expect_exists().returning(|_| Ok(false));
        gateway.expect_quote().never();

        assert_eq!(
            check_stock(&gateway, "nope").await,
            LookupOutcome::NotFound(Ticker::parse("NOPE").unwrap())
        );
    }

    #[tokio::test]
    async fn test_gateway_down() {
        let mut gateway = MockMarketDataGateway::new();
        gateway
            .expect_exists()
            .returning(|_| Err(Error::Gateway("HTTP 503".to_string())));
        gateway.expect_quote().never();

        assert_eq!(
            check_stock(&gateway, "SBER").await,
            LookupOutcome::Unavailable(Ticker::parse("SBER").unwrap())
        );
    }

    #[tokio::test]
    async fn test_invalid_input_skips_gateway() {
        let mut gateway = MockMarketDataGateway::new();
        gateway.expect_exists().never();

        assert_eq!(
            check_stock(&gateway, "what is sber?").await,
            LookupOutcome::Invalid("WHAT IS SBER?".to_string())
        );
    }
}
