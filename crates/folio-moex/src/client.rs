//! ISS HTTP client implementing the market-data gateway

use crate::config::MoexConfig;
use crate::error::{MoexError, Result};
use crate::response::{BoardSecurities, SecurityInfo};
use async_trait::async_trait;
use folio_core::{MarketDataGateway, Quote, Ticker};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;
use url::Url;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Moscow Exchange ISS client
#[derive(Debug, Clone)]
pub struct MoexClient {
    client: Client,
    base_url: Url,
    board: String,
    rate_limiter: SharedRateLimiter,
}

impl MoexClient {
    /// Create a client from a validated configuration
    pub fn new(config: &MoexConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let rps = NonZeroU32::new(config.requests_per_second)
            .ok_or_else(|| MoexError::Config("requests_per_second must be greater than 0".to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url()?,
            board: config.board.clone(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        })
    }

    /// Client for the public ISS endpoint
    pub fn with_defaults() -> Result<Self> {
        Self::new(&MoexConfig::default())
    }

    /// `{base}/securities/{ticker}.json`
    pub fn security_url(&self, ticker: &Ticker) -> Result<Url> {
        let file = format!("{ticker}.json");
        self.endpoint(&["securities", &file])
    }

    /// `{base}/engines/stock/markets/shares/boards/{board}/securities/{ticker}.json?...`
    pub fn quote_url(&self, ticker: &Ticker) -> Result<Url> {
        let file = format!("{ticker}.json");
        let mut url = self.endpoint(&[
            "engines",
            "stock",
            "markets",
            "shares",
            "boards",
            &self.board,
            "securities",
            &file,
        ])?;
        url.query_pairs_mut()
            .append_pair("iss.meta", "off")
            .append_pair("iss.only", "securities")
            .append_pair("securities.columns", "PREVPRICE,CURRENCYID");
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| MoexError::Config(format!("ISS base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET and decode; `Ok(None)` for 4xx, error for 5xx and transport failures
    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        self.rate_limiter.until_ready().await;

        debug!(%url, "ISS request");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status.is_client_error() {
            debug!(%url, %status, "ISS rejected request");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(MoexError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Whether ISS lists the security on any board
    pub async fn security_exists(&self, ticker: &Ticker) -> Result<bool> {
        let info: Option<SecurityInfo> = self.fetch(self.security_url(ticker)?).await?;
        Ok(info.is_some_and(|info| info.exists()))
    }

    /// Previous-session price on the configured board
    pub async fn last_price(&self, ticker: &Ticker) -> Result<Option<Quote>> {
        let board: Option<BoardSecurities> = self.fetch(self.quote_url(ticker)?).await?;
        match board {
            Some(board) => board.quote(ticker),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl MarketDataGateway for MoexClient {
    async fn exists(&self, ticker: &Ticker) -> folio_core::Result<bool> {
        Ok(self.security_exists(ticker).await?)
    }

    async fn quote(&self, ticker: &Ticker) -> folio_core::Result<Option<Quote>> {
        Ok(self.last_price(ticker).await?)
    }
}
