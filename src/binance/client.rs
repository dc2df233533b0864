//! Binance public ticker client used as an external price feed
//!
//! No API key required for public market data endpoints.
//!
//! # Example
//! ```no_run
//! use threecommas_bots::binance::BinanceTicker;
//! use threecommas_bots::rates::PriceFeed;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ticker = BinanceTicker::new("https://api.binance.com")?;
//!     let price = ticker.price("BTCUSDT").await?;
//!     println!("BTCUSDT = {}", price);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::debug;

use super::types::TickerPrice;
use crate::error::{ApiError, BotError};
use crate::rates::PriceFeed;

/// Some edge nodes reject requests without a browser user agent
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

const TICKER_TIMEOUT_SECS: u64 = 10;

/// Binance spot ticker client
#[derive(Debug, Clone)]
pub struct BinanceTicker {
    client: Client,
    base_url: String,
}

impl BinanceTicker {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TICKER_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BotError::Config(format!("failed to build ticker client: {}", e)))?;

        Ok(BinanceTicker {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn ticker_url(&self) -> String {
        format!("{}/api/v3/ticker/price", self.base_url)
    }
}

#[async_trait]
impl PriceFeed for BinanceTicker {
    async fn price(&self, symbol: &str) -> Result<Decimal, ApiError> {
        debug!("Fetching ticker price for {}", symbol);

        let response = self
            .client
            .get(self.ticker_url())
            .query(&[("symbol", symbol)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status.as_u16(), &body));
        }

        let ticker: TickerPrice = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("ticker {}: {}", symbol, e)))?;
        Ok(ticker.price)
    }
}
