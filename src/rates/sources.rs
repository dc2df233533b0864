//! Concrete steps of the rate resolution chain

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{PriceFeed, RateOrigin, RateSource};
use crate::error::ApiError;
use crate::grid::PRICE_PRECISION;
use crate::threecommas::{CurrencyRate, ThreeCommasClient};
use crate::types::{toggle_delimiter, Pair};

fn last_price(
    pair: &str,
    origin: RateOrigin,
    result: Result<CurrencyRate, ApiError>,
) -> Option<Decimal> {
    match result {
        Ok(rate) => {
            if rate.last.is_none() {
                debug!("{} returned no 'last' field for {}", origin, pair);
            }
            rate.last
        }
        Err(e) => {
            warn!("Could not get rate for {} from {}: {}", pair, origin, e);
            None
        }
    }
}

/// `GET /ver1/accounts/currency_rates` with the pair as given
pub struct CurrencyRateSource {
    client: ThreeCommasClient,
}

impl CurrencyRateSource {
    pub fn new(client: ThreeCommasClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RateSource for CurrencyRateSource {
    fn origin(&self) -> RateOrigin {
        RateOrigin::CurrencyRates
    }

    async fn fetch(&self, pair: &str) -> Option<Decimal> {
        last_price(pair, self.origin(), self.client.get_currency_rate(pair).await)
    }
}

/// `GET /ver1/accounts/market_info` with the pair as given
pub struct MarketInfoSource {
    client: ThreeCommasClient,
}

impl MarketInfoSource {
    pub fn new(client: ThreeCommasClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RateSource for MarketInfoSource {
    fn origin(&self) -> RateOrigin {
        RateOrigin::MarketInfo
    }

    async fn fetch(&self, pair: &str) -> Option<Decimal> {
        last_price(pair, self.origin(), self.client.get_market_info(pair).await)
    }
}

/// Currency rates again with the delimiter toggled (`BTC_USDT` <-> `BTCUSDT`)
pub struct NormalizedPairSource {
    client: ThreeCommasClient,
}

impl NormalizedPairSource {
    pub fn new(client: ThreeCommasClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RateSource for NormalizedPairSource {
    fn origin(&self) -> RateOrigin {
        RateOrigin::NormalizedPair
    }

    async fn fetch(&self, pair: &str) -> Option<Decimal> {
        let Some(alt) = toggle_delimiter(pair) else {
            debug!("No alternative format for {}", pair);
            return None;
        };
        info!("Trying alternative pair format: {}", alt);
        last_price(&alt, self.origin(), self.client.get_currency_rate(&alt).await)
    }
}

/// Public ticker: cross rate through the stablecoin, then the direct symbol
pub struct ExternalTickerSource {
    feed: Arc<dyn PriceFeed>,
    stablecoin: String,
}

impl ExternalTickerSource {
    pub fn new(feed: Arc<dyn PriceFeed>, stablecoin: impl Into<String>) -> Self {
        Self {
            feed,
            stablecoin: stablecoin.into().to_uppercase(),
        }
    }

    async fn usd_price(&self, asset: &str) -> Option<Decimal> {
        if asset == self.stablecoin {
            return Some(Decimal::ONE);
        }
        let symbol = format!("{}{}", asset, self.stablecoin);
        match self.feed.price(&symbol).await {
            Ok(price) if price > Decimal::ZERO => Some(price),
            Ok(price) => {
                warn!("Ticker returned non-positive price {} for {}", price, symbol);
                None
            }
            Err(e) => {
                warn!("Ticker lookup failed for {}: {}", symbol, e);
                None
            }
        }
    }
}

#[async_trait]
impl RateSource for ExternalTickerSource {
    fn origin(&self) -> RateOrigin {
        RateOrigin::ExternalTicker
    }

    async fn fetch(&self, pair: &str) -> Option<Decimal> {
        let pair = match Pair::parse(pair) {
            Ok(p) => p,
            Err(e) => {
                warn!("Cannot query ticker: {}", e);
                return None;
            }
        };

        let base_usd = self.usd_price(pair.base()).await;
        let quote_usd = self.usd_price(pair.quote()).await;
        if let (Some(base), Some(quote)) = (base_usd, quote_usd) {
            let cross = (base / quote).round_dp(PRICE_PRECISION);
            info!(
                "Derived {} = {} from {}{} ({}) and {}{} ({})",
                pair,
                cross,
                pair.base(),
                self.stablecoin,
                base,
                pair.quote(),
                self.stablecoin,
                quote
            );
            return Some(cross);
        }

        let symbol = pair.symbol();
        debug!("Cross rate unavailable, trying ticker symbol {}", symbol);
        match self.feed.price(&symbol).await {
            Ok(price) => Some(price),
            Err(e) => {
                warn!("Ticker lookup failed for {}: {}", symbol, e);
                None
            }
        }
    }
}

/// Configured approximate prices keyed by canonical pair
pub struct StaticTableSource {
    prices: BTreeMap<String, Decimal>,
    base_prices: BTreeMap<String, Decimal>,
}

fn canonical(pair: &str) -> String {
    Pair::parse(pair)
        .map(|p| p.vendor())
        .unwrap_or_else(|_| pair.trim().to_uppercase())
}

impl StaticTableSource {
    pub fn new(prices: &BTreeMap<String, Decimal>) -> Self {
        Self {
            prices: prices
                .iter()
                .map(|(pair, price)| (canonical(pair), *price))
                .collect(),
            base_prices: BTreeMap::new(),
        }
    }

    /// Per-base prices consulted when the pair itself is not listed
    pub fn with_base_prices(mut self, base_prices: &BTreeMap<String, Decimal>) -> Self {
        self.base_prices = base_prices
            .iter()
            .map(|(base, price)| (base.trim().to_uppercase(), *price))
            .collect();
        self
    }

    fn base_price(&self, pair: &str) -> Option<Decimal> {
        let pair = Pair::parse(pair).ok()?;
        self.base_prices.get(pair.base()).copied()
    }
}

#[async_trait]
impl RateSource for StaticTableSource {
    fn origin(&self) -> RateOrigin {
        RateOrigin::StaticTable
    }

    async fn fetch(&self, pair: &str) -> Option<Decimal> {
        let key = canonical(pair);
        let price = self
            .prices
            .get(&key)
            .copied()
            .or_else(|| self.base_price(&key));
        if let Some(p) = price {
            warn!(
                "Using hardcoded price {} for {} (approximation, verify current market price)",
                p, key
            );
        }
        price
    }
}
