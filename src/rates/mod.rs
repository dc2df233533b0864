//! Rate resolution
//!
//! A pair's current price is looked up through an ordered chain of
//! [`RateSource`]s. The first source returning a positive price wins; when
//! every source fails the configured default price is used. Resolution never
//! returns an error, the [`RateOrigin`] on the result tells the caller how
//! much to trust it.

mod sources;

pub use sources::{
    CurrencyRateSource, ExternalTickerSource, MarketInfoSource, NormalizedPairSource,
    StaticTableSource,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::FallbackConfig;
use crate::error::ApiError;
use crate::threecommas::ThreeCommasClient;

/// Where a resolved price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateOrigin {
    CurrencyRates,
    MarketInfo,
    NormalizedPair,
    ExternalTicker,
    StaticTable,
    Default,
}

impl fmt::Display for RateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            RateOrigin::CurrencyRates => "3Commas currency rates",
            RateOrigin::MarketInfo => "3Commas market info",
            RateOrigin::NormalizedPair => "3Commas currency rates (normalized pair)",
            RateOrigin::ExternalTicker => "external ticker",
            RateOrigin::StaticTable => "static price table",
            RateOrigin::Default => "default price",
        };
        write!(f, "{}", name)
    }
}

/// Resolved price plus its origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuote {
    pub price: Decimal,
    pub origin: RateOrigin,
}

impl RateQuote {
    /// Prices not quoted by 3Commas itself
    pub fn is_low_confidence(&self) -> bool {
        matches!(
            self.origin,
            RateOrigin::ExternalTicker | RateOrigin::StaticTable | RateOrigin::Default
        )
    }
}

/// Difference between two quotes of one pair that is worth a warning
pub const MAX_RATE_DEVIATION_PERCENT: Decimal = dec!(5);

/// How far `reference` is from `price`, in percent of `price`
///
/// Rounded to 2 places. `None` when `price` is not positive.
pub fn deviation_percent(price: Decimal, reference: Decimal) -> Option<Decimal> {
    if price <= Decimal::ZERO {
        return None;
    }
    Some(((reference - price) / price * dec!(100)).abs().round_dp(2))
}

/// Spot price lookup by exchange symbol (`BTCUSDT`)
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn price(&self, symbol: &str) -> Result<Decimal, ApiError>;
}

/// One step of the resolution chain
///
/// Implementations log their own failures and report them as `None`.
#[async_trait]
pub trait RateSource: Send + Sync {
    fn origin(&self) -> RateOrigin;

    async fn fetch(&self, pair: &str) -> Option<Decimal>;
}

pub struct RateResolver {
    sources: Vec<Box<dyn RateSource>>,
    default_price: Decimal,
}

impl RateResolver {
    pub fn new(sources: Vec<Box<dyn RateSource>>, default_price: Decimal) -> Self {
        RateResolver {
            sources,
            default_price,
        }
    }

    /// The full chain: 3Commas endpoints, external ticker, static table
    pub fn standard(
        client: ThreeCommasClient,
        feed: Arc<dyn PriceFeed>,
        fallback: &FallbackConfig,
    ) -> Self {
        let sources: Vec<Box<dyn RateSource>> = vec![
            Box::new(CurrencyRateSource::new(client.clone())),
            Box::new(MarketInfoSource::new(client.clone())),
            Box::new(NormalizedPairSource::new(client)),
            Box::new(ExternalTickerSource::new(feed, fallback.stablecoin.clone())),
            Box::new(
                StaticTableSource::new(&fallback.prices).with_base_prices(&fallback.base_prices),
            ),
        ];
        RateResolver::new(sources, fallback.default_price)
    }

    pub async fn resolve(&self, pair: &str) -> RateQuote {
        debug!("Resolving rate for {}", pair);

        for source in &self.sources {
            match source.fetch(pair).await {
                Some(price) if price > Decimal::ZERO => {
                    info!("Rate for {} from {}: {}", pair, source.origin(), price);
                    return RateQuote {
                        price,
                        origin: source.origin(),
                    };
                }
                Some(price) => {
                    warn!(
                        "Ignoring non-positive rate {} for {} from {}",
                        price,
                        pair,
                        source.origin()
                    );
                }
                None => debug!("No rate for {} from {}", pair, source.origin()),
            }
        }

        warn!(
            "All rate sources failed for {}, using default price {} (approximation)",
            pair, self.default_price
        );
        RateQuote {
            price: self.default_price,
            origin: RateOrigin::Default,
        }
    }
}
