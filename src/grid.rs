//! Grid price range calculation
//!
//! Derives symmetric grid bounds around a reference price and provides the
//! static per-pair fallback used when no usable price is available.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::BotError;
use crate::types::Pair;

/// Decimal places kept on computed grid bounds
pub const PRICE_PRECISION: u32 = 8;

/// Lower/upper price range for a grid bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub lower: Decimal,
    pub upper: Decimal,
}

impl GridBounds {
    /// Validated bounds: lower must be positive and not above upper
    pub fn new(lower: Decimal, upper: Decimal) -> Result<Self, BotError> {
        if lower <= Decimal::ZERO || lower > upper {
            return Err(BotError::InvalidBounds { lower, upper });
        }
        Ok(GridBounds { lower, upper })
    }

    pub fn width(&self) -> Decimal {
        self.upper - self.lower
    }
}

/// Bounds `margin_percent` below and above `price`
///
/// `lower = price * (1 - margin/100)`, `upper = price * (1 + margin/100)`,
/// both rounded to [`PRICE_PRECISION`] places.
pub fn compute_bounds(price: Decimal, margin_percent: Decimal) -> Result<GridBounds, BotError> {
    if margin_percent < Decimal::ZERO || margin_percent >= dec!(100) {
        return Err(BotError::InvalidMargin(margin_percent));
    }

    let margin = margin_percent / dec!(100);
    let lower = (price * (Decimal::ONE - margin)).round_dp(PRICE_PRECISION);
    let upper = (price * (Decimal::ONE + margin)).round_dp(PRICE_PRECISION);

    GridBounds::new(lower, upper)
}

/// Approximate bounds for pairs whose price could not be resolved
///
/// These values are rough placeholders, not market prices. A bot launched
/// on them will almost certainly sit outside the real market range.
pub fn fallback_bounds(
    pair: &str,
    table: &BTreeMap<String, GridBounds>,
    default: GridBounds,
) -> GridBounds {
    let key = Pair::parse(pair)
        .map(|p| p.vendor())
        .unwrap_or_else(|_| pair.trim().to_uppercase());

    match table.get(&key) {
        Some(bounds) => {
            warn!(
                "Using static fallback grid range for {}: {} - {} (approximation, verify before trading)",
                key, bounds.lower, bounds.upper
            );
            *bounds
        }
        None => {
            warn!(
                "No fallback grid range for {}, using generic range {} - {} (approximation)",
                key, default.lower, default.upper
            );
            default
        }
    }
}

/// Built-in fallback ranges, keyed by vendor pair
pub fn default_fallback_bounds() -> BTreeMap<String, GridBounds> {
    [
        ("BTC_USDT", dec!(28000), dec!(30000)),
        ("ETH_USDT", dec!(1800), dec!(2000)),
        ("BTC_ETH", dec!(14.5), dec!(15.5)),
        ("ETH_BTC", dec!(0.065), dec!(0.07)),
    ]
    .into_iter()
    .map(|(pair, lower, upper)| (pair.to_string(), GridBounds { lower, upper }))
    .collect()
}

/// Generic range for pairs missing from the fallback table
pub fn default_generic_bounds() -> GridBounds {
    GridBounds {
        lower: dec!(90),
        upper: dec!(100),
    }
}
