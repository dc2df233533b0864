//! Binance public ticker payloads

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response of `GET /api/v3/ticker/price`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: Decimal,
}
