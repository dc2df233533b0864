//! Binance public ticker, used when 3Commas cannot quote a pair
//! No API key needed for public market data endpoints.

mod client;
mod types;

pub use client::{BinanceTicker, USER_AGENT};
pub use types::*;
