//! 3Commas bot launcher
//!
//! Configures, launches and monitors grid and DCA bots through the 3Commas
//! REST API. Prices for grid ranges are resolved through a chain of vendor
//! endpoints, a public exchange ticker and configured fallbacks.

pub mod binance;
pub mod bots;
pub mod config;
pub mod error;
pub mod grid;
pub mod monitor;
pub mod rates;
pub mod threecommas;
pub mod types;

pub use config::Config;
pub use error::{ApiError, BotError};
pub use grid::{compute_bounds, GridBounds};
pub use rates::{RateOrigin, RateQuote, RateResolver};
pub use threecommas::ThreeCommasClient;
pub use types::*;
