//! Configuration management
//!
//! Handles loading of the optional JSON configuration file, the environment
//! overlay for API credentials, and the one-shot `--pair` override. The
//! resulting [`Config`] is immutable and handed by value to each component.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::BotError;
use crate::grid::{self, GridBounds};
use crate::threecommas::Credentials;
use crate::types::Pair;

/// Default 3Commas API root
pub const DEFAULT_API_URL: &str = "https://api.3commas.io/public/api";

/// Default public ticker root used for fallback prices
pub const DEFAULT_TICKER_URL: &str = "https://api.binance.com";

/// Exchange code used when nothing else is configured
pub const DEFAULT_EXCHANGE: &str = "binance";

/// Pair used by both bots when nothing else is configured
pub const DEFAULT_PAIR: &str = "BTC_USDT";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    /// Exchange code (`market_code`) the launchers look for first
    #[serde(default = "default_exchange")]
    pub default_exchange: String,
    #[serde(default)]
    pub grid_bot: GridBotConfig,
    #[serde(default)]
    pub dca_bot: DcaBotConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

fn default_exchange() -> String {
    DEFAULT_EXCHANGE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig::default(),
            default_exchange: default_exchange(),
            grid_bot: GridBotConfig::default(),
            dca_bot: DcaBotConfig::default(),
            fallback: FallbackConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }

    /// Built-in defaults or the given file, with the environment applied on top
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Config::from_file(p)
                .with_context(|| format!("Failed to load config from {}", p.display()))?,
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Overlay API settings and the default exchange from the environment
    ///
    /// Both the `3COMMAS_*` names used in `.env` files and `THREECOMMAS_*`
    /// (exportable from a shell) are accepted.
    pub fn apply_env(&mut self) {
        if let Some(url) = env_var("API_URL") {
            self.api.base_url = url;
        }
        if let Some(key) = env_var("API_KEY") {
            self.api.api_key = Some(key);
        }
        if let Some(secret) = env_var("SECRET").or_else(|| env_var("API_SECRET")) {
            self.api.api_secret = Some(secret);
        }
        if let Some(exchange) = env_var("DEFAULT_EXCHANGE") {
            self.default_exchange = exchange;
        }
    }

    /// Replace the trading pair of both bots
    pub fn with_pair_override(mut self, pair: &str) -> Result<Self, BotError> {
        let pair = Pair::parse(pair)?.vendor();
        self.grid_bot.pair = pair.clone();
        self.dca_bot.pair = pair;
        Ok(self)
    }

    /// Check values that can be verified without talking to the API
    pub fn validate(&self) -> Result<(), BotError> {
        if self.default_exchange.trim().is_empty() {
            return Err(BotError::Config("default_exchange must not be empty".into()));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(BotError::Config("api.base_url must not be empty".into()));
        }
        for pair in [&self.grid_bot.pair, &self.dca_bot.pair] {
            if !pair.trim().is_empty() {
                Pair::parse(pair)?;
            }
        }
        if self.grid_bot.margin_percent < Decimal::ZERO
            || self.grid_bot.margin_percent >= dec!(100)
        {
            return Err(BotError::InvalidMargin(self.grid_bot.margin_percent));
        }
        for bounds in self
            .fallback
            .grid_bounds
            .values()
            .chain(std::iter::once(&self.fallback.default_grid_bounds))
        {
            GridBounds::new(bounds.lower, bounds.upper)?;
        }
        if self.fallback.default_price <= Decimal::ZERO {
            return Err(BotError::Config("fallback.default_price must be positive".into()));
        }
        Ok(())
    }

    /// Distinct pairs the two bots trade
    pub fn configured_pairs(&self) -> Vec<String> {
        let mut pairs = vec![self.grid_bot.pair.clone()];
        if self.dca_bot.pair != self.grid_bot.pair {
            pairs.push(self.dca_bot.pair.clone());
        }
        pairs
    }
}

fn env_var(suffix: &str) -> Option<String> {
    [format!("3COMMAS_{}", suffix), format!("THREECOMMAS_{}", suffix)]
        .iter()
        .find_map(|name| std::env::var(name).ok())
        .filter(|v| !v.trim().is_empty())
}

/// 3Commas API connection settings
///
/// Credentials come from the environment and are never serialized.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_secret: Option<String>,
    pub timeout_secs: u64,
    /// Retries for 5xx responses and connection failures
    pub max_retries: u32,
    pub ticker_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            api_secret: None,
            timeout_secs: 30,
            max_retries: 3,
            ticker_url: DEFAULT_TICKER_URL.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn credentials(&self) -> Result<Credentials, BotError> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) => Ok(Credentials::new(key.clone(), secret.clone())),
            _ => Err(BotError::Config(
                "3Commas API key and secret are required (set 3COMMAS_API_KEY and 3COMMAS_SECRET)"
                    .into(),
            )),
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("ticker_url", &self.ticker_url)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeverageType {
    #[default]
    Spot,
    Cross,
    Isolated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DealStrategy {
    #[default]
    Long,
    Short,
}

/// Grid bot parameters
///
/// Bounds left empty are derived from the current price at launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridBotConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pair: String,
    #[serde(default)]
    pub upper_price: Option<Decimal>,
    #[serde(default)]
    pub lower_price: Option<Decimal>,
    #[serde(default)]
    pub quantity_per_grid: Option<Decimal>,
    #[serde(default)]
    pub grids_count: Option<u32>,
    #[serde(default)]
    pub leverage_type: LeverageType,
    #[serde(default = "default_leverage")]
    pub leverage_custom_value: u32,
    /// Percent below and above the current price for derived bounds
    #[serde(default = "default_margin")]
    pub margin_percent: Decimal,
}

fn default_leverage() -> u32 {
    1
}

fn default_margin() -> Decimal {
    dec!(5)
}

impl Default for GridBotConfig {
    fn default() -> Self {
        GridBotConfig {
            name: "Auto Grid Bot".to_string(),
            pair: DEFAULT_PAIR.to_string(),
            upper_price: None,
            lower_price: None,
            quantity_per_grid: Some(dec!(0.001)),
            grids_count: Some(20),
            leverage_type: LeverageType::Spot,
            leverage_custom_value: default_leverage(),
            margin_percent: default_margin(),
        }
    }
}

impl GridBotConfig {
    /// Check every required field except the price bounds
    pub fn validate(&self) -> Result<(), BotError> {
        let missing = |field| BotError::MissingField { bot: "grid", field };
        if self.name.trim().is_empty() {
            return Err(missing("name"));
        }
        if self.pair.trim().is_empty() {
            return Err(missing("pair"));
        }
        if self.quantity_per_grid.is_none() {
            return Err(missing("quantity_per_grid"));
        }
        if self.grids_count.is_none() {
            return Err(missing("grids_count"));
        }
        Ok(())
    }

    /// Configured bounds, if both are set
    pub fn bounds(&self) -> Result<GridBounds, BotError> {
        let missing = |field| BotError::MissingField { bot: "grid", field };
        let upper = self.upper_price.ok_or_else(|| missing("upper_price"))?;
        let lower = self.lower_price.ok_or_else(|| missing("lower_price"))?;
        GridBounds::new(lower, upper)
    }

    pub fn with_bounds(mut self, bounds: GridBounds) -> Self {
        self.lower_price = Some(bounds.lower);
        self.upper_price = Some(bounds.upper);
        self
    }
}

/// DCA bot parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcaBotConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pair: String,
    /// Base order size in quote currency
    #[serde(default)]
    pub base_order_volume: Option<Decimal>,
    #[serde(default)]
    pub safety_order_volume: Option<Decimal>,
    #[serde(default)]
    pub max_safety_orders: Option<u32>,
    #[serde(default = "default_max_active_safety_orders")]
    pub max_active_safety_orders: u32,
    /// Each safety order is this many times larger than the previous one
    #[serde(default = "default_martingale_volume")]
    pub martingale_volume_coefficient: Decimal,
    #[serde(default = "default_martingale_step")]
    pub martingale_step_coefficient: Decimal,
    /// Take profit percentage
    #[serde(default)]
    pub take_profit: Option<Decimal>,
    /// Price deviation that opens the first safety order
    #[serde(default)]
    pub safety_order_step_percentage: Option<Decimal>,
    #[serde(default)]
    pub strategy: DealStrategy,
}

fn default_max_active_safety_orders() -> u32 {
    3
}

fn default_martingale_volume() -> Decimal {
    dec!(1.5)
}

fn default_martingale_step() -> Decimal {
    dec!(1.0)
}

impl Default for DcaBotConfig {
    fn default() -> Self {
        DcaBotConfig {
            name: "Auto DCA Bot".to_string(),
            pair: DEFAULT_PAIR.to_string(),
            base_order_volume: Some(dec!(10)),
            safety_order_volume: Some(dec!(20)),
            max_safety_orders: Some(5),
            max_active_safety_orders: default_max_active_safety_orders(),
            martingale_volume_coefficient: default_martingale_volume(),
            martingale_step_coefficient: default_martingale_step(),
            take_profit: Some(dec!(1.5)),
            safety_order_step_percentage: Some(dec!(2.5)),
            strategy: DealStrategy::Long,
        }
    }
}

impl DcaBotConfig {
    pub fn validate(&self) -> Result<(), BotError> {
        let missing = |field| BotError::MissingField { bot: "DCA", field };
        if self.name.trim().is_empty() {
            return Err(missing("name"));
        }
        if self.pair.trim().is_empty() {
            return Err(missing("pair"));
        }
        if self.base_order_volume.is_none() {
            return Err(missing("base_order_volume"));
        }
        if self.safety_order_volume.is_none() {
            return Err(missing("safety_order_volume"));
        }
        if self.max_safety_orders.is_none() {
            return Err(missing("max_safety_orders"));
        }
        if self.take_profit.is_none() {
            return Err(missing("take_profit"));
        }
        if self.safety_order_step_percentage.is_none() {
            return Err(missing("safety_order_step_percentage"));
        }
        Ok(())
    }
}

/// Last-resort values used when live prices are unavailable
///
/// These are stale point-in-time approximations. Anything derived from them
/// is logged as low confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Approximate prices keyed by vendor pair (`BTC_USDT`)
    #[serde(default = "default_fallback_prices")]
    pub prices: BTreeMap<String, Decimal>,
    /// Approximate prices by base asset, used for pairs missing from `prices`
    #[serde(default = "default_base_prices")]
    pub base_prices: BTreeMap<String, Decimal>,
    /// Price returned when a pair is not in `prices` or `base_prices`
    #[serde(default = "default_price")]
    pub default_price: Decimal,
    /// Grid ranges used when no price could be resolved
    #[serde(default = "grid::default_fallback_bounds")]
    pub grid_bounds: BTreeMap<String, GridBounds>,
    #[serde(default = "grid::default_generic_bounds")]
    pub default_grid_bounds: GridBounds,
    /// Stablecoin used to derive cross rates from the public ticker
    #[serde(default = "default_stablecoin")]
    pub stablecoin: String,
}

fn default_fallback_prices() -> BTreeMap<String, Decimal> {
    [
        ("BTC_USDT", dec!(66000)),
        ("ETH_USDT", dec!(3500)),
        ("BTC_ETH", dec!(18.85)),
    ]
    .into_iter()
    .map(|(pair, price)| (pair.to_string(), price))
    .collect()
}

fn default_base_prices() -> BTreeMap<String, Decimal> {
    [("BTC", dec!(15)), ("ETH", dec!(1.5))]
        .into_iter()
        .map(|(base, price)| (base.to_string(), price))
        .collect()
}

fn default_price() -> Decimal {
    dec!(100)
}

fn default_stablecoin() -> String {
    "USDT".to_string()
}

impl Default for FallbackConfig {
    fn default() -> Self {
        FallbackConfig {
            prices: default_fallback_prices(),
            base_prices: default_base_prices(),
            default_price: default_price(),
            grid_bounds: grid::default_fallback_bounds(),
            default_grid_bounds: grid::default_generic_bounds(),
            stablecoin: default_stablecoin(),
        }
    }
}

/// Bot monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_secs: u64,
    pub deals_per_bot: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            interval_secs: 60,
            deals_per_bot: 3,
        }
    }
}
