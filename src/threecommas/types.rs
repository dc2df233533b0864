//! Request and response payloads for the 3Commas API

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{DcaBotConfig, DealStrategy, GridBotConfig, LeverageType};
use crate::error::BotError;

/// Rate snapshot returned by the currency rate and market info endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRate {
    #[serde(default)]
    pub last: Option<Decimal>,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
}

/// Body of `POST /ver1/grid_bots/manual`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridBotRequest {
    pub account_id: u64,
    pub name: String,
    pub pair: String,
    pub upper_price: Decimal,
    pub lower_price: Decimal,
    pub quantity_per_grid: Decimal,
    pub grids_count: u32,
    pub leverage_type: LeverageType,
    pub leverage_custom_value: u32,
}

impl GridBotRequest {
    /// Build the payload, failing on any missing required field
    pub fn from_config(account_id: u64, config: &GridBotConfig) -> Result<Self, BotError> {
        config.validate()?;
        let bounds = config.bounds()?;
        let missing = |field| BotError::MissingField { bot: "grid", field };

        Ok(GridBotRequest {
            account_id,
            name: config.name.clone(),
            pair: config.pair.clone(),
            upper_price: bounds.upper,
            lower_price: bounds.lower,
            quantity_per_grid: config
                .quantity_per_grid
                .ok_or_else(|| missing("quantity_per_grid"))?,
            grids_count: config.grids_count.ok_or_else(|| missing("grids_count"))?,
            leverage_type: config.leverage_type,
            leverage_custom_value: config.leverage_custom_value,
        })
    }
}

/// Body of `POST /ver1/bots/create_bot`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcaBotRequest {
    pub account_id: u64,
    pub name: String,
    pub pairs: Vec<String>,
    pub base_order_volume: Decimal,
    pub safety_order_volume: Decimal,
    pub max_safety_orders: u32,
    pub max_active_safety_orders: u32,
    pub martingale_volume_coefficient: Decimal,
    pub martingale_step_coefficient: Decimal,
    pub take_profit: Decimal,
    pub safety_order_step_percentage: Decimal,
    pub strategy: DealStrategy,
    pub active: bool,
}

impl DcaBotRequest {
    pub fn from_config(account_id: u64, config: &DcaBotConfig) -> Result<Self, BotError> {
        config.validate()?;
        let missing = |field| BotError::MissingField { bot: "DCA", field };

        Ok(DcaBotRequest {
            account_id,
            name: config.name.clone(),
            pairs: vec![config.pair.clone()],
            base_order_volume: config
                .base_order_volume
                .ok_or_else(|| missing("base_order_volume"))?,
            safety_order_volume: config
                .safety_order_volume
                .ok_or_else(|| missing("safety_order_volume"))?,
            max_safety_orders: config
                .max_safety_orders
                .ok_or_else(|| missing("max_safety_orders"))?,
            max_active_safety_orders: config.max_active_safety_orders,
            martingale_volume_coefficient: config.martingale_volume_coefficient,
            martingale_step_coefficient: config.martingale_step_coefficient,
            take_profit: config.take_profit.ok_or_else(|| missing("take_profit"))?,
            safety_order_step_percentage: config
                .safety_order_step_percentage
                .ok_or_else(|| missing("safety_order_step_percentage"))?,
            strategy: config.strategy,
            active: true,
        })
    }
}
