//! Grid bot launcher

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use super::{report_creation_failure, resolve_account};
use crate::config::{FallbackConfig, GridBotConfig, DEFAULT_EXCHANGE};
use crate::error::BotError;
use crate::grid::{compute_bounds, fallback_bounds, GridBounds};
use crate::rates::{RateOrigin, RateResolver};
use crate::threecommas::ThreeCommasClient;
use crate::types::{Bot, BotKind};

pub struct GridBot {
    client: ThreeCommasClient,
    resolver: Arc<RateResolver>,
    config: GridBotConfig,
    fallback: FallbackConfig,
    exchange: String,
    account_id: Option<u64>,
}

impl GridBot {
    pub fn new(
        client: ThreeCommasClient,
        resolver: Arc<RateResolver>,
        config: GridBotConfig,
        fallback: FallbackConfig,
    ) -> Self {
        GridBot {
            client,
            resolver,
            config,
            fallback,
            exchange: DEFAULT_EXCHANGE.to_string(),
            account_id: None,
        }
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = exchange.into();
        self
    }

    pub fn with_account_id(mut self, account_id: Option<u64>) -> Self {
        self.account_id = account_id;
        self
    }

    pub fn config(&self) -> &GridBotConfig {
        &self.config
    }

    pub async fn resolve_account(&self) -> Result<u64, BotError> {
        resolve_account(&self.client, self.account_id, &self.exchange).await
    }

    /// Configured bounds, or bounds around the resolved price
    ///
    /// Falls back to the static range table when no source quoted a price
    /// or the computed range collapses at 8 decimal places.
    pub async fn calculate_bounds(&self) -> Result<GridBounds, BotError> {
        if self.config.upper_price.is_some() && self.config.lower_price.is_some() {
            return self.config.bounds();
        }

        info!("Fetching current price for {}", self.config.pair);
        let quote = self.resolver.resolve(&self.config.pair).await;

        if quote.origin == RateOrigin::Default || quote.price <= Decimal::ZERO {
            warn!("No usable price for {}, using default range", self.config.pair);
            return Ok(self.fallback_bounds());
        }

        if quote.is_low_confidence() {
            warn!(
                "Price {} for {} comes from {}; grid range may not match the market",
                quote.price, self.config.pair, quote.origin
            );
        }

        match compute_bounds(quote.price, self.config.margin_percent) {
            Ok(bounds) => {
                info!(
                    "Grid price range for {}: {} - {} (current {}, margin {}%)",
                    self.config.pair,
                    bounds.lower,
                    bounds.upper,
                    quote.price,
                    self.config.margin_percent
                );
                Ok(bounds)
            }
            Err(BotError::InvalidBounds { lower, upper }) => {
                warn!(
                    "Price {} for {} gives unusable range {} - {}, using default range",
                    quote.price, self.config.pair, lower, upper
                );
                Ok(self.fallback_bounds())
            }
            Err(e) => Err(e),
        }
    }

    fn fallback_bounds(&self) -> GridBounds {
        fallback_bounds(
            &self.config.pair,
            &self.fallback.grid_bounds,
            self.fallback.default_grid_bounds,
        )
    }

    /// The configuration that would be submitted, with bounds filled in
    pub async fn prepared_config(&self) -> Result<GridBotConfig, BotError> {
        let bounds = self.calculate_bounds().await?;
        Ok(self.config.clone().with_bounds(bounds))
    }

    pub async fn create(&self) -> Result<Bot, BotError> {
        self.config.validate()?;
        let account_id = self.resolve_account().await?;
        let config = self.prepared_config().await?;

        info!("Creating grid bot '{}' on {}", config.name, config.pair);
        match self.client.create_grid_bot(account_id, &config).await {
            Err(BotError::Api(e)) => {
                report_creation_failure(BotKind::Grid, &e);
                self.show_creation_params(account_id).await;
                Err(BotError::Api(e))
            }
            other => other,
        }
    }

    async fn show_creation_params(&self, account_id: u64) {
        match self
            .client
            .grid_creation_params(account_id, &self.config.pair)
            .await
        {
            Ok(params) => println!(
                "Valid grid bot parameters for {}: {}",
                self.config.pair, params
            ),
            Err(e) => warn!("Could not get valid grid parameters: {}", e),
        }
    }

    pub async fn start(&self, bot_id: u64) -> Result<Bot, BotError> {
        let bot = self.client.enable_grid_bot(bot_id).await?;
        info!("Grid bot started: {}", bot_id);
        Ok(bot)
    }

    pub async fn stop(&self, bot_id: u64) -> Result<Bot, BotError> {
        let bot = self.client.disable_grid_bot(bot_id).await?;
        info!("Grid bot stopped: {}", bot_id);
        Ok(bot)
    }
}
