//! 3Commas API client
//!
//! Typed operations on top of a [`Transport`]. Creation calls validate their
//! configuration before anything is sent.
//!
//! # Example
//!
//! ```no_run
//! use threecommas_bots::config::ApiConfig;
//! use threecommas_bots::threecommas::ThreeCommasClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut api = ApiConfig::default();
//!     api.api_key = Some("api_key".into());
//!     api.api_secret = Some("api_secret".into());
//!
//!     let client = ThreeCommasClient::from_config(&api)?;
//!     for account in client.get_accounts().await? {
//!         println!("{} ({})", account.name, account.market_code);
//!     }
//!     Ok(())
//! }
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::transport::{ApiRequest, HttpTransport, Transport, TransportConfig};
use super::types::{CurrencyRate, DcaBotRequest, GridBotRequest};
use crate::config::{ApiConfig, DcaBotConfig, GridBotConfig};
use crate::error::{ApiError, BotError};
use crate::types::{Account, Bot, Deal};

/// Deals requested per bot when listing
pub const DEALS_PAGE_SIZE: u32 = 50;

/// Bots requested when listing active bots
pub const BOTS_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct ThreeCommasClient {
    transport: Arc<dyn Transport>,
}

impl ThreeCommasClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Signed HTTP client from API settings; fails when credentials are missing
    pub fn from_config(api: &ApiConfig) -> Result<Self, BotError> {
        let transport = HttpTransport::new(api.credentials()?, TransportConfig::from(api))?;
        Ok(Self::new(Arc::new(transport)))
    }

    async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let value = self.transport.send(request).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))
    }

    // ==================== ACCOUNTS & MARKET DATA ====================

    /// Exchange accounts connected to 3Commas
    pub async fn get_accounts(&self) -> Result<Vec<Account>, ApiError> {
        self.request(ApiRequest::get("/ver1/accounts")).await
    }

    /// Pairs tradable on an exchange, in vendor format
    pub async fn get_market_pairs(&self, market_code: &str) -> Result<Vec<String>, ApiError> {
        self.request(ApiRequest::get("/ver1/accounts/market_pairs").param("market_code", market_code))
            .await
    }

    /// Current rate for a pair (primary rate endpoint)
    pub async fn get_currency_rate(&self, pair: &str) -> Result<CurrencyRate, ApiError> {
        self.request(ApiRequest::get("/ver1/accounts/currency_rates").param("pair", pair))
            .await
    }

    /// Market information for a pair (secondary rate endpoint)
    pub async fn get_market_info(&self, pair: &str) -> Result<CurrencyRate, ApiError> {
        self.request(ApiRequest::get("/ver1/accounts/market_info").param("pair", pair))
            .await
    }

    // ==================== GRID BOTS ====================

    /// Create a grid bot; validation failures never reach the transport
    pub async fn create_grid_bot(
        &self,
        account_id: u64,
        config: &GridBotConfig,
    ) -> Result<Bot, BotError> {
        let payload = GridBotRequest::from_config(account_id, config)?;
        debug!("Grid bot payload: {:?}", payload);
        let body = serde_json::to_value(&payload).map_err(|e| ApiError::Decode(e.to_string()))?;

        let bot: Bot = self
            .request(ApiRequest::post("/ver1/grid_bots/manual", Some(body)))
            .await?;
        info!("Grid bot created: id={}", bot.id);
        Ok(bot)
    }

    /// Parameter limits the vendor accepts for a manual grid bot
    pub async fn grid_creation_params(&self, account_id: u64, pair: &str) -> Result<Value, ApiError> {
        self.request(
            ApiRequest::get("/ver1/grid_bots/manual_creation_params")
                .param("account_id", account_id)
                .param("pair", pair),
        )
        .await
    }

    pub async fn enable_grid_bot(&self, bot_id: u64) -> Result<Bot, ApiError> {
        self.request(ApiRequest::post(format!("/ver1/grid_bots/{}/enable", bot_id), None))
            .await
    }

    pub async fn disable_grid_bot(&self, bot_id: u64) -> Result<Bot, ApiError> {
        self.request(ApiRequest::post(format!("/ver1/grid_bots/{}/disable", bot_id), None))
            .await
    }

    // ==================== DCA BOTS ====================

    /// Create a DCA bot; validation failures never reach the transport
    pub async fn create_dca_bot(
        &self,
        account_id: u64,
        config: &DcaBotConfig,
    ) -> Result<Bot, BotError> {
        let payload = DcaBotRequest::from_config(account_id, config)?;
        debug!("DCA bot payload: {:?}", payload);
        let body = serde_json::to_value(&payload).map_err(|e| ApiError::Decode(e.to_string()))?;

        let bot: Bot = self
            .request(ApiRequest::post("/ver1/bots/create_bot", Some(body)))
            .await?;
        info!("DCA bot created: id={}", bot.id);
        Ok(bot)
    }

    pub async fn enable_bot(&self, bot_id: u64) -> Result<Bot, ApiError> {
        self.request(ApiRequest::post(format!("/ver1/bots/{}/enable", bot_id), None))
            .await
    }

    pub async fn disable_bot(&self, bot_id: u64) -> Result<Bot, ApiError> {
        self.request(ApiRequest::post(format!("/ver1/bots/{}/disable", bot_id), None))
            .await
    }

    /// Enabled DCA bots
    pub async fn get_active_bots(&self) -> Result<Vec<Bot>, ApiError> {
        self.request(
            ApiRequest::get("/ver1/bots")
                .param("limit", BOTS_PAGE_SIZE)
                .param("scope", "enabled"),
        )
        .await
    }

    /// Most recent deals of a bot, newest first
    pub async fn get_bot_deals(&self, bot_id: u64) -> Result<Vec<Deal>, ApiError> {
        self.request(
            ApiRequest::get("/ver1/deals")
                .param("bot_id", bot_id)
                .param("limit", DEALS_PAGE_SIZE),
        )
        .await
    }
}
