//! DCA bot launcher

use tracing::{info, warn};

use super::{report_creation_failure, resolve_account};
use crate::config::{DcaBotConfig, DEFAULT_EXCHANGE};
use crate::error::BotError;
use crate::threecommas::ThreeCommasClient;
use crate::types::{similar_pairs, Bot, BotKind};

/// Suggestions printed when a pair is not tradable
const MAX_SUGGESTIONS: usize = 5;

pub struct DcaBot {
    client: ThreeCommasClient,
    config: DcaBotConfig,
    exchange: String,
    account_id: Option<u64>,
}

impl DcaBot {
    pub fn new(client: ThreeCommasClient, config: DcaBotConfig) -> Self {
        DcaBot {
            client,
            config,
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

    pub fn config(&self) -> &DcaBotConfig {
        &self.config
    }

    pub async fn resolve_account(&self) -> Result<u64, BotError> {
        resolve_account(&self.client, self.account_id, &self.exchange).await
    }

    pub async fn create(&self) -> Result<Bot, BotError> {
        self.config.validate()?;
        let account_id = self.resolve_account().await?;

        info!("Creating DCA bot '{}' on {}", self.config.name, self.config.pair);
        match self.client.create_dca_bot(account_id, &self.config).await {
            Err(BotError::Api(e)) => {
                report_creation_failure(BotKind::Dca, &e);
                self.check_pair_availability(account_id).await;
                Err(BotError::Api(e))
            }
            other => other,
        }
    }

    /// Market code of the account the bot was submitted to
    async fn account_exchange(&self, account_id: u64) -> String {
        match self.client.get_accounts().await {
            Ok(accounts) => accounts
                .into_iter()
                .find(|a| a.id == account_id)
                .map(|a| a.market_code)
                .unwrap_or_else(|| self.exchange.clone()),
            Err(e) => {
                warn!("Could not look up account {}: {}", account_id, e);
                self.exchange.clone()
            }
        }
    }

    async fn check_pair_availability(&self, account_id: u64) {
        let exchange = self.account_exchange(account_id).await;
        let pairs = match self.client.get_market_pairs(&exchange).await {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!("Could not verify pair availability: {}", e);
                return;
            }
        };

        if pairs.is_empty() || pairs.contains(&self.config.pair) {
            return;
        }

        println!(
            "The pair {} may not be available on {}.",
            self.config.pair, exchange
        );
        let mut suggestions = similar_pairs(&self.config.pair, &pairs, MAX_SUGGESTIONS);
        if suggestions.is_empty() {
            suggestions = pairs.into_iter().take(MAX_SUGGESTIONS).collect();
        }
        println!("Consider using one of these pairs: {}", suggestions.join(", "));
    }

    pub async fn start(&self, bot_id: u64) -> Result<Bot, BotError> {
        let bot = self.client.enable_bot(bot_id).await?;
        info!("DCA bot started: {}", bot_id);
        Ok(bot)
    }

    pub async fn stop(&self, bot_id: u64) -> Result<Bot, BotError> {
        let bot = self.client.disable_bot(bot_id).await?;
        info!("DCA bot stopped: {}", bot_id);
        Ok(bot)
    }
}
