//! CLI command implementations

pub mod check;
pub mod launch;
pub mod monitor;
pub mod stop;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;

use threecommas_bots::binance::BinanceTicker;
use threecommas_bots::rates::PriceFeed;
use threecommas_bots::{Config, RateResolver, ThreeCommasClient};

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")
}

/// Defaults or file, environment on top, then the one-shot pair override
fn load_config(path: Option<&Path>, pair: Option<&str>) -> Result<Config> {
    let mut config = Config::load(path)?;
    if let Some(pair) = pair {
        config = config.with_pair_override(pair)?;
    }
    config.validate()?;
    Ok(config)
}

fn connect(config: &Config) -> Result<ThreeCommasClient> {
    ThreeCommasClient::from_config(&config.api).context("Failed to create 3Commas client")
}

fn price_feed(config: &Config) -> Result<Arc<dyn PriceFeed>> {
    let ticker = BinanceTicker::new(config.api.ticker_url.clone())?;
    Ok(Arc::new(ticker))
}

fn rate_resolver(config: &Config, client: ThreeCommasClient) -> Result<Arc<RateResolver>> {
    Ok(Arc::new(RateResolver::standard(
        client,
        price_feed(config)?,
        &config.fallback,
    )))
}

fn print_connect_instructions() {
    println!("\nNo exchange accounts connected to 3Commas!");
    println!("Please follow these steps:");
    println!("1. Log in to your 3Commas account");
    println!("2. Go to 'My Exchanges' in the left sidebar");
    println!("3. Click 'Connect Exchange' and follow the instructions");
    println!("4. Come back and run this command again\n");
}
