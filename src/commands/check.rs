//! API check command
//!
//! Verifies connectivity and credentials, lists connected exchanges, checks
//! the configured pairs on each of them and tests price resolution. Prices
//! quoted by 3Commas are compared with the public ticker.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::warn;

use threecommas_bots::rates::{
    deviation_percent, ExternalTickerSource, RateSource, MAX_RATE_DEVIATION_PERCENT,
};
use threecommas_bots::{similar_pairs, Config, ThreeCommasClient};

use super::{
    connect, load_config, price_feed, print_connect_instructions, rate_resolver, runtime,
};

/// Suggestions shown for a pair missing on an exchange
const MAX_SUGGESTIONS: usize = 5;

pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    let runtime = runtime()?;
    runtime.block_on(run_async(config_path))
}

async fn run_async(config_path: Option<PathBuf>) -> Result<()> {
    println!("\n3Commas API Connection Checker");
    println!("{}\n", "=".repeat(32));

    let config = load_config(config_path.as_deref(), None)?;
    let client = connect(&config)?;

    println!("Connecting to 3Commas API...");
    let accounts = match client.get_accounts().await {
        Ok(accounts) => accounts,
        Err(e) => {
            println!("API connection error: {}", e);
            println!("\nPlease check:");
            println!("1. Your API keys in the .env file");
            println!("2. Your internet connection");
            println!("3. The 3Commas service status");
            return Err(e).context("API connection check failed");
        }
    };
    println!(
        "API connection successful! Found {} connected exchanges.",
        accounts.len()
    );

    if accounts.is_empty() {
        print_connect_instructions();
        return Ok(());
    }

    println!("\nConnected Exchanges:");
    for account in &accounts {
        println!(
            "- {} ({}), Type: {}, ID: {}",
            account.name,
            account.market_code,
            account.account_type.as_deref().unwrap_or("Unknown"),
            account.id
        );
    }

    println!("\nChecking exchange: {}", config.default_exchange);
    match accounts
        .iter()
        .find(|a| a.market_code.eq_ignore_ascii_case(&config.default_exchange))
    {
        Some(account) => println!(
            "Exchange '{}' found with account ID: {}",
            config.default_exchange, account.id
        ),
        None => {
            let codes: Vec<&str> = accounts.iter().map(|a| a.market_code.as_str()).collect();
            println!(
                "Exchange '{}' not found among your connected exchanges!",
                config.default_exchange
            );
            println!(
                "Set default_exchange (or 3COMMAS_DEFAULT_EXCHANGE) to one of: {}",
                codes.join(", ")
            );
        }
    }

    let pairs = config.configured_pairs();
    println!("\nChecking trading pairs: {}", pairs.join(", "));

    let mut seen = BTreeSet::new();
    for account in &accounts {
        if seen.insert(account.market_code.to_lowercase()) {
            check_pairs_on(&client, &account.market_code, &pairs).await;
        }
    }

    check_prices(&config, &client, &pairs).await?;

    println!("\nAPI check completed!");
    Ok(())
}

async fn check_pairs_on(client: &ThreeCommasClient, exchange: &str, pairs: &[String]) {
    println!("\nChecking pairs on {}...", exchange);

    let available = match client.get_market_pairs(exchange).await {
        Ok(available) => available,
        Err(e) => {
            warn!("Error checking pairs on {}: {}", exchange, e);
            println!("Error checking pairs on {}: {}", exchange, e);
            return;
        }
    };
    if available.is_empty() {
        println!("No pairs reported for {}", exchange);
        return;
    }
    println!("Found {} available pairs on {}", available.len(), exchange);

    for pair in pairs {
        if available.contains(pair) {
            println!("Pair '{}' is valid on {}", pair, exchange);
            continue;
        }
        println!("Pair '{}' NOT FOUND on {}", pair, exchange);
        let similar = similar_pairs(pair, &available, MAX_SUGGESTIONS);
        if !similar.is_empty() {
            println!("   Similar pairs you could use: {}", similar.join(", "));
        }
    }
}

async fn check_prices(
    config: &Config,
    client: &ThreeCommasClient,
    pairs: &[String],
) -> Result<()> {
    println!("\nTesting price fetching...");
    let resolver = rate_resolver(config, client.clone())?;
    let external =
        ExternalTickerSource::new(price_feed(config)?, config.fallback.stablecoin.clone());

    for pair in pairs {
        println!("Fetching price for {}...", pair);
        let quote = resolver.resolve(pair).await;
        println!("Price for {}: {} (source: {})", pair, quote.price, quote.origin);
        if quote.is_low_confidence() {
            println!("   This is an approximation - please verify the current market price");
        } else {
            verify_with_ticker(&external, pair, quote.price).await;
        }
    }
    Ok(())
}

/// Compare a 3Commas quote with the rate derived from the public ticker
async fn verify_with_ticker(external: &ExternalTickerSource, pair: &str, price: Decimal) {
    let Some(reference) = external.fetch(pair).await else {
        println!("   Could not verify {} against the public ticker", pair);
        return;
    };
    println!("   Public ticker rate: {}", reference);

    match deviation_percent(price, reference) {
        Some(diff) if diff < MAX_RATE_DEVIATION_PERCENT => {
            println!("   Rates match within {}% difference", diff);
        }
        Some(diff) => {
            warn!(
                "{} rate {} differs from ticker rate {} by {}%",
                pair, price, reference, diff
            );
            println!("   Rates differ by {}% - this might indicate an issue", diff);
        }
        None => {}
    }
}
