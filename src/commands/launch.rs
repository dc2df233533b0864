//! Launch command
//!
//! Lists the connected accounts, then creates and starts the selected bots.
//! In test mode the prepared configurations are printed and nothing is
//! created.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use threecommas_bots::bots::{select_account, DcaBot, GridBot};
use threecommas_bots::{BotKind, ThreeCommasClient};

use super::{connect, load_config, print_connect_instructions, rate_resolver, runtime};

pub fn run(
    config_path: Option<PathBuf>,
    kinds: Vec<BotKind>,
    pair: Option<String>,
    account_id: Option<u64>,
    test_mode: bool,
) -> Result<()> {
    let runtime = runtime()?;
    runtime.block_on(run_async(config_path, kinds, pair, account_id, test_mode))
}

async fn run_async(
    config_path: Option<PathBuf>,
    kinds: Vec<BotKind>,
    pair: Option<String>,
    account_id: Option<u64>,
    test_mode: bool,
) -> Result<()> {
    let config = load_config(config_path.as_deref(), pair.as_deref())?;
    let client = connect(&config)?;

    let accounts = client
        .get_accounts()
        .await
        .context("Failed to fetch exchange accounts")?;
    println!("Available accounts: {}", accounts.len());
    if accounts.is_empty() {
        print_connect_instructions();
        return Ok(());
    }
    for account in &accounts {
        println!(
            "Account: {} ({}), ID: {}",
            account.name, account.market_code, account.id
        );
    }

    let account_id = match account_id {
        Some(id) => id,
        None => select_account(&accounts, &config.default_exchange)?.id,
    };

    if test_mode {
        println!("\n*** RUNNING IN TEST MODE - NO ACTUAL BOTS WILL BE CREATED ***\n");
    }

    if kinds.contains(&BotKind::Grid) {
        let resolver = rate_resolver(&config, client.clone())?;
        let bot = GridBot::new(
            client.clone(),
            resolver,
            config.grid_bot.clone(),
            config.fallback.clone(),
        )
        .with_exchange(config.default_exchange.clone())
        .with_account_id(Some(account_id));

        if test_mode {
            bot.config().validate()?;
            let prepared = bot.prepared_config().await?;
            print_config("Grid Bot", &prepared)?;
            println!("Test mode: Grid Bot would be created with the above configuration");
        } else {
            print_config("Grid Bot", bot.config())?;
            let created = bot.create().await.context("Failed to create grid bot")?;
            println!("Grid Bot created: {}", created.id);
            bot.start(created.id)
                .await
                .context("Failed to start grid bot")?;
            println!("Grid Bot started: {}", created.id);
        }
    }

    if kinds.contains(&BotKind::Dca) {
        let bot = DcaBot::new(client.clone(), config.dca_bot.clone())
            .with_exchange(config.default_exchange.clone())
            .with_account_id(Some(account_id));

        print_config("DCA Bot", bot.config())?;
        if test_mode {
            bot.config().validate()?;
            println!("Test mode: DCA Bot would be created with the above configuration");
        } else {
            let created = bot.create().await.context("Failed to create DCA bot")?;
            println!("DCA Bot created: {}", created.id);
            bot.start(created.id)
                .await
                .context("Failed to start DCA bot")?;
            println!("DCA Bot started: {}", created.id);
        }
    }

    if !test_mode {
        print_active_bots(&client).await?;
    }

    info!("Launch finished");
    Ok(())
}

fn print_config<T: Serialize>(label: &str, config: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    println!("{} configuration:\n{}", label, json);
    Ok(())
}

async fn print_active_bots(client: &ThreeCommasClient) -> Result<()> {
    let bots = client
        .get_active_bots()
        .await
        .context("Failed to fetch active bots")?;
    println!("\nActive bots: {}", bots.len());
    for bot in &bots {
        println!(
            "Bot: {}, Type: {}, Pair: {}",
            bot.name,
            bot.bot_type.as_deref().unwrap_or("Unknown"),
            bot.pairs_label()
        );
    }
    Ok(())
}
