//! Stop command: disable a bot by id

use anyhow::{Context, Result};
use std::path::PathBuf;

use threecommas_bots::bots::{DcaBot, GridBot};
use threecommas_bots::BotKind;

use super::{connect, load_config, rate_resolver, runtime};

pub fn run(config_path: Option<PathBuf>, bot_id: u64, kind: BotKind) -> Result<()> {
    let runtime = runtime()?;
    runtime.block_on(run_async(config_path, bot_id, kind))
}

async fn run_async(config_path: Option<PathBuf>, bot_id: u64, kind: BotKind) -> Result<()> {
    let config = load_config(config_path.as_deref(), None)?;
    let client = connect(&config)?;

    let bot = match kind {
        BotKind::Grid => {
            let resolver = rate_resolver(&config, client.clone())?;
            GridBot::new(client, resolver, config.grid_bot, config.fallback)
                .stop(bot_id)
                .await
        }
        BotKind::Dca => DcaBot::new(client, config.dca_bot).stop(bot_id).await,
    }
    .with_context(|| format!("Failed to stop {} bot {}", kind, bot_id))?;

    println!(
        "{} bot stopped: {} (ID: {}, enabled: {})",
        kind, bot.name, bot.id, bot.is_enabled
    );
    Ok(())
}
