//! Monitor command: periodic report of active bots until Ctrl+C

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use threecommas_bots::monitor::BotMonitor;

use super::{connect, load_config, runtime};

pub fn run(
    config_path: Option<PathBuf>,
    interval: Option<u64>,
    iterations: Option<u32>,
) -> Result<()> {
    let runtime = runtime()?;
    runtime.block_on(run_async(config_path, interval, iterations))
}

async fn run_async(
    config_path: Option<PathBuf>,
    interval: Option<u64>,
    iterations: Option<u32>,
) -> Result<()> {
    let config = load_config(config_path.as_deref(), None)?;
    let client = connect(&config)?;
    let interval = Duration::from_secs(interval.unwrap_or(config.monitor.interval_secs));

    println!("\n3Commas Bot Monitor");
    println!("{}", "=".repeat(20));

    let accounts = client
        .get_accounts()
        .await
        .context("Failed to fetch exchange accounts")?;
    println!("Connected accounts: {}", accounts.len());
    for account in &accounts {
        println!("- {} ({})", account.name, account.market_code);
    }

    let monitor = BotMonitor::new(client, config.monitor.deals_per_bot);
    let ticks = monitor.poll(interval, iterations).await;

    info!("Monitor finished after {} refreshes", ticks);
    println!("\nMonitoring stopped after {} refreshes.", ticks);
    Ok(())
}
