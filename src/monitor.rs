//! Periodic status report of active bots
//!
//! Polls the vendor for enabled bots and their latest deals, prints a report
//! per tick and keeps going when a fetch fails. Ctrl+C ends the loop between
//! or during ticks.

use chrono::Local;
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::threecommas::ThreeCommasClient;
use crate::types::{Bot, Deal};

/// One bot with its most recent deals
///
/// `deals` is `None` when the deals request failed.
#[derive(Debug, Clone)]
pub struct BotStatus {
    pub bot: Bot,
    pub deals: Option<Vec<Deal>>,
}

pub struct BotMonitor {
    client: ThreeCommasClient,
    deals_per_bot: usize,
}

impl BotMonitor {
    pub fn new(client: ThreeCommasClient, deals_per_bot: usize) -> Self {
        BotMonitor {
            client,
            deals_per_bot,
        }
    }

    /// Active bots and up to `deals_per_bot` recent deals for each
    pub async fn refresh(&self) -> Result<Vec<BotStatus>, ApiError> {
        let bots = self.client.get_active_bots().await?;
        let mut statuses = Vec::with_capacity(bots.len());

        for bot in bots {
            let deals = match self.client.get_bot_deals(bot.id).await {
                Ok(mut deals) => {
                    deals.truncate(self.deals_per_bot);
                    Some(deals)
                }
                Err(e) => {
                    warn!("Could not get deals for bot {}: {}", bot.id, e);
                    None
                }
            };
            statuses.push(BotStatus { bot, deals });
        }

        Ok(statuses)
    }

    /// Run up to `iterations` ticks (forever when `None`), `interval` apart
    ///
    /// Returns the number of completed ticks.
    pub async fn poll(&self, interval: Duration, iterations: Option<u32>) -> u32 {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut signal_ok = true;
        let mut completed = 0u32;

        loop {
            if iterations.is_some_and(|n| completed >= n) {
                break;
            }

            let tick = completed + 1;
            tokio::select! {
                result = self.refresh() => {
                    print_header(tick);
                    match result {
                        Ok(statuses) => print_statuses(&statuses),
                        Err(e) => warn!("Error during monitoring: {}", e),
                    }
                    completed = tick;
                }
                res = &mut ctrl_c, if signal_ok => {
                    if res.is_ok() {
                        info!("Monitoring stopped by user");
                        break;
                    }
                    signal_ok = false;
                    continue;
                }
            }

            if iterations.is_some_and(|n| completed >= n) {
                break;
            }

            println!(
                "\nRefreshing in {} seconds... (Press Ctrl+C to exit)",
                interval.as_secs()
            );
            tokio::select! {
                _ = sleep(interval) => {}
                res = &mut ctrl_c, if signal_ok => {
                    if res.is_ok() {
                        info!("Monitoring stopped by user");
                        break;
                    }
                    signal_ok = false;
                }
            }
        }

        completed
    }
}

fn print_header(tick: u32) {
    println!("\n{}", "=".repeat(70));
    println!(
        "Bot Status (Refresh #{}) - {}",
        tick,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("{}", "=".repeat(70));
}

/// Print the report for one tick
pub fn print_statuses(statuses: &[BotStatus]) {
    println!("\nActive bots: {}", statuses.len());
    if statuses.is_empty() {
        println!("No active bots found!");
        return;
    }

    for status in statuses {
        let bot = &status.bot;
        let profit = bot.profit.clone().unwrap_or_default();
        let show = |v: Option<Decimal>| v.map(|d| d.to_string()).unwrap_or_else(|| "0".into());

        println!("\nBot: {} (ID: {})", bot.name, bot.id);
        println!("Type: {}", bot.bot_type.as_deref().unwrap_or("Unknown"));
        println!("Pair: {}", bot.pairs_label());
        println!("Profit: ${} ({}%)", show(profit.usd), show(profit.percent));

        match &status.deals {
            Some(deals) => {
                println!("Recent deals: {}", deals.len());
                for (i, deal) in deals.iter().enumerate() {
                    println!(
                        "  Deal {}: ID {}, Status: {}, Profit: {}",
                        i + 1,
                        deal.id,
                        deal.status.as_deref().unwrap_or("Unknown"),
                        deal.final_profit
                            .map(|p| p.to_string())
                            .unwrap_or_else(|| "Unknown".into())
                    );
                }
            }
            None => println!("  Could not get deals"),
        }
    }
}
