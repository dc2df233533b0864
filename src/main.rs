//! 3Commas bot launcher - main entry point
//!
//! Without a subcommand the configured grid and/or DCA bots are launched.
//! Subcommands:
//! - monitor: Periodic status report of active bots
//! - check: Verify API access, exchanges, pairs and prices
//! - stop: Disable a bot by id

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use threecommas_bots::error::exit_code_for;
use threecommas_bots::BotKind;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "threecommas-bots")]
#[command(about = "Launch and monitor 3Commas grid and DCA bots", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Type of bot to launch
    #[arg(long, value_enum, default_value = "all")]
    bot_type: BotTypeArg,

    /// Trading pair for both bots (e.g. BTC_USDT)
    #[arg(long)]
    pair: Option<String>,

    /// 3Commas account ID (skips exchange lookup)
    #[arg(long)]
    account_id: Option<u64>,

    /// Print the prepared configuration without creating any bot
    #[arg(long)]
    test_mode: bool,

    /// Path to JSON configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Monitor active bots and their recent deals
    Monitor {
        /// Seconds between refreshes (default from config, 60)
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many refreshes
        #[arg(long)]
        iterations: Option<u32>,
    },

    /// Check API connectivity, exchanges, pairs and prices
    Check,

    /// Disable a running bot
    Stop {
        /// Bot ID
        bot_id: u64,

        /// Type of the bot
        #[arg(long, value_enum)]
        bot_type: StopBotType,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BotTypeArg {
    Grid,
    Dca,
    All,
}

impl BotTypeArg {
    fn kinds(self) -> Vec<BotKind> {
        match self {
            BotTypeArg::Grid => vec![BotKind::Grid],
            BotTypeArg::Dca => vec![BotKind::Dca],
            BotTypeArg::All => vec![BotKind::Grid, BotKind::Dca],
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StopBotType {
    Grid,
    Dca,
}

impl From<StopBotType> for BotKind {
    fn from(value: StopBotType) -> Self {
        match value {
            StopBotType::Grid => BotKind::Grid,
            StopBotType::Dca => BotKind::Dca,
        }
    }
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Set log level - filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    // File layer - same format but without ANSI colors
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let command_name = match &cli.command {
        None => "launch",
        Some(Commands::Monitor { .. }) => "monitor",
        Some(Commands::Check) => "check",
        Some(Commands::Stop { .. }) => "stop",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        None => commands::launch::run(
            cli.config,
            cli.bot_type.kinds(),
            cli.pair,
            cli.account_id,
            cli.test_mode,
        ),

        Some(Commands::Monitor {
            interval,
            iterations,
        }) => commands::monitor::run(cli.config, interval, iterations),

        Some(Commands::Check) => commands::check::run(cli.config),

        Some(Commands::Stop { bot_id, bot_type }) => {
            commands::stop::run(cli.config, bot_id, bot_type.into())
        }
    }
}

fn main() -> ExitCode {
    // Credentials and RUST_LOG may come from .env
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}
