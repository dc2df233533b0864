//! Bot launchers
//!
//! [`GridBot`] and [`DcaBot`] each own an immutable configuration, resolve
//! the exchange account to trade on, and drive the create/enable/disable
//! calls of their bot type.

mod dca_bot;
mod grid_bot;

pub use dca_bot::DcaBot;
pub use grid_bot::GridBot;

use tracing::{error, info, warn};

use crate::error::{ApiError, BotError};
use crate::threecommas::ThreeCommasClient;
use crate::types::{Account, BotKind};

/// Account to create bots on
///
/// An explicit id wins. Otherwise the first account whose market code matches
/// `exchange` (case-insensitive), then the first account of any exchange.
pub async fn resolve_account(
    client: &ThreeCommasClient,
    explicit: Option<u64>,
    exchange: &str,
) -> Result<u64, BotError> {
    if let Some(id) = explicit {
        return Ok(id);
    }

    let accounts = client.get_accounts().await?;
    select_account(&accounts, exchange).map(|account| account.id)
}

/// Pick the account for `exchange` from an already fetched list
pub fn select_account<'a>(
    accounts: &'a [Account],
    exchange: &str,
) -> Result<&'a Account, BotError> {
    if let Some(account) = accounts
        .iter()
        .find(|a| a.market_code.eq_ignore_ascii_case(exchange))
    {
        info!(
            "Using {} account {} (ID: {})",
            account.market_code, account.name, account.id
        );
        return Ok(account);
    }

    match accounts.first() {
        Some(account) => {
            warn!(
                "Exchange {} not found, using {} account {} (ID: {}) instead",
                exchange, account.market_code, account.name, account.id
            );
            Ok(account)
        }
        None => Err(BotError::NoAccount {
            exchange: exchange.to_string(),
        }),
    }
}

/// Log a rejected creation and print what usually causes it
pub(crate) fn report_creation_failure(kind: BotKind, err: &ApiError) {
    error!("Error creating {} bot: {}", kind, err);
    if let ApiError::Vendor {
        attributes: Some(attrs),
        ..
    } = err
    {
        error!("Rejected parameters: {}", attrs);
    }

    println!("Troubleshooting suggestions:");
    println!("1. Check if your API key has trading permissions");
    println!("2. Verify you have sufficient funds in your account");
    println!("3. Ensure your trading pair is correctly formatted");
    println!("4. Try adjusting {} parameters to match exchange requirements", kind);
}
