//! Core domain types: trading pairs, accounts, bots and deals

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BotError;

/// Quote assets recognised when splitting a concatenated symbol such as
/// `BTCUSDT`. Longer suffixes come first so `FDUSD` wins over `USD`.
pub const KNOWN_QUOTES: &[&str] = &[
    "FDUSD", "USDT", "USDC", "BUSD", "TUSD", "DAI", "USD", "EUR", "TRY", "BTC", "ETH", "BNB",
];

/// Base/quote trading pair
///
/// Parses both the vendor form `BTC_USDT` and the exchange symbol `BTCUSDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pair {
    base: String,
    quote: String,
}

impl Pair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Pair {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, BotError> {
        let s = raw.trim().to_uppercase();
        let invalid = || BotError::InvalidPair(raw.to_string());

        let (base, quote) = match s.split_once('_') {
            Some((base, quote)) => (base.to_string(), quote.to_string()),
            None => split_symbol(&s).ok_or_else(invalid)?,
        };

        let valid = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid(&base) || !valid(&quote) {
            return Err(invalid());
        }

        Ok(Pair { base, quote })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Vendor representation, e.g. `BTC_USDT`
    pub fn vendor(&self) -> String {
        format!("{}_{}", self.base, self.quote)
    }

    /// Exchange ticker symbol, e.g. `BTCUSDT`
    pub fn symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

fn split_symbol(s: &str) -> Option<(String, String)> {
    if let Some(quote) = KNOWN_QUOTES
        .iter()
        .find(|q| s.len() > q.len() && s.ends_with(*q))
    {
        let base = &s[..s.len() - quote.len()];
        return Some((base.to_string(), quote.to_string()));
    }

    // Unknown quote asset: most tickers are three characters
    if s.len() > 3 && s.is_char_boundary(3) {
        Some((s[..3].to_string(), s[3..].to_string()))
    } else {
        None
    }
}

impl FromStr for Pair {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pair::parse(s)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}_{}", self.base, self.quote)
    }
}

/// The same pair with the delimiter toggled
///
/// `BTC_USDT` becomes `BTCUSDT` and `BTCUSDT` becomes `BTC_USDT`.
/// Returns `None` when the concatenated form cannot be split.
pub fn toggle_delimiter(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.contains('_') {
        Some(s.replace('_', ""))
    } else {
        Pair::parse(s).ok().map(|p| p.vendor())
    }
}

/// Up to `limit` available pairs sharing the base asset of `pair`
pub fn similar_pairs(pair: &str, available: &[String], limit: usize) -> Vec<String> {
    let Ok(pair) = Pair::parse(pair) else {
        return Vec::new();
    };
    let prefix = format!("{}_", pair.base());
    available
        .iter()
        .filter(|p| p.starts_with(&prefix))
        .take(limit)
        .cloned()
        .collect()
}

/// Exchange account connected to 3Commas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub market_code: String,
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
}

/// Profit summary attached to a bot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profit {
    #[serde(default)]
    pub usd: Option<Decimal>,
    #[serde(default)]
    pub percent: Option<Decimal>,
}

/// Bot as reported by the vendor
///
/// DCA bots carry a `pairs` array, grid bots a single `pair`; both land in
/// [`Bot::pairs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub bot_type: Option<String>,
    #[serde(default, alias = "pair", deserialize_with = "one_or_many")]
    pub pairs: Vec<String>,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub profit: Option<Profit>,
}

impl Bot {
    pub fn pairs_label(&self) -> String {
        if self.pairs.is_empty() {
            "Unknown".to_string()
        } else {
            self.pairs.join(", ")
        }
    }
}

/// Single execution record under a bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub final_profit: Option<Decimal>,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Missing,
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Missing => Vec::new(),
    })
}

/// Which bot type(s) a command applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotKind {
    Grid,
    Dca,
}

impl fmt::Display for BotKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BotKind::Grid => write!(f, "grid"),
            BotKind::Dca => write!(f, "DCA"),
        }
    }
}
