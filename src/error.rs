//! Error types
//!
//! Two layers: [`ApiError`] for anything the vendor or the network reported,
//! and [`BotError`] for local validation plus wrapped API failures. Commands
//! use `anyhow` on top and map the root cause to a process exit code.

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

/// Exit code for configuration and validation failures
pub const EXIT_CONFIG: u8 = 1;

/// Exit code for vendor API and transport failures
pub const EXIT_API: u8 = 2;

/// Errors reported by the 3Commas API or the HTTP layer underneath it
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error(
        "3Commas API error (HTTP {status}): {error}{}",
        .description.as_deref().map(|d| format!(" - {}", d)).unwrap_or_default()
    )]
    Vendor {
        status: u16,
        error: String,
        description: Option<String>,
        attributes: Option<Value>,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a vendor error from a non-success HTTP response body
    ///
    /// 3Commas answers with `{"error": ..., "error_description": ...,
    /// "error_attributes": {...}}`; older proxies use `{"msg": ...}`.
    /// Anything else is kept verbatim as the error text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        let error = field("error")
            .or_else(|| field("msg"))
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    "empty response".to_string()
                } else {
                    body.trim().to_string()
                }
            });

        ApiError::Vendor {
            status,
            error,
            description: field("error_description"),
            attributes: parsed.as_ref().and_then(|v| v.get("error_attributes")).cloned(),
        }
    }

    /// Whether the transport should try the request again
    pub fn is_retryable_status(status: u16) -> bool {
        matches!(status, 500 | 502 | 503 | 504)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Errors raised while preparing, launching or stopping bots
#[derive(Debug, Error)]
pub enum BotError {
    #[error("missing required parameter for {bot} bot: {field}")]
    MissingField {
        bot: &'static str,
        field: &'static str,
    },

    #[error("invalid trading pair '{0}'")]
    InvalidPair(String),

    #[error("invalid grid bounds: lower ({lower}) must be positive and not above upper ({upper})")]
    InvalidBounds { lower: Decimal, upper: Decimal },

    #[error("invalid grid margin {0}%: must be at least 0 and below 100")]
    InvalidMargin(Decimal),

    #[error("no exchange account found for '{exchange}'; connect an exchange in 3Commas first")]
    NoAccount { exchange: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl BotError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            BotError::Api(_) => EXIT_API,
            _ => EXIT_CONFIG,
        }
    }
}

/// Map an `anyhow` error chain onto the CLI exit code contract
///
/// The first typed error found in the chain decides. Untyped failures
/// (unreadable config file, bad JSON) count as configuration errors.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| {
            if let Some(bot) = cause.downcast_ref::<BotError>() {
                Some(bot.exit_code())
            } else if cause.downcast_ref::<ApiError>().is_some() {
                Some(EXIT_API)
            } else {
                None
            }
        })
        .unwrap_or(EXIT_CONFIG)
}
