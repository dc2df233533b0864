//! 3Commas API integration
//!
//! Signed REST client for accounts, rates, grid bots, DCA bots and deals.

pub mod auth;
pub mod client;
pub mod transport;
pub mod types;

pub use auth::Credentials;
pub use client::ThreeCommasClient;
pub use transport::{ApiRequest, HttpTransport, Method, Transport, TransportConfig};
pub use types::CurrencyRate;
