//! Authentication utilities for the 3Commas API
//!
//! Every request is signed with HMAC-SHA256 over the request URI (path plus
//! query string) followed by the JSON body, keyed by the API secret. The hex
//! digest goes into the `Signature` header next to the `APIKEY` header.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Generate the hex HMAC-SHA256 signature for a request
///
/// # Example
///
/// ```
/// use threecommas_bots::threecommas::auth::sign_request;
///
/// let signature = sign_request("/public/api/ver1/accounts", "your-api-secret");
/// assert_eq!(signature.len(), 64);
/// ```
pub fn sign_request(payload: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Text that gets signed: URI path, `?query` when present, then the body
pub fn signing_payload(path: &str, query: Option<&str>, body: Option<&str>) -> String {
    let mut payload = path.to_string();
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        payload.push('?');
        payload.push_str(q);
    }
    if let Some(b) = body {
        payload.push_str(b);
    }
    payload
}

/// API credentials container
///
/// `Debug` never prints the key or the secret.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Sign a request payload
    pub fn sign(&self, payload: &str) -> String {
        sign_request(payload, &self.api_secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
