//! Request transport for the 3Commas API
//!
//! [`Transport`] is the seam between the typed client and the network.
//! [`HttpTransport`] signs requests, retries transient server failures with
//! exponential backoff, and turns vendor error payloads into [`ApiError`].

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::auth::{signing_payload, Credentials};
use crate::config::ApiConfig;
use crate::error::{ApiError, BotError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single call against the API, relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the API root, e.g. `/ver1/accounts`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        ApiRequest {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        ApiRequest {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body,
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Value of a query parameter, if present
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Sends [`ApiRequest`]s and returns the decoded JSON response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError>;
}

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Request timeout duration
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: crate::config::DEFAULT_API_URL.to_string(),
            max_retries: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<&ApiConfig> for TransportConfig {
    fn from(api: &ApiConfig) -> Self {
        TransportConfig::default()
            .with_base_url(api.base_url.clone())
            .with_max_retries(api.max_retries)
            .with_timeout(api.timeout())
    }
}

/// Signed HTTPS transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    credentials: Credentials,
    http_client: Client,
    base_url: String,
    max_retries: u32,
}

impl HttpTransport {
    pub fn new(credentials: Credentials, config: TransportConfig) -> Result<Self, BotError> {
        Url::parse(&config.base_url)
            .map_err(|e| BotError::Config(format!("invalid API URL '{}': {}", config.base_url, e)))?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| BotError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url, request.path);
        let parsed = if request.query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, &request.query)
        };
        parsed.map_err(|e| ApiError::Transport(format!("invalid request URL {}: {}", raw, e)))
    }

    async fn send_once(&self, request: &ApiRequest, url: &Url) -> Result<Value, Attempt> {
        let body = match &request.body {
            Some(b) => Some(
                serde_json::to_string(b)
                    .map_err(|e| Attempt::Fatal(ApiError::Decode(e.to_string())))?,
            ),
            None => None,
        };
        let signature = self
            .credentials
            .sign(&signing_payload(url.path(), url.query(), body.as_deref()));

        let builder = match request.method {
            Method::Get => self.http_client.get(url.clone()),
            Method::Post => self.http_client.post(url.clone()),
        };
        let mut builder = builder
            .header("APIKEY", self.credentials.api_key())
            .header("Signature", signature);
        if let Some(b) = body {
            builder = builder.header("Content-Type", "application/json").body(b);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Attempt::Retry(ApiError::from(e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Attempt::Retry(ApiError::from(e)))?;

        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), &text);
            return Err(if ApiError::is_retryable_status(status.as_u16()) {
                Attempt::Retry(err)
            } else {
                Attempt::Fatal(err)
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| Attempt::Fatal(ApiError::Decode(e.to_string())))
    }
}

enum Attempt {
    Retry(ApiError),
    Fatal(ApiError),
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = self.url_for(&request)?;
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s...
                let delay = Duration::from_secs(2u64.pow(attempt - 1));
                debug!("Retrying {} after {}ms", request.path, delay.as_millis());
                sleep(delay).await;
            }

            match self.send_once(&request, &url).await {
                Ok(value) => return Ok(value),
                Err(Attempt::Fatal(e)) => return Err(e),
                Err(Attempt::Retry(e)) => {
                    warn!(
                        "Request to {} failed (attempt {}/{}): {}",
                        request.path,
                        attempt + 1,
                        self.max_retries + 1,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::Transport("request failed after retries".into())))
    }
}
