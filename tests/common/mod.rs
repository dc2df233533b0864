//! Test doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use threecommas_bots::rates::PriceFeed;
use threecommas_bots::threecommas::{ApiRequest, Transport};
use threecommas_bots::{ApiError, ThreeCommasClient};

struct Route {
    path: String,
    param: Option<(String, String)>,
    response: Result<Value, ApiError>,
}

impl Route {
    fn matches(&self, request: &ApiRequest) -> bool {
        if request.path != self.path {
            return false;
        }
        match &self.param {
            Some((key, value)) => request.query_value(key) == Some(value.as_str()),
            None => true,
        }
    }
}

/// Canned responses by path (optionally by one query parameter)
///
/// Every request is recorded. Unrouted requests get a vendor 404.
#[derive(Default)]
pub struct StubTransport {
    routes: Vec<Route>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, path: &str, response: Value) -> Self {
        self.routes.push(Route {
            path: path.to_string(),
            param: None,
            response: Ok(response),
        });
        self
    }

    pub fn on_param(mut self, path: &str, key: &str, value: &str, response: Value) -> Self {
        self.routes.push(Route {
            path: path.to_string(),
            param: Some((key.to_string(), value.to_string())),
            response: Ok(response),
        });
        self
    }

    pub fn fail(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes.push(Route {
            path: path.to_string(),
            param: None,
            response: Err(ApiError::from_response(status, body)),
        });
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<ApiRequest> {
        self.calls()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(request.clone());

        // parameter-specific routes win over path-only ones
        let route = self
            .routes
            .iter()
            .filter(|r| r.param.is_some())
            .chain(self.routes.iter().filter(|r| r.param.is_none()))
            .find(|r| r.matches(&request));

        match route {
            Some(route) => route.response.clone(),
            None => Err(ApiError::from_response(
                404,
                r#"{"error":"not_found","error_description":"no stub route"}"#,
            )),
        }
    }
}

pub fn client(stub: &Arc<StubTransport>) -> ThreeCommasClient {
    ThreeCommasClient::new(stub.clone())
}

/// Price feed backed by a fixed symbol table
#[derive(Default)]
pub struct StubFeed {
    prices: HashMap<String, Decimal>,
    calls: Mutex<Vec<String>>,
}

impl StubFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceFeed for StubFeed {
    async fn price(&self, symbol: &str) -> Result<Decimal, ApiError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| ApiError::from_response(400, r#"{"code":-1121,"msg":"Invalid symbol."}"#))
    }
}
