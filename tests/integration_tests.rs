//! Integration tests for the bot launcher
//!
//! These tests drive the client, rate chain, launchers and monitor against a
//! recording stub transport.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use common::{client, StubFeed, StubTransport};
use threecommas_bots::bots::{resolve_account, select_account, DcaBot, GridBot};
use threecommas_bots::config::{DcaBotConfig, FallbackConfig, GridBotConfig};
use threecommas_bots::monitor::BotMonitor;
use threecommas_bots::rates::{
    deviation_percent, ExternalTickerSource, RateSource, MAX_RATE_DEVIATION_PERCENT,
};
use threecommas_bots::threecommas::Method;
use threecommas_bots::{
    Account, ApiError, BotError, Config, GridBounds, RateOrigin, RateResolver,
};

// =============================================================================
// Test Utilities
// =============================================================================

const CURRENCY_RATES: &str = "/ver1/accounts/currency_rates";
const ACCOUNTS: &str = "/ver1/accounts";

fn resolver(stub: &Arc<StubTransport>, feed: StubFeed) -> Arc<RateResolver> {
    Arc::new(RateResolver::standard(
        client(stub),
        Arc::new(feed),
        &FallbackConfig::default(),
    ))
}

fn grid_bot(stub: &Arc<StubTransport>, config: GridBotConfig) -> GridBot {
    GridBot::new(
        client(stub),
        resolver(stub, StubFeed::new()),
        config,
        FallbackConfig::default(),
    )
}

fn decimal_field(body: &serde_json::Value, field: &str) -> Decimal {
    body[field]
        .as_str()
        .unwrap_or_else(|| panic!("{} missing", field))
        .parse()
        .unwrap()
}

// =============================================================================
// Rate Resolution Tests
// =============================================================================

#[tokio::test]
async fn test_both_pair_forms_resolve_to_same_price() {
    let stub = Arc::new(StubTransport::new().on_param(
        CURRENCY_RATES,
        "pair",
        "BTC_USDT",
        json!({"last": "66000"}),
    ));
    let resolver = resolver(&stub, StubFeed::new());

    let direct = resolver.resolve("BTC_USDT").await;
    assert_eq!(direct.price, dec!(66000));
    assert_eq!(direct.origin, RateOrigin::CurrencyRates);

    let normalized = resolver.resolve("BTCUSDT").await;
    assert_eq!(normalized.price, dec!(66000));
    assert_eq!(normalized.origin, RateOrigin::NormalizedPair);
    assert!(!normalized.is_low_confidence());

    // primary, market info, then the toggled pair
    let paths: Vec<String> = stub.calls().iter().skip(1).map(|r| r.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            CURRENCY_RATES.to_string(),
            "/ver1/accounts/market_info".to_string(),
            CURRENCY_RATES.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_market_info_used_when_primary_fails() {
    let stub = Arc::new(
        StubTransport::new()
            .fail(CURRENCY_RATES, 500, "")
            .on("/ver1/accounts/market_info", json!({"last": 3510.25})),
    );
    let quote = resolver(&stub, StubFeed::new()).resolve("ETH_USDT").await;
    assert_eq!(quote.price, dec!(3510.25));
    assert_eq!(quote.origin, RateOrigin::MarketInfo);
}

#[tokio::test]
async fn test_all_sources_fail_falls_back_to_configured_price() {
    let stub = Arc::new(StubTransport::new());
    let resolver = resolver(&stub, StubFeed::new());

    let quote = resolver.resolve("BTC_USDT").await;
    assert_eq!(quote.price, dec!(66000));
    assert_eq!(quote.origin, RateOrigin::StaticTable);
    assert!(quote.is_low_confidence());

    let quote = resolver.resolve("DOGE_USDT").await;
    assert_eq!(quote.price, dec!(100));
    assert_eq!(quote.origin, RateOrigin::Default);
}

#[tokio::test]
async fn test_vendor_rate_compared_with_ticker() {
    let stub = Arc::new(StubTransport::new().on_param(
        CURRENCY_RATES,
        "pair",
        "BTC_ETH",
        json!({"last": "17.5"}),
    ));
    let feed: Arc<StubFeed> = Arc::new(
        StubFeed::new()
            .with_price("BTCUSDT", dec!(66000))
            .with_price("ETHUSDT", dec!(3500)),
    );
    let external = ExternalTickerSource::new(feed, "USDT");

    let quote = resolver(&stub, StubFeed::new()).resolve("BTC_ETH").await;
    assert_eq!(quote.origin, RateOrigin::CurrencyRates);

    let reference = external.fetch("BTC_ETH").await.unwrap();
    let diff = deviation_percent(quote.price, reference).unwrap();
    assert_eq!(diff, dec!(7.76));
    assert!(diff >= MAX_RATE_DEVIATION_PERCENT);
}

#[tokio::test]
async fn test_external_ticker_cross_rate() {
    let stub = Arc::new(StubTransport::new());
    let feed = StubFeed::new()
        .with_price("BTCUSDT", dec!(66000))
        .with_price("ETHUSDT", dec!(3500));

    let quote = resolver(&stub, feed).resolve("BTC_ETH").await;
    assert_eq!(quote.price, dec!(18.85714286));
    assert_eq!(quote.origin, RateOrigin::ExternalTicker);
    assert!(quote.is_low_confidence());
}

#[tokio::test]
async fn test_zero_rate_moves_to_next_source() {
    let stub = Arc::new(
        StubTransport::new()
            .on(CURRENCY_RATES, json!({"last": "0"}))
            .on("/ver1/accounts/market_info", json!({"last": "1.0842"})),
    );
    let quote = resolver(&stub, StubFeed::new()).resolve("EUR_USDT").await;
    assert_eq!(quote.price, dec!(1.0842));
    assert_eq!(quote.origin, RateOrigin::MarketInfo);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[tokio::test]
async fn test_missing_grid_field_makes_no_calls() {
    let stub = Arc::new(StubTransport::new());
    let mut config = GridBotConfig::default()
        .with_bounds(GridBounds::new(dec!(95), dec!(105)).unwrap());
    config.quantity_per_grid = None;

    let err = client(&stub).create_grid_bot(1, &config).await.unwrap_err();
    assert!(matches!(
        err,
        BotError::MissingField {
            bot: "grid",
            field: "quantity_per_grid"
        }
    ));
    assert_eq!(err.exit_code(), 1);

    let err = grid_bot(&stub, config).create().await.unwrap_err();
    assert!(matches!(err, BotError::MissingField { .. }));
    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn test_missing_dca_field_makes_no_calls() {
    let stub = Arc::new(StubTransport::new());
    let mut config = DcaBotConfig::default();
    config.take_profit = None;

    let err = client(&stub).create_dca_bot(1, &config).await.unwrap_err();
    assert!(matches!(
        err,
        BotError::MissingField {
            bot: "DCA",
            field: "take_profit"
        }
    ));

    let err = DcaBot::new(client(&stub), config).create().await.unwrap_err();
    assert!(matches!(err, BotError::MissingField { .. }));
    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn test_inverted_configured_bounds_rejected() {
    let stub = Arc::new(StubTransport::new());
    let mut config = GridBotConfig::default();
    config.lower_price = Some(dec!(110));
    config.upper_price = Some(dec!(100));

    let err = grid_bot(&stub, config).calculate_bounds().await.unwrap_err();
    assert!(matches!(err, BotError::InvalidBounds { .. }));
    assert!(stub.calls().is_empty());
}

// =============================================================================
// Account Resolution Tests
// =============================================================================

#[tokio::test]
async fn test_resolve_account_matches_exchange_case_insensitively() {
    let stub = Arc::new(StubTransport::new().on(
        ACCOUNTS,
        json!([
            {"id": 1, "name": "Futures", "market_code": "kucoin"},
            {"id": 2, "name": "Main", "market_code": "Binance"}
        ]),
    ));
    let client = client(&stub);

    assert_eq!(resolve_account(&client, None, "binance").await.unwrap(), 2);
    // absent exchange: first account wins
    assert_eq!(resolve_account(&client, None, "bybit").await.unwrap(), 1);
}

#[tokio::test]
async fn test_resolve_account_without_accounts() {
    let stub = Arc::new(StubTransport::new().on(ACCOUNTS, json!([])));
    let err = resolve_account(&client(&stub), None, "binance")
        .await
        .unwrap_err();
    assert!(matches!(err, BotError::NoAccount { ref exchange } if exchange == "binance"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_select_account_from_fetched_list() {
    let accounts: Vec<Account> = serde_json::from_value(json!([
        {"id": 1, "name": "Futures", "market_code": "kucoin"},
        {"id": 2, "name": "Main", "market_code": "binance"}
    ]))
    .unwrap();

    assert_eq!(select_account(&accounts, "BINANCE").unwrap().id, 2);
    assert_eq!(select_account(&accounts, "bybit").unwrap().market_code, "kucoin");
    assert!(matches!(
        select_account(&[], "binance"),
        Err(BotError::NoAccount { .. })
    ));
}

#[tokio::test]
async fn test_explicit_account_skips_lookup() {
    let stub = Arc::new(StubTransport::new());
    let id = resolve_account(&client(&stub), Some(99), "binance")
        .await
        .unwrap();
    assert_eq!(id, 99);
    assert!(stub.calls().is_empty());
}

// =============================================================================
// Grid Bot Tests
// =============================================================================

#[tokio::test]
async fn test_grid_bot_end_to_end() {
    let stub = Arc::new(
        StubTransport::new()
            .on(ACCOUNTS, json!([{"id": 1, "name": "Main", "market_code": "binance"}]))
            .on_param(CURRENCY_RATES, "pair", "BTC_USDT", json!({"last": "66000"}))
            .on(
                "/ver1/grid_bots/manual",
                json!({"id": 555, "name": "Auto Grid Bot", "pair": "BTC_USDT", "is_enabled": false}),
            )
            .on(
                "/ver1/grid_bots/555/enable",
                json!({"id": 555, "pair": "BTC_USDT", "is_enabled": true}),
            ),
    );
    let bot = grid_bot(&stub, GridBotConfig::default());

    let created = bot.create().await.unwrap();
    assert_eq!(created.id, 555);
    assert_eq!(created.pairs, vec!["BTC_USDT".to_string()]);

    let create_calls = stub.calls_to("/ver1/grid_bots/manual");
    assert_eq!(create_calls.len(), 1);
    assert_eq!(create_calls[0].method, Method::Post);
    let body = create_calls[0].body.clone().unwrap();
    assert_eq!(body["account_id"], 1);
    assert_eq!(body["pair"], "BTC_USDT");
    assert_eq!(body["grids_count"], 20);
    assert_eq!(decimal_field(&body, "lower_price"), dec!(62700));
    assert_eq!(decimal_field(&body, "upper_price"), dec!(69300));

    let started = bot.start(555).await.unwrap();
    assert!(started.is_enabled);
    assert_eq!(stub.calls_to("/ver1/grid_bots/555/enable").len(), 1);
}

#[tokio::test]
async fn test_configured_bounds_skip_price_lookup() {
    let stub = Arc::new(StubTransport::new());
    let config = GridBotConfig::default()
        .with_bounds(GridBounds::new(dec!(60000), dec!(70000)).unwrap());

    let bounds = grid_bot(&stub, config).calculate_bounds().await.unwrap();
    assert_eq!(bounds.lower, dec!(60000));
    assert_eq!(bounds.upper, dec!(70000));
    assert!(stub.calls_to(CURRENCY_RATES).is_empty());
}

#[tokio::test]
async fn test_unresolved_price_uses_fallback_ranges() {
    let stub = Arc::new(StubTransport::new());
    let mut fallback = FallbackConfig::default();
    fallback
        .grid_bounds
        .insert("DOGE_USDT".to_string(), GridBounds::new(dec!(0.1), dec!(0.2)).unwrap());

    let mut config = GridBotConfig::default();
    config.pair = "DOGEUSDT".to_string();
    let bot = GridBot::new(
        client(&stub),
        resolver(&stub, StubFeed::new()),
        config.clone(),
        fallback,
    );
    let bounds = bot.calculate_bounds().await.unwrap();
    assert_eq!(bounds.lower, dec!(0.1));
    assert_eq!(bounds.upper, dec!(0.2));

    // pair missing from the table gets the generic range
    config.pair = "PEPE_USDT".to_string();
    let bounds = grid_bot(&stub, config).calculate_bounds().await.unwrap();
    assert_eq!(bounds, GridBounds::new(dec!(90), dec!(100)).unwrap());
}

#[tokio::test]
async fn test_price_too_small_for_grid_uses_fallback_range() {
    let stub = Arc::new(StubTransport::new().on_param(
        CURRENCY_RATES,
        "pair",
        "SHIB_BTC",
        json!({"last": "0.000000003"}),
    ));
    let mut config = GridBotConfig::default();
    config.pair = "SHIB_BTC".to_string();

    let bounds = grid_bot(&stub, config).calculate_bounds().await.unwrap();
    assert_eq!(bounds, GridBounds::new(dec!(90), dec!(100)).unwrap());
    assert_eq!(stub.calls_to(CURRENCY_RATES).len(), 1);
}

#[tokio::test]
async fn test_grid_creation_failure_runs_diagnostic() {
    let stub = Arc::new(
        StubTransport::new()
            .on(ACCOUNTS, json!([{"id": 1, "name": "Main", "market_code": "binance"}]))
            .on(CURRENCY_RATES, json!({"last": "66000"}))
            .fail(
                "/ver1/grid_bots/manual",
                422,
                r#"{"error":"record_invalid","error_description":"Invalid parameters","error_attributes":{"quantity_per_grid":["is too small"]}}"#,
            )
            .on(
                "/ver1/grid_bots/manual_creation_params",
                json!({"min_quantity_per_grid": "0.0001"}),
            ),
    );

    let err = grid_bot(&stub, GridBotConfig::default())
        .create()
        .await
        .unwrap_err();
    match &err {
        BotError::Api(ApiError::Vendor { status, error, .. }) => {
            assert_eq!(*status, 422);
            assert_eq!(error, "record_invalid");
        }
        other => panic!("expected vendor error, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 2);

    let diagnostic = stub.calls_to("/ver1/grid_bots/manual_creation_params");
    assert_eq!(diagnostic.len(), 1);
    assert_eq!(diagnostic[0].query_value("account_id"), Some("1"));
    assert_eq!(diagnostic[0].query_value("pair"), Some("BTC_USDT"));
}

#[tokio::test]
async fn test_stop_grid_bot() {
    let stub = Arc::new(StubTransport::new().on(
        "/ver1/grid_bots/7/disable",
        json!({"id": 7, "pair": "ETH_USDT", "is_enabled": false}),
    ));
    let stopped = grid_bot(&stub, GridBotConfig::default())
        .stop(7)
        .await
        .unwrap();
    assert!(!stopped.is_enabled);
    assert_eq!(stub.calls()[0].method, Method::Post);
}

// =============================================================================
// DCA Bot Tests
// =============================================================================

#[tokio::test]
async fn test_dca_bot_create_and_start() {
    let stub = Arc::new(
        StubTransport::new()
            .on(ACCOUNTS, json!([{"id": 3, "name": "Spot", "market_code": "binance"}]))
            .on(
                "/ver1/bots/create_bot",
                json!({"id": 77, "name": "Auto DCA Bot", "pairs": ["BTC_USDT"], "is_enabled": true}),
            )
            .on("/ver1/bots/77/enable", json!({"id": 77, "is_enabled": true})),
    );
    let bot = DcaBot::new(client(&stub), DcaBotConfig::default());

    let created = bot.create().await.unwrap();
    assert_eq!(created.id, 77);

    let body = stub.calls_to("/ver1/bots/create_bot")[0].body.clone().unwrap();
    assert_eq!(body["account_id"], 3);
    assert_eq!(body["pairs"], json!(["BTC_USDT"]));
    assert_eq!(body["active"], true);
    assert_eq!(body["strategy"], "long");
    assert_eq!(decimal_field(&body, "take_profit"), dec!(1.5));

    bot.start(77).await.unwrap();
    assert_eq!(stub.calls_to("/ver1/bots/77/enable").len(), 1);
}

#[tokio::test]
async fn test_dca_creation_failure_checks_pairs() {
    let stub = Arc::new(
        StubTransport::new()
            .on(ACCOUNTS, json!([{"id": 3, "name": "Spot", "market_code": "kucoin"}]))
            .fail("/ver1/bots/create_bot", 422, r#"{"error":"record_invalid"}"#)
            .on_param(
                "/ver1/accounts/market_pairs",
                "market_code",
                "kucoin",
                json!(["BTC_USDC", "ETH_USDT"]),
            ),
    );
    // configured exchange is absent, so the kucoin account is used
    let bot = DcaBot::new(client(&stub), DcaBotConfig::default()).with_exchange("binance");

    let err = bot.create().await.unwrap_err();
    assert!(matches!(err, BotError::Api(ApiError::Vendor { status: 422, .. })));
    let pair_calls = stub.calls_to("/ver1/accounts/market_pairs");
    assert_eq!(pair_calls.len(), 1);
    assert_eq!(pair_calls[0].query_value("market_code"), Some("kucoin"));
}

// =============================================================================
// Monitor Tests
// =============================================================================

#[tokio::test]
async fn test_monitor_collects_recent_deals() {
    let deals: Vec<_> = (1..=5)
        .map(|i| json!({"id": i, "status": "completed", "final_profit": "0.5"}))
        .collect();
    let stub = Arc::new(
        StubTransport::new()
            .on(
                "/ver1/bots",
                json!([
                    {"id": 1, "name": "A", "type": "Bot::SingleBot", "pairs": ["BTC_USDT"],
                     "is_enabled": true, "profit": {"usd": "1.5", "percent": "0.3"}},
                    {"id": 2, "name": "B", "pairs": ["ETH_USDT"], "is_enabled": true}
                ]),
            )
            .on_param("/ver1/deals", "bot_id", "1", json!(deals)),
    );

    let statuses = BotMonitor::new(client(&stub), 3).refresh().await.unwrap();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].deals.as_ref().unwrap().len(), 3);
    assert_eq!(statuses[0].bot.profit.as_ref().unwrap().usd, Some(dec!(1.5)));
    assert!(statuses[1].deals.is_none());

    let bots_call = &stub.calls_to("/ver1/bots")[0];
    assert_eq!(bots_call.query_value("scope"), Some("enabled"));
    assert_eq!(bots_call.query_value("limit"), Some("100"));
}

#[tokio::test]
async fn test_monitor_stops_after_iterations_when_fetches_fail() {
    let stub = Arc::new(StubTransport::new().fail("/ver1/bots", 503, "Service Unavailable"));
    let monitor = BotMonitor::new(client(&stub), 3);

    let ticks = monitor.poll(Duration::from_millis(5), Some(3)).await;
    assert_eq!(ticks, 3);
    assert_eq!(stub.calls_to("/ver1/bots").len(), 3);

    assert_eq!(monitor.poll(Duration::from_millis(5), Some(0)).await, 0);
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_config_file_round_trip_through_disk() {
    let path = std::env::temp_dir().join(format!("threecommas-bots-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{
            "default_exchange": "kucoin",
            "grid_bot": {"name": "Grid", "pair": "ETH_USDT", "quantity_per_grid": "0.01",
                         "grids_count": 10, "margin_percent": "2.5"},
            "monitor": {"interval_secs": 15}
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.default_exchange, "kucoin");
    assert_eq!(config.grid_bot.margin_percent, dec!(2.5));
    assert_eq!(config.monitor.interval_secs, 15);
    assert_eq!(config.monitor.deals_per_bot, 3);
    assert!(config.validate().is_ok());

    let overridden = config.with_pair_override("solusdt").unwrap();
    assert_eq!(overridden.grid_bot.pair, "SOL_USDT");
    assert_eq!(overridden.dca_bot.pair, "SOL_USDT");
    assert_eq!(overridden.configured_pairs(), vec!["SOL_USDT".to_string()]);
}

#[test]
fn test_missing_config_file_is_an_error() {
    assert!(Config::from_file("/nonexistent/threecommas.json").is_err());
}
