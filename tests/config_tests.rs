use candlewick::config::{parse_interval_ms, Config, FeedMode};
use candlewick::model::candle::VolumePolicy;

const MINIMAL: &str = r#"
[feed]
mode = "live"
symbols = ["btcusdt", "ethusdt"]
providers = []
coingecko_base_url = "https://api.coingecko.com"
binance_rest_base_url = "https://api.binance.com"
binance_ws_base_url = "wss://stream.binance.com:9443"
refresh_secs = 30

[chart]
candle_interval = "1m"
brick_size = 25.0
point_size = 10.0
history_len = 50
price_history_len = 200
sma_period = 20

[ui]
refresh_rate_ms = 250

[logging]
level = "debug"
"#;

#[test]
fn shipped_config_is_valid() {
    let config = Config::from_toml_str(include_str!("../config/default.toml")).unwrap();
    assert_eq!(config.feed.mode, FeedMode::Simulated);
    assert_eq!(config.feed.providers, vec!["coingecko", "binance"]);
    assert_eq!(config.feed.refresh_secs, 30);

    let settings = config.chart.settings().unwrap();
    assert_eq!(settings.candle_interval_ms, 10_000);
    assert_eq!(settings.history_len, 100);
    assert_eq!(settings.sma_period, 20);
    assert_eq!(settings.volume_policy, VolumePolicy::Accumulate);
    assert_eq!(config.chart.box_overrides().len(), 4);
}

#[test]
fn minimal_config_uses_defaults() {
    let config = Config::from_toml_str(MINIMAL).unwrap();
    assert_eq!(config.feed.mode, FeedMode::Live);
    assert_eq!(config.feed.http_timeout_secs, 10);
    assert_eq!(config.feed.tracked_symbols(), vec!["BTCUSDT", "ETHUSDT"]);
    assert_eq!(config.logging.file, "candlewick.log");
    assert!((config.simulator.momentum_carry - 0.4).abs() < f64::EPSILON);
    assert!((config.simulator.max_step - 0.003).abs() < f64::EPSILON);
    assert_eq!(config.chart.settings().unwrap().candle_interval_ms, 60_000);
    assert!(config.chart.box_overrides().is_empty());
}

#[test]
fn rejects_non_positive_brick_size() {
    let bad = MINIMAL.replace("brick_size = 25.0", "brick_size = 0.0");
    let err = Config::from_toml_str(&bad).unwrap_err();
    assert!(format!("{:#}", err).contains("brick size"));
}

#[test]
fn rejects_bad_interval() {
    let bad = MINIMAL.replace("candle_interval = \"1m\"", "candle_interval = \"1w\"");
    assert!(Config::from_toml_str(&bad).is_err());
}

#[test]
fn simulated_mode_needs_a_provider() {
    let bad = MINIMAL.replace("mode = \"live\"", "mode = \"simulated\"");
    let err = Config::from_toml_str(&bad).unwrap_err();
    assert!(format!("{:#}", err).contains("providers"));
}

#[test]
fn rejects_invalid_override() {
    let with_override = MINIMAL.replace(
        "sma_period = 20\n",
        "sma_period = 20\n\n[[chart.symbol_overrides]]\nsymbol = \"ETHUSDT\"\nbrick_size = 1.0\npoint_size = -1.0\n",
    );
    let err = Config::from_toml_str(&with_override).unwrap_err();
    assert!(format!("{:#}", err).contains("ETHUSDT"));
}

#[test]
fn interval_suffixes() {
    assert_eq!(parse_interval_ms("10s").unwrap(), 10_000);
    assert_eq!(parse_interval_ms("5m").unwrap(), 300_000);
    assert_eq!(parse_interval_ms("1d").unwrap(), 86_400_000);
    assert!(parse_interval_ms("10").is_err());
}
