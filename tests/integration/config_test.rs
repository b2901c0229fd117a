//! Configuration loading tests

use btc_trader::config::{Config, ConfigError, LogFormat};
use rust_decimal_macros::dec;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_example_loads_and_validates() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    config.validate().unwrap();

    assert_eq!(config.exchange.symbol, "BTCUSDT");
    assert_eq!(config.exchange.kline_interval, "6h");
    assert_eq!(config.model.window_len, 60);
    assert_eq!(config.risk.stop_loss_pct, dec!(0.05));
    assert_eq!(config.risk.take_profit_pct, dec!(0.005));
    assert_eq!(config.trading.initial_quote_balance, dec!(1000));
    assert_eq!(config.trading.poll_interval(), Duration::from_secs(3600));
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    assert_eq!(config.telemetry.metrics_port, None);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
            [risk]
            stop_loss_pct = 0.1

            [telemetry]
            log_format = "json"
            metrics_port = 9100
        "#,
    )
    .unwrap();

    let (config, defaulted) = Config::load_or_default(&path).unwrap();
    assert!(!defaulted);
    config.validate().unwrap();
    assert_eq!(config.risk.stop_loss_pct, dec!(0.1));
    assert_eq!(config.risk.take_profit_pct, dec!(0.005));
    assert_eq!(config.telemetry.log_format, LogFormat::Json);
    assert_eq!(config.telemetry.metrics_port, Some(9100));
}

#[test]
fn test_invalid_file_rejected_at_startup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[trading]\npoll_interval_secs = 0\n").unwrap();

    let (config, _) = Config::load_or_default(&path).unwrap();
    assert_eq!(
        config.validate(),
        Err(ConfigError::NonPositiveInterval {
            field: "poll_interval_secs"
        })
    );
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[risk\nstop_loss_pct = ").unwrap();

    assert!(Config::load_or_default(&path).is_err());
}

#[test]
fn test_effective_config_round_trips_through_toml() {
    let config = Config::default();
    let text = toml::to_string_pretty(&config).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();

    parsed.validate().unwrap();
    assert_eq!(parsed.risk.stop_loss_pct, config.risk.stop_loss_pct);
    assert_eq!(parsed.data.state_path(), config.data.state_path());
}
