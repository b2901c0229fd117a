//! Configuration types for btc-trader

use crate::feed::{is_valid_interval, BinanceConfig, MAX_KLINES_PER_REQUEST};
use crate::risk::RiskPolicy;
use crate::signal::{MomentumModel, ThresholdPredictor};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub model: ModelConfig,
    pub risk: RiskConfig,
    pub trading: TradingConfig,
    pub data: DataConfig,
    pub telemetry: TelemetryConfig,
}

/// Exchange / market data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub symbol: String,
    /// Kline interval used for the signal window and history capture
    pub kline_interval: String,
    pub timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: crate::feed::BINANCE_API_URL.to_string(),
            symbol: "BTCUSDT".to_string(),
            kline_interval: "6h".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ExchangeConfig {
    /// Settings for the Binance REST client
    pub fn client_config(&self) -> BinanceConfig {
        BinanceConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Signal model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of candles in the market window
    pub window_len: usize,
    /// Scores above this are BUY
    pub buy_threshold: f64,
    /// Scores below this are SELL
    pub sell_threshold: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            window_len: crate::signal::DEFAULT_WINDOW_LEN,
            buy_threshold: 0.5,
            sell_threshold: -0.5,
        }
    }
}

impl ModelConfig {
    /// Build the signal source these thresholds describe
    pub fn predictor(&self) -> ThresholdPredictor<MomentumModel> {
        ThresholdPredictor::new(MomentumModel::new(), self.buy_threshold, self.sell_threshold)
    }
}

/// Risk policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Fraction below entry price that forces liquidation
    pub stop_loss_pct: Decimal,
    /// Fraction above entry price that triggers take-profit on HOLD
    pub take_profit_pct: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: Decimal::new(5, 2),   // 0.05 = 5%
            take_profit_pct: Decimal::new(5, 3), // 0.005 = 0.5%
        }
    }
}

impl RiskConfig {
    /// Build the risk policy these thresholds describe
    pub fn policy(&self) -> RiskPolicy {
        RiskPolicy::new(self.stop_loss_pct, self.take_profit_pct)
    }
}

/// Polling loop and starting balances
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    /// Quote balance used when no state file exists
    pub initial_quote_balance: Decimal,
    /// Base balance used when no state file exists
    pub initial_base_balance: Decimal,
    /// Time between decision cycles
    pub poll_interval_secs: u64,
    /// Progress logging granularity while waiting
    pub progress_interval_secs: u64,
    /// Wait after a failed cycle
    pub retry_backoff_secs: u64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            initial_quote_balance: Decimal::new(1000, 0),
            initial_base_balance: Decimal::ZERO,
            poll_interval_secs: 3600,
            progress_interval_secs: 300,
            retry_backoff_secs: 60,
        }
    }
}

impl TradingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub state_file: String,
    pub journal_file: String,
    /// Days of history downloaded by `capture`
    pub history_days: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data"),
            state_file: "state.json".to_string(),
            journal_file: "trade_history.csv".to_string(),
            history_days: 7 * 365,
        }
    }
}

impl DataConfig {
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(&self.state_file)
    }

    pub fn journal_path(&self) -> PathBuf {
        self.dir.join(&self.journal_file)
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Prometheus exporter port; disabled when absent
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON format for log aggregation
    Json,
}

/// Invalid configuration, rejected at startup
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("risk.stop_loss_pct must be in (0, 1), got {0}")]
    StopLoss(Decimal),
    #[error("risk.take_profit_pct must be positive, got {0}")]
    TakeProfit(Decimal),
    #[error("trading.{field} must be positive")]
    NonPositiveInterval { field: &'static str },
    #[error("trading.progress_interval_secs ({progress}) exceeds poll_interval_secs ({poll})")]
    ProgressExceedsPoll { progress: u64, poll: u64 },
    #[error("trading balances must be non-negative with at least one positive")]
    Balances,
    #[error("model.window_len must be between 2 and {max}, got {got}")]
    WindowLen { got: usize, max: usize },
    #[error("model.buy_threshold ({buy}) must exceed sell_threshold ({sell})")]
    Thresholds { buy: f64, sell: f64 },
    #[error("exchange.symbol must not be empty")]
    Symbol,
    #[error("exchange.kline_interval {0:?} is not a valid Binance interval")]
    KlineInterval(String),
    #[error("exchange.timeout_secs must be positive")]
    Timeout,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults only when the file is absent
    ///
    /// Returns the config and whether defaults were used.
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<(Self, bool)> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok((Self::default(), true));
        }
        Ok((Self::load(path)?, false))
    }

    /// Reject invalid settings before anything runs
    pub fn validate(&self) -> Result<(), ConfigError> {
        let risk = &self.risk;
        if risk.stop_loss_pct <= Decimal::ZERO || risk.stop_loss_pct >= Decimal::ONE {
            return Err(ConfigError::StopLoss(risk.stop_loss_pct));
        }
        if risk.take_profit_pct <= Decimal::ZERO {
            return Err(ConfigError::TakeProfit(risk.take_profit_pct));
        }

        let trading = &self.trading;
        for (field, value) in [
            ("poll_interval_secs", trading.poll_interval_secs),
            ("progress_interval_secs", trading.progress_interval_secs),
            ("retry_backoff_secs", trading.retry_backoff_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::NonPositiveInterval { field });
            }
        }
        if trading.progress_interval_secs > trading.poll_interval_secs {
            return Err(ConfigError::ProgressExceedsPoll {
                progress: trading.progress_interval_secs,
                poll: trading.poll_interval_secs,
            });
        }
        if trading.initial_quote_balance < Decimal::ZERO
            || trading.initial_base_balance < Decimal::ZERO
            || (trading.initial_quote_balance.is_zero() && trading.initial_base_balance.is_zero())
        {
            return Err(ConfigError::Balances);
        }

        // The live loop fetches the window in a single klines request
        if !(2..=MAX_KLINES_PER_REQUEST).contains(&self.model.window_len) {
            return Err(ConfigError::WindowLen {
                got: self.model.window_len,
                max: MAX_KLINES_PER_REQUEST,
            });
        }
        if !(self.model.buy_threshold > self.model.sell_threshold) {
            return Err(ConfigError::Thresholds {
                buy: self.model.buy_threshold,
                sell: self.model.sell_threshold,
            });
        }

        if self.exchange.symbol.trim().is_empty() {
            return Err(ConfigError::Symbol);
        }
        if !is_valid_interval(&self.exchange.kline_interval) {
            return Err(ConfigError::KlineInterval(
                self.exchange.kline_interval.clone(),
            ));
        }
        if self.exchange.timeout_secs == 0 {
            return Err(ConfigError::Timeout);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    const FULL_TOML: &str = r#"
        [exchange]
        base_url = "https://api.binance.com"
        symbol = "BTCUSDT"
        kline_interval = "6h"
        timeout_secs = 10

        [model]
        window_len = 60
        buy_threshold = 0.5
        sell_threshold = -0.5

        [risk]
        stop_loss_pct = 0.05
        take_profit_pct = 0.005

        [trading]
        initial_quote_balance = 1000
        initial_base_balance = 0
        poll_interval_secs = 3600
        progress_interval_secs = 300
        retry_backoff_secs = 60

        [data]
        dir = "./data"
        state_file = "state.json"
        journal_file = "trade_history.csv"
        history_days = 2555

        [telemetry]
        log_level = "info"
        log_format = "json"
        metrics_port = 9090
    "#;

    #[test]
    fn test_config_deserialize() {
        let config: Config = toml::from_str(FULL_TOML).unwrap();
        assert_eq!(config.exchange.symbol, "BTCUSDT");
        assert_eq!(config.risk.stop_loss_pct, dec!(0.05));
        assert_eq!(config.risk.take_profit_pct, dec!(0.005));
        assert_eq!(config.trading.initial_quote_balance, dec!(1000));
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(config.telemetry.metrics_port, Some(9090));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [risk]
            stop_loss_pct = 0.02
            "#,
        )
        .unwrap();

        assert_eq!(config.risk.stop_loss_pct, dec!(0.02));
        assert_eq!(config.risk.take_profit_pct, dec!(0.005));
        assert_eq!(config.trading.poll_interval_secs, 3600);
        assert_eq!(config.model.window_len, 60);
        assert!(config.telemetry.metrics_port.is_none());
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trading.retry_backoff(), Duration::from_secs(60));
        assert_eq!(config.data.state_path(), PathBuf::from("./data/state.json"));
        assert_eq!(
            config.data.journal_path(),
            PathBuf::from("./data/trade_history.csv")
        );
    }

    #[test]
    fn test_reject_non_positive_stop_loss() {
        let mut config = Config::default();
        config.risk.stop_loss_pct = dec!(0);
        assert_eq!(config.validate(), Err(ConfigError::StopLoss(dec!(0))));

        config.risk.stop_loss_pct = dec!(1);
        assert!(matches!(config.validate(), Err(ConfigError::StopLoss(_))));
    }

    #[test]
    fn test_reject_non_positive_take_profit() {
        let mut config = Config::default();
        config.risk.take_profit_pct = dec!(-0.01);
        assert!(matches!(config.validate(), Err(ConfigError::TakeProfit(_))));
    }

    #[test]
    fn test_reject_zero_interval() {
        let mut config = Config::default();
        config.trading.poll_interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveInterval {
                field: "poll_interval_secs"
            })
        ));
    }

    #[test]
    fn test_reject_progress_longer_than_poll() {
        let mut config = Config::default();
        config.trading.progress_interval_secs = 7200;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ProgressExceedsPoll { .. })
        ));
    }

    #[test]
    fn test_reject_empty_balances() {
        let mut config = Config::default();
        config.trading.initial_quote_balance = dec!(0);
        assert_eq!(config.validate(), Err(ConfigError::Balances));

        config.trading.initial_base_balance = dec!(0.5);
        assert!(config.validate().is_ok());

        config.trading.initial_quote_balance = dec!(-1);
        assert_eq!(config.validate(), Err(ConfigError::Balances));
    }

    #[test]
    fn test_reject_bad_model_settings() {
        let mut config = Config::default();
        config.model.window_len = 1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::WindowLen { got: 1, max: 1000 })
        );

        let mut config = Config::default();
        config.model.window_len = 1500;
        assert_eq!(
            config.validate(),
            Err(ConfigError::WindowLen { got: 1500, max: 1000 })
        );

        let mut config = Config::default();
        config.model.window_len = 1000;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.model.buy_threshold = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Thresholds { .. })
        ));
    }

    #[test]
    fn test_reject_bad_exchange_settings() {
        let mut config = Config::default();
        config.exchange.kline_interval = "7h".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::KlineInterval("7h".to_string()))
        );

        let mut config = Config::default();
        config.exchange.symbol = " ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::Symbol));
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let (config, defaulted) = Config::load_or_default("/nonexistent/config.toml").unwrap();
        assert!(defaulted);
        assert_eq!(config.exchange.symbol, "BTCUSDT");
    }

    #[test]
    fn test_load_or_default_malformed_file_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[risk\nstop_loss_pct = ").unwrap();

        assert!(Config::load_or_default(&path).is_err());
    }

    #[test]
    fn test_risk_policy_from_config() {
        let policy = RiskConfig::default().policy();
        assert_eq!(policy, RiskPolicy::new(dec!(0.05), dec!(0.005)));
    }

    #[test]
    fn test_config_serializes_back_to_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.exchange.kline_interval, "6h");
        assert_eq!(parsed.risk.stop_loss_pct, dec!(0.05));
    }
}
