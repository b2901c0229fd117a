//! Backtesting module
//!
//! Replays stored candles through the signal source and trade engine

mod analytics;
mod simulator;

pub use analytics::{BacktestResult, BacktestSummary, EquityPoint};
pub use simulator::BacktestSimulator;

use crate::config::Config;
use rust_decimal::Decimal;

/// Backtest configuration
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    /// Candles per market window
    pub window_len: usize,
    /// Starting quote balance
    pub initial_quote: Decimal,
    /// Starting base balance
    pub initial_base: Decimal,
}

impl BacktestConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            window_len: config.model.window_len,
            initial_quote: config.trading.initial_quote_balance,
            initial_base: config.trading.initial_base_balance,
        }
    }
}
