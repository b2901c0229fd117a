//! btc-trader: signal-driven BTC/USDT trading bot
//!
//! This library provides the core components for:
//! - Current price and candle history from the Binance REST API
//! - Market window preprocessing and BUY/SELL/HOLD signal generation
//! - Stop-loss / take-profit risk policy
//! - All-in/all-out position ledger and trade execution engine
//! - Ledger state, trade journal and candle persistence
//! - Polling loop with backoff and cooperative shutdown
//! - Backtesting over captured candles
//! - Structured logging and Prometheus metrics

pub mod backtest;
pub mod cli;
pub mod config;
pub mod data;
pub mod execution;
pub mod feed;
pub mod risk;
pub mod signal;
pub mod telemetry;
pub mod trader;
