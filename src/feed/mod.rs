//! Market data module
//!
//! Current BTC price and historical candles from the Binance REST API

mod binance;
mod types;

pub use binance::{BinanceClient, BinanceConfig, BINANCE_API_URL, MAX_KLINES_PER_REQUEST};
pub use types::{is_valid_interval, Candle, PriceQuote, KLINE_INTERVALS};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of the current reference price
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch the latest traded price for a symbol
    async fn current_price(&self, symbol: &str) -> anyhow::Result<PriceQuote>;
}

/// Source of OHLCV candles
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch the most recent `limit` candles
    async fn recent_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>>;

    /// Fetch all candles opened in `[start, end)`
    async fn historical_candles(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Candle>>;
}
