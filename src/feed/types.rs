//! Market data types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLCV candle (kline)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time
    pub open_time: DateTime<Utc>,
    /// Opening price
    pub open: Decimal,
    /// Highest traded price
    pub high: Decimal,
    /// Lowest traded price
    pub low: Decimal,
    /// Closing price
    pub close: Decimal,
    /// Base asset volume
    pub volume: Decimal,
    /// Candle close time
    pub close_time: DateTime<Utc>,
}

/// A point-in-time price quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Trading symbol (e.g., "BTCUSDT")
    pub symbol: String,
    /// Last traded price
    pub price: Decimal,
    /// Local timestamp when the quote was received
    pub timestamp: DateTime<Utc>,
}

/// Kline intervals accepted by Binance
pub const KLINE_INTERVALS: &[&str] = &[
    "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w", "1M",
];

/// Check whether an interval string is a valid Binance kline interval
pub fn is_valid_interval(interval: &str) -> bool {
    KLINE_INTERVALS.contains(&interval)
}
