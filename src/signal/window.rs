//! Fixed-length market window fed to the signal source

use super::WindowError;
use crate::feed::Candle;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Default number of candles in a window
pub const DEFAULT_WINDOW_LEN: usize = 60;

/// The most recent `len` candles in chronological order
#[derive(Debug, Clone)]
pub struct MarketWindow {
    rows: Vec<Candle>,
}

impl MarketWindow {
    /// Build a window from raw candles
    ///
    /// Candles are sorted by open time, duplicate open times are dropped
    /// (the later row wins) and only the trailing `len` rows are kept.
    pub fn from_candles(mut candles: Vec<Candle>, len: usize) -> Result<Self, WindowError> {
        if len < 2 {
            return Err(WindowError::InvalidLength(len));
        }

        candles.sort_by_key(|c| c.open_time);
        let mut rows: Vec<Candle> = Vec::with_capacity(candles.len());
        for candle in candles {
            match rows.last_mut() {
                Some(last) if last.open_time == candle.open_time => *last = candle,
                _ => rows.push(candle),
            }
        }

        if rows.len() < len {
            return Err(WindowError::InsufficientData {
                needed: len,
                got: rows.len(),
            });
        }

        let skip = rows.len() - len;
        rows.drain(..skip);
        Ok(Self { rows })
    }

    /// Rows in chronological order
    pub fn rows(&self) -> &[Candle] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Most recent candle
    pub fn last(&self) -> Option<&Candle> {
        self.rows.last()
    }

    /// Close of the most recent candle
    pub fn last_close(&self) -> Option<Decimal> {
        self.rows.last().map(|c| c.close)
    }

    /// Close prices as floats, for model scoring
    pub fn closes_f64(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|c| c.close.to_f64().unwrap_or(0.0))
            .collect()
    }
}
