//! Backtest simulator engine

use super::{BacktestConfig, BacktestResult, BacktestSummary, EquityPoint};
use crate::execution::{Ledger, TradeEngine};
use crate::feed::Candle;
use crate::signal::{MarketWindow, SignalSource, WindowError};
use anyhow::Context;

/// Replays candles through a signal source and the trade engine
pub struct BacktestSimulator<S> {
    config: BacktestConfig,
    engine: TradeEngine,
    signal: S,
}

impl<S: SignalSource> BacktestSimulator<S> {
    /// Create a new simulator
    pub fn new(config: BacktestConfig, engine: TradeEngine, signal: S) -> Self {
        Self {
            config,
            engine,
            signal,
        }
    }

    /// Run the backtest
    ///
    /// Every complete window yields one cycle priced at the close of its last
    /// candle and stamped with that candle's close time.
    pub fn run(&self, mut candles: Vec<Candle>) -> anyhow::Result<BacktestResult> {
        let window_len = self.config.window_len;
        if window_len < 2 {
            return Err(WindowError::InvalidLength(window_len).into());
        }

        // Later rows win on duplicate open times
        candles.sort_by_key(|c| c.open_time);
        candles.reverse();
        candles.dedup_by_key(|c| c.open_time);
        candles.reverse();
        if candles.len() < window_len {
            return Err(WindowError::InsufficientData {
                needed: window_len,
                got: candles.len(),
            }
            .into());
        }

        let mut ledger = Ledger::new(self.config.initial_quote, self.config.initial_base, None);
        let initial_equity = ledger.equity(candles[window_len - 1].close);

        let cycles = candles.len() - window_len + 1;
        let mut records = Vec::with_capacity(cycles);
        let mut equity_curve = Vec::with_capacity(cycles);

        for end in window_len..=candles.len() {
            let last = &candles[end - 1];
            let window =
                MarketWindow::from_candles(candles[end - window_len..end].to_vec(), window_len)?;
            let action = self
                .signal
                .predict(&window)
                .with_context(|| format!("Signal failed at {}", last.open_time))?;

            let record = self
                .engine
                .execute(&mut ledger, action, last.close, last.close_time)
                .with_context(|| format!("Engine failed at {}", last.open_time))?;

            equity_curve.push(EquityPoint {
                timestamp: last.close_time,
                equity: ledger.equity(last.close),
            });
            records.push(record);
        }

        let summary = BacktestSummary::from_run(initial_equity, &records, &equity_curve);
        tracing::info!(
            cycles = summary.cycles,
            closing_trades = summary.closing_trades,
            net_pnl = %summary.net_pnl,
            "Backtest complete"
        );

        Ok(BacktestResult {
            summary,
            records,
            equity_curve,
        })
    }
}
