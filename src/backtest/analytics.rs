//! Backtest analytics and reporting

use crate::execution::{DecisionReason, TradeRecord};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// One point of the equity curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: Decimal,
}

/// Summary statistics from backtest
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BacktestSummary {
    /// Decision cycles replayed
    pub cycles: usize,
    /// Equity at the first replayed price
    pub initial_equity: Decimal,
    /// Equity at the last replayed price
    pub final_equity: Decimal,
    /// Final minus initial equity
    pub net_pnl: Decimal,
    /// Net P&L as a fraction of initial equity
    pub net_pnl_pct: Decimal,
    /// Sum of profit over closing trades
    pub realized_pnl: Decimal,
    /// Trades that closed a position
    pub closing_trades: usize,
    /// Closing trades with positive profit
    pub winning_trades: usize,
    /// Winning fraction of closing trades
    pub win_rate: Decimal,
    /// Forced stop-loss exits
    pub stop_loss_exits: usize,
    /// Take-profit exits
    pub take_profit_exits: usize,
    /// Maximum drawdown (absolute)
    pub max_drawdown: Decimal,
    /// Maximum drawdown (fraction of the running peak)
    pub max_drawdown_pct: Decimal,
}

/// Complete backtest results
#[derive(Debug, Clone, Default, Serialize)]
pub struct BacktestResult {
    /// Summary statistics
    pub summary: BacktestSummary,
    /// One record per replayed cycle
    #[serde(skip)]
    pub records: Vec<TradeRecord>,
    /// Equity after every cycle
    #[serde(skip)]
    pub equity_curve: Vec<EquityPoint>,
}

impl BacktestSummary {
    /// Build a summary from replayed records and their equity curve
    pub fn from_run(initial_equity: Decimal, records: &[TradeRecord], curve: &[EquityPoint]) -> Self {
        let final_equity = curve.last().map(|p| p.equity).unwrap_or(initial_equity);
        let net_pnl = final_equity - initial_equity;
        let net_pnl_pct = if initial_equity > Decimal::ZERO {
            net_pnl / initial_equity
        } else {
            Decimal::ZERO
        };

        let profits: Vec<Decimal> = records.iter().filter_map(|r| r.profit).collect();
        let winning_trades = profits.iter().filter(|p| **p > Decimal::ZERO).count();
        let win_rate = if profits.is_empty() {
            Decimal::ZERO
        } else {
            Decimal::from(winning_trades) / Decimal::from(profits.len())
        };

        let count_reason =
            |reason: DecisionReason| records.iter().filter(|r| r.reason == reason).count();

        let (max_drawdown, max_drawdown_pct) = max_drawdown(initial_equity, curve);

        Self {
            cycles: records.len(),
            initial_equity,
            final_equity,
            net_pnl,
            net_pnl_pct,
            realized_pnl: profits.iter().sum(),
            closing_trades: profits.len(),
            winning_trades,
            win_rate,
            stop_loss_exits: count_reason(DecisionReason::StopLoss),
            take_profit_exits: count_reason(DecisionReason::TakeProfit),
            max_drawdown,
            max_drawdown_pct,
        }
    }

    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        format!(
            r#"
══════════════════════════════════════════════════════
               BACKTEST RESULTS
══════════════════════════════════════════════════════

PERFORMANCE
───────────────────────────────────────────────────────
Initial Equity:   {:.2}
Final Equity:     {:.2}
Net P&L:          {:+.2} ({:+.2}%)
Realized P&L:     {:+.2}
Max Drawdown:     {:.2} ({:.2}%)
Win Rate:         {:.1}%

ACTIVITY
───────────────────────────────────────────────────────
Cycles:           {}
Closing Trades:   {}
Stop-Loss Exits:  {}
TP Exits:         {}
══════════════════════════════════════════════════════
"#,
            self.initial_equity,
            self.final_equity,
            self.net_pnl,
            self.net_pnl_pct * dec!(100),
            self.realized_pnl,
            self.max_drawdown,
            self.max_drawdown_pct * dec!(100),
            self.win_rate * dec!(100),
            self.cycles,
            self.closing_trades,
            self.stop_loss_exits,
            self.take_profit_exits,
        )
    }
}

/// Largest peak-to-trough equity decline, absolute and relative to the peak
fn max_drawdown(initial_equity: Decimal, curve: &[EquityPoint]) -> (Decimal, Decimal) {
    let mut peak = initial_equity;
    let mut worst = Decimal::ZERO;
    let mut worst_pct = Decimal::ZERO;

    for point in curve {
        if point.equity > peak {
            peak = point.equity;
        }
        let drawdown = peak - point.equity;
        if drawdown > worst {
            worst = drawdown;
            if peak > Decimal::ZERO {
                worst_pct = drawdown / peak;
            }
        }
    }

    (worst, worst_pct)
}
