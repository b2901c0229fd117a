//! Stop-loss and take-profit evaluation

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Outcome of evaluating the risk policy against an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTrigger {
    /// No threshold crossed
    None,
    /// Price fell below the stop-loss level; liquidate
    StopLoss,
    /// Price rose above the take-profit level; liquidate if idle
    TakeProfit,
}

/// Static stop-loss / take-profit thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskPolicy {
    /// Fraction below entry that forces liquidation
    pub stop_loss_pct: Decimal,
    /// Fraction above entry that triggers opportunistic liquidation
    pub take_profit_pct: Decimal,
}

impl RiskPolicy {
    /// Create a policy with the given thresholds
    pub fn new(stop_loss_pct: Decimal, take_profit_pct: Decimal) -> Self {
        Self {
            stop_loss_pct,
            take_profit_pct,
        }
    }

    /// Price below which the position is stopped out
    pub fn stop_loss_level(&self, entry_price: Decimal) -> Decimal {
        entry_price * (Decimal::ONE - self.stop_loss_pct)
    }

    /// Price above which profit is taken
    pub fn take_profit_level(&self, entry_price: Decimal) -> Decimal {
        entry_price * (Decimal::ONE + self.take_profit_pct)
    }

    /// Evaluate thresholds for a position entered at `entry_price`
    ///
    /// Stop-loss is checked first and wins if both levels are crossed. Without
    /// an entry price nothing can trigger.
    pub fn evaluate(&self, entry_price: Option<Decimal>, current_price: Decimal) -> RiskTrigger {
        let Some(entry) = entry_price else {
            return RiskTrigger::None;
        };

        if current_price < self.stop_loss_level(entry) {
            RiskTrigger::StopLoss
        } else if current_price > self.take_profit_level(entry) {
            RiskTrigger::TakeProfit
        } else {
            RiskTrigger::None
        }
    }
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self::new(dec!(0.05), dec!(0.005))
    }
}

/// Free-standing form of [`RiskPolicy::evaluate`]
pub fn evaluate(
    entry_price: Option<Decimal>,
    current_price: Decimal,
    stop_loss_pct: Decimal,
    take_profit_pct: Decimal,
) -> RiskTrigger {
    RiskPolicy::new(stop_loss_pct, take_profit_pct).evaluate(entry_price, current_price)
}
