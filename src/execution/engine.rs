//! Trade decision and risk-managed execution
//!
//! A synchronous state transition: signal + ledger + price in, mutated
//! ledger + trade record out. Performs no I/O and does not log.

use super::{
    Decision, DecisionReason, ExecutionError, Ledger, LedgerError, LedgerOp, PositionState,
    TradeRecord,
};
use crate::risk::{RiskPolicy, RiskTrigger};
use crate::signal::Action;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Converts signals into ledger transitions under a risk policy
#[derive(Debug, Clone, Default)]
pub struct TradeEngine {
    policy: RiskPolicy,
}

impl TradeEngine {
    /// Create an engine with the given risk policy
    pub fn new(policy: RiskPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Decide what to do without touching the ledger
    ///
    /// 1. BUY with no quote balance becomes HOLD.
    /// 2. FLAT: BUY opens; SELL and HOLD are no-ops.
    /// 3. LONG: stop-loss closes whatever the signal; otherwise SELL closes,
    ///    HOLD above the take-profit level closes, anything else holds.
    pub fn decide(&self, ledger: &Ledger, signal: Action, price: Decimal) -> Decision {
        let (effective, reason) = if signal == Action::Buy && ledger.quote_balance() <= Decimal::ZERO
        {
            (Action::Hold, DecisionReason::InsufficientFunds)
        } else {
            (signal, DecisionReason::Signal)
        };

        let decision = |executed, reason, op| Decision {
            requested: signal,
            executed,
            reason,
            op,
        };

        match ledger.position() {
            PositionState::Flat => match effective {
                Action::Buy => decision(Action::Buy, reason, LedgerOp::OpenLong),
                Action::Sell | Action::Hold => decision(effective, reason, LedgerOp::None),
            },
            PositionState::Long => {
                let trigger = self.policy.evaluate(ledger.entry_price(), price);
                if trigger == RiskTrigger::StopLoss {
                    return decision(Action::Sell, DecisionReason::StopLoss, LedgerOp::CloseLong);
                }

                match effective {
                    Action::Sell => decision(Action::Sell, reason, LedgerOp::CloseLong),
                    Action::Hold if trigger == RiskTrigger::TakeProfit => decision(
                        Action::Sell,
                        DecisionReason::TakeProfit,
                        LedgerOp::CloseLong,
                    ),
                    Action::Hold => decision(Action::Hold, reason, LedgerOp::None),
                    Action::Buy => {
                        decision(Action::Hold, DecisionReason::AlreadyLong, LedgerOp::None)
                    }
                }
            }
        }
    }

    /// Run one decision cycle against the ledger
    ///
    /// Always yields exactly one record on success. On error the ledger is
    /// unchanged.
    pub fn execute(
        &self,
        ledger: &mut Ledger,
        signal: Action,
        price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<TradeRecord, ExecutionError> {
        if price <= Decimal::ZERO {
            return Err(ExecutionError::InvalidPrice(price));
        }

        let decision = self.decide(ledger, signal, price);

        let profit = match decision.op {
            LedgerOp::None => None,
            LedgerOp::OpenLong => {
                ledger
                    .open_long(price)
                    .map_err(|e| precondition(ledger, decision.executed, price, e))?;
                None
            }
            LedgerOp::CloseLong => {
                ledger
                    .close_long(price)
                    .map_err(|e| precondition(ledger, decision.executed, price, e))?
                    .profit
            }
        };

        Ok(TradeRecord {
            timestamp,
            requested_action: decision.requested,
            executed_action: decision.executed,
            reason: decision.reason,
            price,
            quote_balance: ledger.quote_balance(),
            base_balance: ledger.base_balance(),
            profit,
        })
    }
}

fn precondition(
    ledger: &Ledger,
    action: Action,
    price: Decimal,
    source: LedgerError,
) -> ExecutionError {
    ExecutionError::Precondition {
        action,
        price,
        quote: ledger.quote_balance(),
        base: ledger.base_balance(),
        source,
    }
}
