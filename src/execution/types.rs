//! Execution types

use crate::signal::Action;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why the engine executed what it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Followed the requested signal
    Signal,
    /// BUY requested with no quote balance; coerced to HOLD
    InsufficientFunds,
    /// BUY requested while already long; not actionable
    AlreadyLong,
    /// Position stopped out regardless of the signal
    StopLoss,
    /// HOLD promoted to SELL above the take-profit level
    TakeProfit,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::Signal => "signal",
            DecisionReason::InsufficientFunds => "insufficient_funds",
            DecisionReason::AlreadyLong => "already_long",
            DecisionReason::StopLoss => "stop_loss",
            DecisionReason::TakeProfit => "take_profit",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`DecisionReason`] from text
#[derive(Debug, Error)]
#[error("Unknown decision reason: {0}")]
pub struct ParseReasonError(pub String);

impl FromStr for DecisionReason {
    type Err = ParseReasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signal" => Ok(DecisionReason::Signal),
            "insufficient_funds" => Ok(DecisionReason::InsufficientFunds),
            "already_long" => Ok(DecisionReason::AlreadyLong),
            "stop_loss" => Ok(DecisionReason::StopLoss),
            "take_profit" => Ok(DecisionReason::TakeProfit),
            other => Err(ParseReasonError(other.to_string())),
        }
    }
}

/// Ledger mutation chosen for a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    /// Leave the ledger unchanged
    None,
    /// `open_long` at the cycle price
    OpenLong,
    /// `close_long` at the cycle price
    CloseLong,
}

/// A decision before it is applied to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Signal as received
    pub requested: Action,
    /// Action the engine carries out
    pub executed: Action,
    /// Why `executed` was chosen
    pub reason: DecisionReason,
    /// Ledger mutation implied by the decision
    pub op: LedgerOp,
}

/// One row of the trade journal; every cycle produces exactly one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Cycle timestamp
    pub timestamp: DateTime<Utc>,
    /// Signal as returned by the signal source
    pub requested_action: Action,
    /// Action actually carried out
    pub executed_action: Action,
    /// Why the executed action was chosen
    pub reason: DecisionReason,
    /// Price used for the cycle
    pub price: Decimal,
    /// Quote balance after the cycle
    pub quote_balance: Decimal,
    /// Base balance after the cycle
    pub base_balance: Decimal,
    /// Realized profit, only when a position was closed
    pub profit: Option<Decimal>,
}

impl TradeRecord {
    /// Whether the engine did something other than what was requested
    pub fn diverged(&self) -> bool {
        self.requested_action != self.executed_action || self.reason != DecisionReason::Signal
    }
}

/// Ledger precondition failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// `open_long` with nothing to buy with
    #[error("precondition failed: no quote balance to buy with ({0})")]
    NoQuoteBalance(Decimal),
    /// `open_long` while base is already held
    #[error("precondition failed: position already open ({0} base held)")]
    PositionAlreadyOpen(Decimal),
    /// `close_long` with nothing to sell
    #[error("precondition failed: no open position ({0} base held)")]
    NoOpenPosition(Decimal),
    /// Trade price must be positive
    #[error("precondition failed: invalid price {0}")]
    InvalidPrice(Decimal),
}

/// Engine failures; the ledger is left untouched when one is returned
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// The cycle price is unusable
    #[error("Invalid price {0}")]
    InvalidPrice(Decimal),
    /// Ledger and decision disagree: state desync
    #[error("{action} at {price} failed with quote={quote} base={base}: {source}")]
    Precondition {
        action: Action,
        price: Decimal,
        quote: Decimal,
        base: Decimal,
        #[source]
        source: LedgerError,
    },
}
