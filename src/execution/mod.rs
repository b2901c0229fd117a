//! Execution module
//!
//! Position ledger and the risk-managed trade engine that mutates it

mod engine;
mod ledger;
mod types;

pub use engine::TradeEngine;
pub use ledger::{ClosedPosition, Ledger, PositionState};
pub use types::{
    Decision, DecisionReason, ExecutionError, LedgerError, LedgerOp, ParseReasonError, TradeRecord,
};
