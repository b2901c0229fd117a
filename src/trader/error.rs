//! Per-cycle failure classification

use crate::execution::ExecutionError;
use crate::signal::WindowError;
use thiserror::Error;

/// Why a trading cycle was aborted
///
/// The ledger, state file and journal are unchanged whenever one of these is
/// returned.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Price or candle fetch failed
    #[error("Market data unavailable: {0:#}")]
    Feed(anyhow::Error),
    /// Fetched candles could not fill the market window
    #[error("Market window rejected: {0}")]
    Window(#[from] WindowError),
    /// The signal source failed to produce an action
    #[error("Signal source failed: {0:#}")]
    Signal(anyhow::Error),
    /// Ledger and engine disagree; state desync
    #[error("Ledger invariant violated: {0}")]
    Invariant(#[from] ExecutionError),
    /// State or journal could not be written
    #[error("Persistence failed: {0:#}")]
    Persistence(anyhow::Error),
}

impl CycleError {
    /// Short label used for logs and the error counter
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::Feed(_) => "feed",
            CycleError::Window(_) => "window",
            CycleError::Signal(_) => "signal",
            CycleError::Invariant(_) => "invariant",
            CycleError::Persistence(_) => "persistence",
        }
    }

    /// Whether this failure points at corrupted state rather than a
    /// transient collaborator problem
    pub fn is_invariant(&self) -> bool {
        matches!(self, CycleError::Invariant(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::LedgerError;
    use crate::signal::Action;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kinds() {
        let feed = CycleError::Feed(anyhow::anyhow!("timeout"));
        assert_eq!(feed.kind(), "feed");
        assert!(!feed.is_invariant());

        let window: CycleError = WindowError::InsufficientData { needed: 60, got: 3 }.into();
        assert_eq!(window.kind(), "window");

        let invariant: CycleError = ExecutionError::Precondition {
            action: Action::Sell,
            price: dec!(100),
            quote: dec!(1000),
            base: dec!(0),
            source: LedgerError::NoOpenPosition(dec!(0)),
        }
        .into();
        assert_eq!(invariant.kind(), "invariant");
        assert!(invariant.is_invariant());
    }

    #[test]
    fn test_feed_message_keeps_context_chain() {
        let err = CycleError::Feed(anyhow::anyhow!("connection reset").context("GET /api/v3/ticker/price"));
        let msg = err.to_string();
        assert!(msg.contains("GET /api/v3/ticker/price"));
        assert!(msg.contains("connection reset"));
    }
}
