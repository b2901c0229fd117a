//! Signal generation module
//!
//! Turns a window of preprocessed candles into a BUY/SELL/HOLD action

mod model;
mod types;
mod window;

pub use model::{MomentumModel, ThresholdPredictor};
pub use types::{Action, ParseActionError, WindowError};
pub use window::{MarketWindow, DEFAULT_WINDOW_LEN};

#[cfg(test)]
pub(crate) use window::test_support;

/// Trait for sequence models producing a directional score
pub trait SequenceModel: Send + Sync {
    /// Score a window; positive is bullish, negative bearish
    fn score(&self, window: &MarketWindow) -> f64;
}

/// Trait for signal sources
///
/// Must be deterministic: the same window always yields the same action.
pub trait SignalSource: Send + Sync {
    /// Predict the action for the given window
    fn predict(&self, window: &MarketWindow) -> anyhow::Result<Action>;
}
