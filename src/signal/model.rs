//! Sequence models and score-to-action mapping

use super::{Action, MarketWindow, SequenceModel, SignalSource};

/// Scores a window by its close-to-close percentage return
///
/// A window that rose 0.8% scores 0.8; one that fell 1.2% scores -1.2.
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentumModel;

impl MomentumModel {
    pub fn new() -> Self {
        Self
    }
}

impl SequenceModel for MomentumModel {
    fn score(&self, window: &MarketWindow) -> f64 {
        let closes = window.closes_f64();
        match (closes.first(), closes.last()) {
            (Some(first), Some(last)) if *first > 0.0 => (last / first - 1.0) * 100.0,
            _ => 0.0,
        }
    }
}

/// Maps a model score onto BUY/SELL/HOLD using fixed thresholds
#[derive(Debug, Clone)]
pub struct ThresholdPredictor<M> {
    model: M,
    buy_threshold: f64,
    sell_threshold: f64,
}

impl<M: SequenceModel> ThresholdPredictor<M> {
    /// Create a predictor; scores above `buy_threshold` buy, below `sell_threshold` sell
    pub fn new(model: M, buy_threshold: f64, sell_threshold: f64) -> Self {
        Self {
            model,
            buy_threshold,
            sell_threshold,
        }
    }

    /// Map a raw score to an action
    pub fn classify(&self, score: f64) -> Action {
        if score > self.buy_threshold {
            Action::Buy
        } else if score < self.sell_threshold {
            Action::Sell
        } else {
            Action::Hold
        }
    }
}

impl<M: SequenceModel> SignalSource for ThresholdPredictor<M> {
    fn predict(&self, window: &MarketWindow) -> anyhow::Result<Action> {
        let score = self.model.score(window);
        if !score.is_finite() {
            anyhow::bail!("Model produced a non-finite score: {}", score);
        }

        tracing::debug!(score, "Model prediction");
        Ok(self.classify(score))
    }
}
