//! Signal types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Directional recommendation for a decision cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// Convert all quote currency into base currency
    Buy,
    /// Convert all base currency into quote currency
    Sell,
    /// Do nothing
    Hold,
}

impl Action {
    /// Canonical upper-case label used in logs and the trade journal
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing an [`Action`] from text
#[derive(Debug, Error)]
#[error("Unknown action: {0}")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            "HOLD" => Ok(Action::Hold),
            _ => Err(ParseActionError(s.to_string())),
        }
    }
}

/// Errors building a market window
#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    /// Not enough candles to fill the window
    #[error("Insufficient market data: need {needed} candles, got {got}")]
    InsufficientData { needed: usize, got: usize },
    /// Window length must be at least two rows
    #[error("Invalid window length: {0}")]
    InvalidLength(usize),
}
