//! Trader module
//!
//! Polling loop that feeds market data through the signal source and trade
//! engine, persisting every cycle

mod error;
mod runner;

pub use error::CycleError;
pub use runner::{Trader, TraderSettings};
