//! Risk management module
//!
//! Stop-loss and take-profit controls on the open position

mod policy;

pub use policy::{evaluate, RiskPolicy, RiskTrigger};
