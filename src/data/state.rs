//! Persisted ledger state (JSON)

use super::StagedFile;
use crate::execution::Ledger;
use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk ledger representation
///
/// `entry_price` is omitted while flat; files without it still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(rename = "usdt_balance")]
    pub quote_balance: Decimal,
    #[serde(rename = "btc_balance")]
    pub base_balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<Decimal>,
}

impl From<&Ledger> for LedgerState {
    fn from(ledger: &Ledger) -> Self {
        let (quote_balance, base_balance, entry_price) = ledger.current_state();
        Self {
            quote_balance,
            base_balance,
            entry_price,
        }
    }
}

impl From<LedgerState> for Ledger {
    fn from(state: LedgerState) -> Self {
        Ledger::new(state.quote_balance, state.base_balance, state.entry_price)
    }
}

/// Loads and saves [`LedgerState`] at a fixed path
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state; `None` when no state file exists
    pub fn load(&self) -> anyhow::Result<Option<LedgerState>> {
        if !self.path.exists() {
            tracing::warn!(path = %self.path.display(), "State file not found");
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let state: LedgerState = serde_json::from_str(&json)
            .with_context(|| format!("Invalid state file {}", self.path.display()))?;

        if state.quote_balance < Decimal::ZERO || state.base_balance < Decimal::ZERO {
            anyhow::bail!(
                "State file {} holds negative balances (usdt={}, btc={})",
                self.path.display(),
                state.quote_balance,
                state.base_balance
            );
        }

        tracing::info!(
            path = %self.path.display(),
            usdt = %state.quote_balance,
            btc = %state.base_balance,
            entry_price = ?state.entry_price,
            "State loaded"
        );
        Ok(Some(state))
    }

    /// Load the ledger, or build one from the given defaults
    pub fn load_ledger(&self, default_quote: Decimal, default_base: Decimal) -> anyhow::Result<Ledger> {
        Ok(match self.load()? {
            Some(state) => state.into(),
            None => Ledger::new(default_quote, default_base, None),
        })
    }

    /// Write the state to a temporary file, ready to commit
    pub fn stage(&self, state: &LedgerState) -> anyhow::Result<StagedFile> {
        let json = serde_json::to_string_pretty(state)?;
        StagedFile::write(&self.path, json.as_bytes())
    }

    /// Save the state immediately
    pub fn save(&self, state: &LedgerState) -> anyhow::Result<()> {
        self.stage(state)?.commit()?;
        tracing::debug!(path = %self.path.display(), "State saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert!(store.load().unwrap().is_none());

        let ledger = store.load_ledger(dec!(1000), dec!(0)).unwrap();
        assert_eq!(ledger, Ledger::with_quote(dec!(1000)));
    }

    #[test]
    fn test_round_trip_preserves_ledger() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        let mut ledger = Ledger::with_quote(dec!(1000));
        ledger.open_long(dec!(37123.45)).unwrap();

        store.save(&LedgerState::from(&ledger)).unwrap();
        let reloaded = store.load_ledger(dec!(1), dec!(0)).unwrap();

        assert_eq!(reloaded, ledger);
        assert_eq!(reloaded.entry_price(), Some(dec!(37123.45)));
    }

    #[test]
    fn test_flat_state_omits_entry_price() {
        let state = LedgerState::from(&Ledger::with_quote(dec!(1000)));
        let json = serde_json::to_string(&state).unwrap();

        assert!(json.contains("usdt_balance"));
        assert!(json.contains("btc_balance"));
        assert!(!json.contains("entry_price"));
    }

    #[test]
    fn test_loads_legacy_numeric_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"usdt_balance": 0, "btc_balance": 0.5}"#).unwrap();

        let store = StateStore::new(&path);
        let state = store.load().unwrap().unwrap();
        assert_eq!(state.quote_balance, dec!(0));
        assert_eq!(state.base_balance, dec!(0.5));
        assert_eq!(state.entry_price, None);
    }

    #[test]
    fn test_rejects_negative_balances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"usdt_balance": -5, "btc_balance": 0}"#).unwrap();

        assert!(StateStore::new(&path).load().is_err());
    }

    #[test]
    fn test_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        assert!(StateStore::new(&path).load().is_err());
    }

    #[test]
    fn test_staged_state_not_visible_until_commit() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store
            .save(&LedgerState::from(&Ledger::with_quote(dec!(1000))))
            .unwrap();

        let staged = store
            .stage(&LedgerState::from(&Ledger::with_quote(dec!(5))))
            .unwrap();
        drop(staged);

        let state = store.load().unwrap().unwrap();
        assert_eq!(state.quote_balance, dec!(1000));
    }
}
