//! Trade journal (CSV)

use super::StagedFile;
use crate::execution::{DecisionReason, Ledger, TradeRecord};
use crate::signal::Action;
use anyhow::Context;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Timestamp layout used in the journal
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One CSV row
///
/// `requested_action` and `reason` are absent in journals written before
/// they were recorded; such rows load as plain signal-driven trades.
#[derive(Debug, Serialize, Deserialize)]
struct JournalRow {
    timestamp: String,
    #[serde(default)]
    requested_action: Option<Action>,
    action: Action,
    #[serde(default)]
    reason: Option<DecisionReason>,
    #[serde(with = "rust_decimal::serde::str")]
    price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    usdt_balance: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    btc_balance: Decimal,
    #[serde(default)]
    profit: String,
}

impl From<&TradeRecord> for JournalRow {
    fn from(record: &TradeRecord) -> Self {
        Self {
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            requested_action: Some(record.requested_action),
            action: record.executed_action,
            reason: Some(record.reason),
            price: record.price,
            usdt_balance: record.quote_balance,
            btc_balance: record.base_balance,
            profit: record.profit.map(|p| p.to_string()).unwrap_or_default(),
        }
    }
}

impl TryFrom<JournalRow> for TradeRecord {
    type Error = anyhow::Error;

    fn try_from(row: JournalRow) -> anyhow::Result<Self> {
        let timestamp = NaiveDateTime::parse_from_str(&row.timestamp, TIMESTAMP_FORMAT)
            .with_context(|| format!("Invalid journal timestamp: {}", row.timestamp))?
            .and_utc();

        let profit = match row.profit.trim() {
            "" | "None" => None,
            value => Some(
                Decimal::from_str(value)
                    .with_context(|| format!("Invalid journal profit: {}", value))?,
            ),
        };

        Ok(TradeRecord {
            timestamp,
            requested_action: row.requested_action.unwrap_or(row.action),
            executed_action: row.action,
            reason: row.reason.unwrap_or(DecisionReason::Signal),
            price: row.price,
            quote_balance: row.usdt_balance,
            base_balance: row.btc_balance,
            profit,
        })
    }
}

/// Every trade record produced so far, backed by a CSV file
#[derive(Debug, Clone)]
pub struct TradeJournal {
    path: PathBuf,
    records: Vec<TradeRecord>,
}

impl TradeJournal {
    /// Empty journal that will write to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    /// Load the journal at `path`; a missing file yields an empty journal
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::new(path));
        }

        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut records = Vec::new();
        for (idx, row) in reader.deserialize::<JournalRow>().enumerate() {
            let row = row.with_context(|| format!("Invalid journal row {}", idx + 1))?;
            records.push(TradeRecord::try_from(row)?);
        }

        tracing::info!(path = %path.display(), records = records.len(), "Trade journal loaded");
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&TradeRecord> {
        self.records.last()
    }

    /// Sum of realized profit over all closing records
    pub fn realized_profit(&self) -> Decimal {
        self.records.iter().filter_map(|r| r.profit).sum()
    }

    /// Whether the last record's balances match `ledger`
    ///
    /// A mismatch means a cycle was journaled but its state write never
    /// landed. An empty journal always agrees.
    pub fn agrees_with(&self, ledger: &Ledger) -> bool {
        self.last().map_or(true, |r| {
            r.quote_balance == ledger.quote_balance() && r.base_balance == ledger.base_balance()
        })
    }

    /// Write the journal plus `record` to a temporary file
    ///
    /// The in-memory journal is unchanged; call [`push`](Self::push) once
    /// the staged file is committed.
    pub fn stage_append(&self, record: &TradeRecord) -> anyhow::Result<StagedFile> {
        let bytes = encode(self.records.iter().chain(std::iter::once(record)))?;
        StagedFile::write(&self.path, &bytes)
    }

    pub fn push(&mut self, record: TradeRecord) {
        self.records.push(record);
    }
}

fn encode<'a>(records: impl Iterator<Item = &'a TradeRecord>) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(JournalRow::from(record))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush journal: {}", e))
}
