//! Data module
//!
//! Ledger state (JSON), trade journal (CSV) and candle history (Parquet)

mod journal;
mod parquet;
mod staged;
mod state;

pub use journal::{TradeJournal, TIMESTAMP_FORMAT};
pub use self::parquet::{candle_schema, ParquetReader, ParquetWriter, CANDLE_PREFIX};
pub use staged::StagedFile;
pub use state::{LedgerState, StateStore};
