//! Parquet storage for historical candles

use crate::feed::Candle;
use anyhow::Context;
use arrow::array::{ArrayRef, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// File name prefix for captured candles
pub const CANDLE_PREFIX: &str = "candles";

/// Candle schema; prices stored as strings for Decimal precision
pub fn candle_schema() -> Schema {
    let ts = || DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()));
    Schema::new(vec![
        Field::new("open_time", ts(), false),
        Field::new("open", DataType::Utf8, false),
        Field::new("high", DataType::Utf8, false),
        Field::new("low", DataType::Utf8, false),
        Field::new("close", DataType::Utf8, false),
        Field::new("volume", DataType::Utf8, false),
        Field::new("close_time", ts(), false),
    ])
}

/// Writes candle batches into an output directory
pub struct ParquetWriter {
    output_dir: PathBuf,
}

impl ParquetWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Ensure output directory exists
    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;
        Ok(())
    }

    /// Generate file path for a given timestamp and prefix
    pub fn file_path(&self, prefix: &str, timestamp: DateTime<Utc>) -> PathBuf {
        let filename = format!("{}_{}.parquet", prefix, timestamp.format("%Y%m%d_%H%M%S"));
        self.output_dir.join(filename)
    }

    /// Write candles to a Parquet file; no file is created for an empty slice
    pub fn write_candles(&self, path: &Path, candles: &[Candle]) -> anyhow::Result<()> {
        if candles.is_empty() {
            return Ok(());
        }

        self.ensure_dir()?;

        let schema = Arc::new(candle_schema());
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        let timestamps = |f: fn(&Candle) -> DateTime<Utc>| -> ArrayRef {
            let micros: Vec<i64> = candles.iter().map(|c| f(c).timestamp_micros()).collect();
            Arc::new(TimestampMicrosecondArray::from(micros).with_timezone("UTC"))
        };
        let decimals = |f: fn(&Candle) -> Decimal| -> ArrayRef {
            let values: Vec<String> = candles.iter().map(|c| f(c).to_string()).collect();
            Arc::new(StringArray::from(values))
        };

        let batch = RecordBatch::try_new(
            schema,
            vec![
                timestamps(|c| c.open_time),
                decimals(|c| c.open),
                decimals(|c| c.high),
                decimals(|c| c.low),
                decimals(|c| c.close),
                decimals(|c| c.volume),
                timestamps(|c| c.close_time),
            ],
        )?;

        writer.write(&batch)?;
        writer.close()?;

        tracing::debug!(path = ?path, count = candles.len(), "Wrote candles to Parquet");

        Ok(())
    }
}

/// Reader for Parquet candle files
pub struct ParquetReader {
    path: PathBuf,
}

impl ParquetReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Most recent file in `dir` whose name starts with `prefix`
    ///
    /// File names embed a sortable timestamp, so the lexicographic maximum
    /// is the newest capture.
    pub fn latest_in(dir: &Path, prefix: &str) -> anyhow::Result<Option<PathBuf>> {
        if !dir.exists() {
            return Ok(None);
        }

        let mut latest: Option<PathBuf> = None;
        for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(prefix) && n.ends_with(".parquet"))
                .unwrap_or(false);
            if matches && latest.as_ref().map_or(true, |l| path > *l) {
                latest = Some(path);
            }
        }
        Ok(latest)
    }

    /// Read all candles in file order
    pub fn read_candles(&self) -> anyhow::Result<Vec<Candle>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let reader = builder.build()?;

        let mut candles = Vec::new();

        for batch_result in reader {
            let batch = batch_result?;

            let timestamp_col = |idx: usize, name: &str| {
                batch
                    .column(idx)
                    .as_any()
                    .downcast_ref::<TimestampMicrosecondArray>()
                    .ok_or_else(|| anyhow::anyhow!("Invalid {} column", name))
            };
            let string_col = |idx: usize, name: &str| {
                batch
                    .column(idx)
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| anyhow::anyhow!("Invalid {} column", name))
            };

            let open_times = timestamp_col(0, "open_time")?;
            let opens = string_col(1, "open")?;
            let highs = string_col(2, "high")?;
            let lows = string_col(3, "low")?;
            let closes = string_col(4, "close")?;
            let volumes = string_col(5, "volume")?;
            let close_times = timestamp_col(6, "close_time")?;

            for i in 0..batch.num_rows() {
                let open_time = DateTime::from_timestamp_micros(open_times.value(i))
                    .ok_or_else(|| anyhow::anyhow!("Invalid open_time"))?;
                let close_time = DateTime::from_timestamp_micros(close_times.value(i))
                    .ok_or_else(|| anyhow::anyhow!("Invalid close_time"))?;

                candles.push(Candle {
                    open_time,
                    open: Decimal::from_str(opens.value(i))?,
                    high: Decimal::from_str(highs.value(i))?,
                    low: Decimal::from_str(lows.value(i))?,
                    close: Decimal::from_str(closes.value(i))?,
                    volume: Decimal::from_str(volumes.value(i))?,
                    close_time,
                });
            }
        }

        Ok(candles)
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
