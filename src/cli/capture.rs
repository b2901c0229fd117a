//! Capture command implementation

use crate::config::Config;
use crate::data::{ParquetWriter, CANDLE_PREFIX};
use crate::feed::{BinanceClient, CandleSource};
use chrono::{Duration, Utc};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Days of history to download (defaults to data.history_days)
    #[arg(long)]
    pub days: Option<u32>,

    /// Output directory for captured data (defaults to data.dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CaptureArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let days = self.days.unwrap_or(config.data.history_days);
        if days == 0 {
            anyhow::bail!("--days must be positive");
        }
        let output = self.output.clone().unwrap_or_else(|| config.data.dir.clone());

        let client = BinanceClient::with_config(config.exchange.client_config())?;
        let end = Utc::now();
        let start = end - Duration::days(i64::from(days));

        tracing::info!(
            symbol = %config.exchange.symbol,
            interval = %config.exchange.kline_interval,
            days,
            output = ?output,
            "Starting candle capture"
        );

        let candles = client
            .historical_candles(
                &config.exchange.symbol,
                &config.exchange.kline_interval,
                start,
                end,
            )
            .await?;

        if candles.is_empty() {
            tracing::warn!("No candles returned; nothing written");
            return Ok(());
        }

        let writer = ParquetWriter::new(output);
        let path = writer.file_path(CANDLE_PREFIX, end);
        writer.write_candles(&path, &candles)?;

        println!("Captured {} candles to {}", candles.len(), path.display());
        Ok(())
    }
}
