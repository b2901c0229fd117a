//! Backtest command implementation

use crate::backtest::{BacktestConfig, BacktestSimulator};
use crate::config::Config;
use crate::data::{ParquetReader, CANDLE_PREFIX};
use crate::execution::TradeEngine;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Summary output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Args, Debug)]
pub struct BacktestArgs {
    /// Parquet file to replay (defaults to the newest capture)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Directory searched for captures (defaults to data.dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl BacktestArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let path = match &self.file {
            Some(file) => file.clone(),
            None => {
                let dir = self.data_dir.clone().unwrap_or_else(|| config.data.dir.clone());
                ParquetReader::latest_in(&dir, CANDLE_PREFIX)?.ok_or_else(|| {
                    anyhow::anyhow!("No candle captures in {}; run `capture` first", dir.display())
                })?
            }
        };

        tracing::info!(path = ?path, "Running backtest");
        let candles = ParquetReader::new(&path).read_candles()?;

        let simulator = BacktestSimulator::new(
            BacktestConfig::from_config(config),
            TradeEngine::new(config.risk.policy()),
            config.model.predictor(),
        );
        let result = simulator.run(candles)?;

        match self.format {
            OutputFormat::Table => println!("{}", result.summary.format_table()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result.summary)?),
        }
        Ok(())
    }
}
