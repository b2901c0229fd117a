//! CLI interface for btc-trader
//!
//! Provides subcommands for:
//! - `run`: Start the trading loop
//! - `capture`: Download candle history to Parquet
//! - `backtest`: Replay captured candles
//! - `status`: Show persisted ledger and journal
//! - `config`: Show effective configuration

mod backtest;
mod capture;
mod run;
mod status;

pub use backtest::{BacktestArgs, OutputFormat};
pub use capture::CaptureArgs;
pub use run::RunArgs;
pub use status::{print_config, print_status};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "btc-trader")]
#[command(about = "Signal-driven BTC/USDT trading bot with stop-loss and take-profit risk controls")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the trading loop
    Run(RunArgs),
    /// Download candle history (no trading)
    Capture(CaptureArgs),
    /// Run backtest on captured data
    Backtest(BacktestArgs),
    /// Show current state
    Status,
    /// Show effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_once() {
        let cli = Cli::try_parse_from(["btc-trader", "run", "--once"]).unwrap();
        assert_eq!(cli.config, "config.toml");
        match cli.command {
            Commands::Run(args) => assert!(args.once),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_backtest_json() {
        let cli = Cli::try_parse_from([
            "btc-trader",
            "--config",
            "prod.toml",
            "backtest",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.config, "prod.toml");
        match cli.command {
            Commands::Backtest(args) => assert_eq!(args.format, OutputFormat::Json),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_capture_days() {
        let cli = Cli::try_parse_from(["btc-trader", "capture", "--days", "30"]).unwrap();
        match cli.command {
            Commands::Capture(args) => {
                assert_eq!(args.days, Some(30));
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["btc-trader", "backtest", "--format", "xml"]).is_err());
    }
}
