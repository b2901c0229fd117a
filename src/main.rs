use btc_trader::cli::{print_config, print_status, Cli, Commands};
use btc_trader::config::Config;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let (config, defaulted) = Config::load_or_default(&cli.config)?;
    config.validate()?;

    // Initialize telemetry
    btc_trader::telemetry::init_telemetry(&config.telemetry)?;
    if defaulted {
        tracing::warn!(path = %cli.config, "Config file not found; using defaults");
    }

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting trading loop");
            args.execute(&config).await?;
        }
        Commands::Capture(args) => {
            tracing::info!("Starting data capture mode");
            args.execute(&config).await?;
        }
        Commands::Backtest(args) => {
            tracing::info!("Starting backtest");
            args.execute(&config).await?;
        }
        Commands::Status => print_status(&config)?,
        Commands::Config => print_config(&config)?,
    }

    Ok(())
}
