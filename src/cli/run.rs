//! Run command implementation

use crate::config::Config;
use crate::data::{StateStore, TradeJournal};
use crate::execution::TradeEngine;
use crate::feed::BinanceClient;
use crate::trader::{Trader, TraderSettings};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let client = Arc::new(BinanceClient::with_config(config.exchange.client_config())?);

        let state = StateStore::new(config.data.state_path());
        let ledger = state.load_ledger(
            config.trading.initial_quote_balance,
            config.trading.initial_base_balance,
        )?;
        let journal = TradeJournal::load(config.data.journal_path())?;
        if !journal.agrees_with(&ledger) {
            if let Some(last) = journal.last() {
                tracing::warn!(
                    journal_usdt = %last.quote_balance,
                    journal_btc = %last.base_balance,
                    state_usdt = %ledger.quote_balance(),
                    state_btc = %ledger.base_balance(),
                    "Last journal record disagrees with saved state; keeping saved state"
                );
            }
        }

        let trader = Trader::new(
            TraderSettings::from_config(config),
            TradeEngine::new(config.risk.policy()),
            client.clone(),
            client,
            Arc::new(config.model.predictor()),
            ledger,
            state,
            journal,
        );

        if self.once {
            let record = trader.run_cycle().await?;
            println!(
                "{} {} (requested {}, {}) price={} usdt={} btc={}",
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                record.executed_action,
                record.requested_action,
                record.reason,
                record.price,
                record.quote_balance,
                record.base_balance,
            );
            return Ok(());
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested; stopping after the current cycle");
                let _ = shutdown_tx.send(true);
            }
        });

        trader.run(shutdown_rx).await
    }
}
