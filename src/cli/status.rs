//! Status and config command implementations

use crate::config::Config;
use crate::data::{StateStore, TradeJournal};
use crate::execution::PositionState;

/// Print the persisted ledger and a journal summary
pub fn print_status(config: &Config) -> anyhow::Result<()> {
    let state = StateStore::new(config.data.state_path());
    let ledger = state.load_ledger(
        config.trading.initial_quote_balance,
        config.trading.initial_base_balance,
    )?;
    let journal = TradeJournal::load(config.data.journal_path())?;

    println!("btc-trader status");
    println!("  State file:   {}", state.path().display());
    println!("  USDT balance: {}", ledger.quote_balance());
    println!("  BTC balance:  {}", ledger.base_balance());
    match (ledger.position(), ledger.entry_price()) {
        (PositionState::Long, Some(entry)) => println!("  Position:     LONG @ {}", entry),
        (PositionState::Long, None) => println!("  Position:     LONG (entry unknown)"),
        (PositionState::Flat, _) => println!("  Position:     FLAT"),
    }

    println!("  Journal:      {} records", journal.len());
    println!("  Realized P&L: {}", journal.realized_profit());
    if let Some(last) = journal.last() {
        println!(
            "  Last cycle:   {} {} @ {} ({})",
            last.timestamp.format("%Y-%m-%d %H:%M:%S"),
            last.executed_action,
            last.price,
            last.reason
        );
    }
    Ok(())
}

/// Print the effective configuration as TOML
pub fn print_config(config: &Config) -> anyhow::Result<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
