//! Polling loop driving the trade engine

use super::CycleError;
use crate::config::Config;
use crate::data::{LedgerState, StateStore, TradeJournal};
use crate::execution::{DecisionReason, Ledger, TradeEngine, TradeRecord};
use crate::feed::{CandleSource, PriceFeed};
use crate::signal::{Action, MarketWindow, SignalSource};
use crate::telemetry::{self, CounterMetric, GaugeMetric};
use chrono::{SubsecRound, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::Instrument;
use uuid::Uuid;

/// Market and timing parameters for the loop
#[derive(Debug, Clone)]
pub struct TraderSettings {
    pub symbol: String,
    pub kline_interval: String,
    pub window_len: usize,
    pub poll_interval: Duration,
    pub progress_interval: Duration,
    pub retry_backoff: Duration,
}

impl TraderSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            symbol: config.exchange.symbol.clone(),
            kline_interval: config.exchange.kline_interval.clone(),
            window_len: config.model.window_len,
            poll_interval: config.trading.poll_interval(),
            progress_interval: config.trading.progress_interval(),
            retry_backoff: config.trading.retry_backoff(),
        }
    }
}

/// Outcome of waiting between cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    Elapsed,
    Shutdown,
}

/// Signal-driven trader
///
/// Owns the shared ledger. Each cycle holds the ledger write lock from
/// execution through persistence, so concurrent readers only ever observe
/// committed state.
pub struct Trader {
    settings: TraderSettings,
    engine: TradeEngine,
    price_feed: Arc<dyn PriceFeed>,
    candles: Arc<dyn CandleSource>,
    signal: Arc<dyn SignalSource>,
    ledger: Arc<RwLock<Ledger>>,
    state: StateStore,
    journal: Mutex<TradeJournal>,
}

impl Trader {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: TraderSettings,
        engine: TradeEngine,
        price_feed: Arc<dyn PriceFeed>,
        candles: Arc<dyn CandleSource>,
        signal: Arc<dyn SignalSource>,
        ledger: Ledger,
        state: StateStore,
        journal: TradeJournal,
    ) -> Self {
        Self {
            settings,
            engine,
            price_feed,
            candles,
            signal,
            ledger: Arc::new(RwLock::new(ledger)),
            state,
            journal: Mutex::new(journal),
        }
    }

    pub fn settings(&self) -> &TraderSettings {
        &self.settings
    }

    /// Shared handle to the ledger
    pub fn ledger(&self) -> Arc<RwLock<Ledger>> {
        Arc::clone(&self.ledger)
    }

    /// Copy of the current committed ledger
    pub async fn ledger_snapshot(&self) -> Ledger {
        self.ledger.read().await.clone()
    }

    /// Number of records in the trade journal
    pub async fn journal_len(&self) -> usize {
        self.journal.lock().await.len()
    }

    /// Run a single decision cycle
    ///
    /// Fetches the window, predicts, fetches the price, executes on a copy of
    /// the ledger and writes state and journal. The in-memory ledger is only
    /// replaced once both files are committed.
    pub async fn run_cycle(&self) -> Result<TradeRecord, CycleError> {
        let symbol = &self.settings.symbol;

        let candles = self
            .candles
            .recent_candles(symbol, &self.settings.kline_interval, self.settings.window_len)
            .await
            .map_err(CycleError::Feed)?;
        let window = MarketWindow::from_candles(candles, self.settings.window_len)?;
        let requested = self.signal.predict(&window).map_err(CycleError::Signal)?;

        let quote = self
            .price_feed
            .current_price(symbol)
            .await
            .map_err(CycleError::Feed)?;
        if quote.price <= Decimal::ZERO {
            return Err(CycleError::Feed(anyhow::anyhow!(
                "Non-positive {} price from feed: {}",
                symbol,
                quote.price
            )));
        }

        // Journal timestamps have second resolution
        let timestamp = Utc::now().trunc_subsecs(0);

        // Files are written synchronously while the ledger lock is held;
        // cycles never overlap.
        let mut ledger = self.ledger.write().await;
        let mut journal = self.journal.lock().await;

        let mut next = ledger.clone();
        let record = self
            .engine
            .execute(&mut next, requested, quote.price, timestamp)?;

        let staged_state = self
            .state
            .stage(&LedgerState::from(&next))
            .map_err(CycleError::Persistence)?;
        let staged_journal = journal
            .stage_append(&record)
            .map_err(CycleError::Persistence)?;
        staged_journal.commit().map_err(CycleError::Persistence)?;
        staged_state.commit().map_err(CycleError::Persistence)?;

        *ledger = next;
        journal.push(record.clone());
        let realized = journal.realized_profit();
        drop(journal);

        report_trade(&record, &ledger, realized);
        Ok(record)
    }

    /// Run cycles until `shutdown` turns true
    ///
    /// Waits the poll interval after a successful cycle and the retry
    /// backoff after a failed one. Shutdown is honored during waits only; a
    /// cycle in progress always completes.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        tracing::info!(
            symbol = %self.settings.symbol,
            interval = %self.settings.kline_interval,
            poll_secs = self.settings.poll_interval.as_secs(),
            "Trader started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let span = tracing::info_span!("cycle", id = %Uuid::new_v4());
            let outcome = self.run_cycle().instrument(span).await;

            let wait = match outcome {
                Ok(_) => self.wait_next_cycle(&mut shutdown).await,
                Err(e) => {
                    report_error(&e);
                    tracing::info!(
                        backoff_secs = self.settings.retry_backoff.as_secs(),
                        "Retrying after backoff"
                    );
                    sleep_or_shutdown(self.settings.retry_backoff, &mut shutdown).await
                }
            };

            if wait == Wait::Shutdown {
                break;
            }
        }

        let ledger = self.ledger_snapshot().await;
        tracing::info!(
            usdt = %ledger.quote_balance(),
            btc = %ledger.base_balance(),
            "Trader stopped"
        );
        Ok(())
    }

    /// Wait the poll interval, logging progress and the current price
    async fn wait_next_cycle(&self, shutdown: &mut watch::Receiver<bool>) -> Wait {
        let mut remaining = self.settings.poll_interval;

        while !remaining.is_zero() {
            let step = remaining.min(self.settings.progress_interval);
            if sleep_or_shutdown(step, shutdown).await == Wait::Shutdown {
                return Wait::Shutdown;
            }
            remaining = remaining.saturating_sub(step);
            if remaining.is_zero() {
                break;
            }

            match self.price_feed.current_price(&self.settings.symbol).await {
                Ok(quote) => {
                    telemetry::set_gauge(GaugeMetric::LastPrice, quote.price);
                    tracing::info!(
                        remaining_minutes = remaining.as_secs() / 60,
                        price = %quote.price,
                        "Waiting for next cycle"
                    );
                }
                Err(e) => tracing::warn!(
                    remaining_minutes = remaining.as_secs() / 60,
                    error = %e,
                    "Waiting for next cycle; price unavailable"
                ),
            }
        }

        Wait::Elapsed
    }
}

async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> Wait {
    if *shutdown.borrow() {
        return Wait::Shutdown;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => Wait::Elapsed,
        changed = shutdown.changed() => {
            // A dropped sender can never clear the flag again
            if changed.is_err() || *shutdown.borrow() {
                Wait::Shutdown
            } else {
                Wait::Elapsed
            }
        }
    }
}

fn report_trade(record: &TradeRecord, ledger: &Ledger, realized: Decimal) {
    telemetry::increment_counter(CounterMetric::Cycles);
    telemetry::set_gauge(GaugeMetric::QuoteBalance, ledger.quote_balance());
    telemetry::set_gauge(GaugeMetric::BaseBalance, ledger.base_balance());
    telemetry::set_gauge(GaugeMetric::LastPrice, record.price);
    telemetry::set_gauge(GaugeMetric::Equity, ledger.equity(record.price));
    telemetry::set_gauge(GaugeMetric::RealizedPnl, realized);

    if record.executed_action != Action::Hold {
        telemetry::increment_counter(CounterMetric::Trades);
    }
    match record.reason {
        DecisionReason::StopLoss => telemetry::increment_counter(CounterMetric::StopLossExits),
        DecisionReason::TakeProfit => telemetry::increment_counter(CounterMetric::TakeProfitExits),
        _ => {}
    }

    tracing::info!(
        requested = %record.requested_action,
        executed = %record.executed_action,
        reason = %record.reason,
        price = %record.price,
        usdt = %record.quote_balance,
        btc = %record.base_balance,
        "Cycle complete"
    );

    if let Some(profit) = record.profit {
        if profit >= Decimal::ZERO {
            tracing::info!(%profit, reason = %record.reason, "Position closed in profit");
        } else {
            tracing::warn!(%profit, reason = %record.reason, "Position closed at a loss");
        }
    }
}

fn report_error(err: &CycleError) {
    telemetry::record_cycle_error(err.kind());
    if err.is_invariant() {
        tracing::error!(kind = err.kind(), error = %err, "Ledger invariant violated; cycle aborted");
    } else {
        tracing::error!(kind = err.kind(), error = %err, "Cycle failed");
    }
}
