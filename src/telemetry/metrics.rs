//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::net::SocketAddr;

/// Gauge metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeMetric {
    /// Quote (USDT) balance
    QuoteBalance,
    /// Base (BTC) balance
    BaseBalance,
    /// Quote balance plus base valued at the last price
    Equity,
    /// Last observed price
    LastPrice,
    /// Realized P&L since startup
    RealizedPnl,
}

impl GaugeMetric {
    pub fn name(&self) -> &'static str {
        match self {
            GaugeMetric::QuoteBalance => "btctrader_quote_balance",
            GaugeMetric::BaseBalance => "btctrader_base_balance",
            GaugeMetric::Equity => "btctrader_equity_usd",
            GaugeMetric::LastPrice => "btctrader_last_price",
            GaugeMetric::RealizedPnl => "btctrader_realized_pnl_usd",
        }
    }
}

/// Counter metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMetric {
    /// Completed trading cycles
    Cycles,
    /// Cycles that changed the position
    Trades,
    /// Forced stop-loss exits
    StopLossExits,
    /// Take-profit exits
    TakeProfitExits,
}

impl CounterMetric {
    pub fn name(&self) -> &'static str {
        match self {
            CounterMetric::Cycles => "btctrader_cycles_total",
            CounterMetric::Trades => "btctrader_trades_total",
            CounterMetric::StopLossExits => "btctrader_stop_loss_exits_total",
            CounterMetric::TakeProfitExits => "btctrader_take_profit_exits_total",
        }
    }
}

/// Name of the failed-cycle counter, labelled by `kind`
pub const CYCLE_ERRORS: &str = "btctrader_cycle_errors_total";

/// Start the Prometheus exporter on `0.0.0.0:port`
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: Decimal) {
    metrics::gauge!(metric.name()).set(value.to_f64().unwrap_or(f64::NAN));
}

/// Increment a counter by one
pub fn increment_counter(metric: CounterMetric) {
    metrics::counter!(metric.name()).increment(1);
}

/// Count a failed cycle under the given error kind
pub fn record_cycle_error(kind: &'static str) {
    metrics::counter!(CYCLE_ERRORS, "kind" => kind).increment(1);
}
