//! Trader end-to-end tests against a mock Binance server

use btc_trader::data::{StateStore, TradeJournal};
use btc_trader::execution::{DecisionReason, Ledger, TradeEngine};
use btc_trader::feed::{BinanceClient, BinanceConfig};
use btc_trader::risk::RiskPolicy;
use btc_trader::signal::{Action, MomentumModel, ThresholdPredictor};
use btc_trader::trader::{Trader, TraderSettings};
use mockito::{Matcher, Server, ServerGuard};
use rust_decimal_macros::dec;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const WINDOW: usize = 5;

/// Kline rows with the given closes, 6h apart
fn klines_json(closes: &[&str]) -> String {
    let start_ms: i64 = 1_704_067_200_000; // 2024-01-01T00:00:00Z
    let step_ms: i64 = 6 * 60 * 60 * 1000;
    let rows: Vec<String> = closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let open_time = start_ms + step_ms * i as i64;
            format!(
                r#"[{},"{c}","{c}","{c}","{c}","1.0",{},"0",1,"0","0","0"]"#,
                open_time,
                open_time + step_ms - 1,
                c = close
            )
        })
        .collect();
    format!("[{}]", rows.join(","))
}

async fn mock_market(
    server: &mut ServerGuard,
    closes: &[&str],
    price: &str,
) -> (mockito::Mock, mockito::Mock) {
    let klines = server
        .mock("GET", "/api/v3/klines")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()),
            Matcher::UrlEncoded("interval".into(), "6h".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(klines_json(closes))
        .create_async()
        .await;
    let ticker = server
        .mock("GET", "/api/v3/ticker/price")
        .match_query(Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"symbol":"BTCUSDT","price":"{}"}}"#, price))
        .create_async()
        .await;
    (klines, ticker)
}

fn build_trader(server: &ServerGuard, dir: &Path) -> Trader {
    let client = Arc::new(
        BinanceClient::with_config(BinanceConfig {
            base_url: server.url(),
            timeout: Duration::from_secs(5),
        })
        .unwrap(),
    );

    let state = StateStore::new(dir.join("state.json"));
    let ledger = state.load_ledger(dec!(1000), dec!(0)).unwrap();
    let journal = TradeJournal::load(dir.join("trade_history.csv")).unwrap();

    Trader::new(
        TraderSettings {
            symbol: "BTCUSDT".to_string(),
            kline_interval: "6h".to_string(),
            window_len: WINDOW,
            poll_interval: Duration::from_millis(20),
            progress_interval: Duration::from_millis(10),
            retry_backoff: Duration::from_millis(10),
        },
        TradeEngine::new(RiskPolicy::default()),
        client.clone(),
        client,
        Arc::new(ThresholdPredictor::new(MomentumModel::new(), 0.5, -0.5)),
        ledger,
        state,
        journal,
    )
}

#[tokio::test]
async fn test_buy_restart_take_profit() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut server = Server::new_async().await;

    // Rising window: BUY at 40000
    let (klines, ticker) = mock_market(
        &mut server,
        &["39000", "39200", "39500", "39800", "40000"],
        "40000",
    )
    .await;
    let trader = build_trader(&server, dir.path());
    let record = trader.run_cycle().await.unwrap();
    klines.assert_async().await;
    ticker.assert_async().await;

    assert_eq!(record.executed_action, Action::Buy);
    assert_eq!(trader.ledger_snapshot().await.base_balance(), dec!(0.025));
    drop(trader);

    // Flat window after restart: HOLD promoted by take-profit at 40400
    server.reset_async().await;
    let _mocks = mock_market(
        &mut server,
        &["40000", "40010", "40000", "40020", "40000"],
        "40400",
    )
    .await;
    let restarted = build_trader(&server, dir.path());
    assert_eq!(restarted.journal_len().await, 1);
    assert_eq!(
        restarted.ledger_snapshot().await.entry_price(),
        Some(dec!(40000))
    );

    let record = restarted.run_cycle().await.unwrap();
    assert_eq!(record.requested_action, Action::Hold);
    assert_eq!(record.executed_action, Action::Sell);
    assert_eq!(record.reason, DecisionReason::TakeProfit);
    assert_eq!(record.profit, Some(dec!(10)));

    let ledger = restarted.ledger_snapshot().await;
    assert_eq!(ledger, Ledger::with_quote(dec!(1010)));

    let journal = TradeJournal::load(dir.path().join("trade_history.csv")).unwrap();
    assert_eq!(journal.len(), 2);
    assert_eq!(journal.realized_profit(), dec!(10));
}

#[tokio::test]
async fn test_exchange_outage_leaves_state_untouched() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", Matcher::Any)
        .with_status(503)
        .with_body("maintenance")
        .create_async()
        .await;

    let trader = build_trader(&server, dir.path());
    let err = trader.run_cycle().await.unwrap_err();

    assert_eq!(err.kind(), "feed");
    assert!(err.to_string().contains("503"));
    assert_eq!(trader.ledger_snapshot().await, Ledger::with_quote(dec!(1000)));
    assert!(!dir.path().join("state.json").exists());
    assert!(!dir.path().join("trade_history.csv").exists());
}

#[tokio::test]
async fn test_short_history_is_window_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut server = Server::new_async().await;
    let _mocks = mock_market(&mut server, &["40000", "40100"], "40100").await;

    let trader = build_trader(&server, dir.path());
    let err = trader.run_cycle().await.unwrap_err();
    assert_eq!(err.kind(), "window");
}
