//! Binance REST market data client
//!
//! Serves both the ticker price used for execution and the klines that feed
//! the signal window.

use super::{Candle, CandleSource, PriceFeed, PriceQuote};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Binance REST base URL
pub const BINANCE_API_URL: &str = "https://api.binance.com";

/// Maximum klines returned by a single request
pub const MAX_KLINES_PER_REQUEST: usize = 1000;

/// Configuration for the Binance client
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// Base URL for the REST API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Ticker price response
#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    price: String,
}

/// Raw kline row: Binance returns klines as positional arrays
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawKline(
    i64,    // open time (ms)
    String, // open
    String, // high
    String, // low
    String, // close
    String, // volume
    i64,    // close time (ms)
    String, // quote asset volume
    u64,    // number of trades
    String, // taker buy base volume
    String, // taker buy quote volume
    String, // ignore
);

/// Client for the Binance spot REST API
pub struct BinanceClient {
    config: BinanceConfig,
    client: Client,
}

impl BinanceClient {
    /// Create a client against the public Binance endpoint
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(BinanceConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: BinanceConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    /// Get the configured base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Fetch one page of klines
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        let url = format!("{}/api/v3/klines", self.config.base_url);

        let mut query: Vec<(&str, String)> = vec![
            ("symbol", symbol.to_uppercase()),
            ("interval", interval.to_string()),
            ("limit", limit.min(MAX_KLINES_PER_REQUEST).to_string()),
        ];
        if let Some(start) = start {
            query.push(("startTime", start.timestamp_millis().to_string()));
        }
        if let Some(end) = end {
            query.push(("endTime", end.timestamp_millis().to_string()));
        }

        tracing::debug!(url = %url, symbol, interval, limit, "Fetching klines");

        let response = self.client.get(&url).query(&query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance klines error: {} - {}", status, body);
        }

        let raw: Vec<RawKline> = response.json().await?;
        raw.into_iter().map(parse_kline).collect()
    }
}

/// Convert a positional kline row into a [`Candle`]
fn parse_kline(raw: RawKline) -> anyhow::Result<Candle> {
    let open_time = Utc
        .timestamp_millis_opt(raw.0)
        .single()
        .ok_or_else(|| anyhow::anyhow!("Invalid kline open time: {}", raw.0))?;
    let close_time = Utc
        .timestamp_millis_opt(raw.6)
        .single()
        .ok_or_else(|| anyhow::anyhow!("Invalid kline close time: {}", raw.6))?;

    Ok(Candle {
        open_time,
        open: parse_decimal(&raw.1, "open")?,
        high: parse_decimal(&raw.2, "high")?,
        low: parse_decimal(&raw.3, "low")?,
        close: parse_decimal(&raw.4, "close")?,
        volume: parse_decimal(&raw.5, "volume")?,
        close_time,
    })
}

fn parse_decimal(value: &str, field: &str) -> anyhow::Result<Decimal> {
    Decimal::from_str(value).with_context(|| format!("Invalid kline {}: {}", field, value))
}

#[async_trait]
impl PriceFeed for BinanceClient {
    async fn current_price(&self, symbol: &str) -> anyhow::Result<PriceQuote> {
        let url = format!("{}/api/v3/ticker/price", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol.to_uppercase())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance ticker error: {} - {}", status, body);
        }

        let ticker: TickerPrice = response.json().await?;
        let price = Decimal::from_str(&ticker.price)
            .with_context(|| format!("Invalid ticker price: {}", ticker.price))?;

        Ok(PriceQuote {
            symbol: ticker.symbol,
            price,
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
impl CandleSource for BinanceClient {
    async fn recent_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        self.fetch_klines(symbol, interval, None, None, limit).await
    }

    async fn historical_candles(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Candle>> {
        let mut candles = Vec::new();
        let mut cursor = start;

        while cursor < end {
            let batch = self
                .fetch_klines(symbol, interval, Some(cursor), Some(end), MAX_KLINES_PER_REQUEST)
                .await?;

            let Some(last) = batch.last() else {
                break;
            };
            let next = last.open_time + ChronoDuration::milliseconds(1);
            let exhausted = batch.len() < MAX_KLINES_PER_REQUEST;

            candles.extend(batch.into_iter().filter(|c| c.open_time < end));

            if exhausted || next <= cursor {
                break;
            }
            cursor = next;
        }

        tracing::info!(count = candles.len(), %start, %end, "Fetched historical candles");
        Ok(candles)
    }
}
