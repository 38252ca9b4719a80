//! Binance klines adapter (https://api.binance.com).
//!
//! Tried first for crypto symbols: generous unauthenticated limits and the
//! freshest data. Symbols are quoted against USDT.

use crate::models::{Interval, Market, Ohlcv, Period};
use crate::providers::{MarketDataProvider, ProviderError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration as StdDuration;
use tracing::debug;

const BASE_URL: &str = "https://api.binance.com";

/// Klines endpoint caps one response at 1000 bars.
const MAX_BARS: i64 = 1000;

pub struct BinanceProvider {
    client: Client,
    base_url: String,
}

impl BinanceProvider {
    pub fn new() -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    fn kline_interval(interval: Interval) -> &'static str {
        match interval {
            Interval::Daily => "1d",
            Interval::Hourly => "1h",
            Interval::Minute => "1m",
        }
    }

    /// Bare symbols ("BTC") become USDT pairs; already-paired symbols pass
    /// through unchanged.
    fn pair_symbol(symbol: &str) -> String {
        let upper = symbol.to_uppercase();
        if upper.ends_with("USDT") || upper.ends_with("USDC") || upper.ends_with("BUSD") {
            upper
        } else {
            format!("{}USDT", upper)
        }
    }

    fn parse_kline_row(row: &Value) -> Result<Ohlcv, ProviderError> {
        let arr = row
            .as_array()
            .ok_or_else(|| ProviderError::Malformed("kline row is not an array".to_string()))?;
        if arr.len() < 6 {
            return Err(ProviderError::Malformed(format!(
                "kline row has {} fields, expected at least 6",
                arr.len()
            )));
        }

        let open_time_ms = arr[0]
            .as_i64()
            .ok_or_else(|| ProviderError::Malformed("kline open time is not an integer".to_string()))?;
        let time = DateTime::from_timestamp_millis(open_time_ms)
            .ok_or_else(|| ProviderError::Malformed(format!("kline open time out of range: {}", open_time_ms)))?;

        let price = |idx: usize, field: &str| -> Result<f64, ProviderError> {
            arr[idx]
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| ProviderError::Malformed(format!("invalid kline {}", field)))
        };

        Ok(Ohlcv::new(
            time,
            price(1, "open")?,
            price(2, "high")?,
            price(3, "low")?,
            price(4, "close")?,
            price(5, "volume")? as u64,
        ))
    }
}

#[async_trait]
impl MarketDataProvider for BinanceProvider {
    fn name(&self) -> &'static str {
        "binance"
    }

    fn supports(&self, symbol: &str, market: Market, _interval: Interval) -> bool {
        market == Market::Crypto && symbol.chars().all(|c| c.is_ascii_alphanumeric())
    }

    async fn fetch(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<Ohlcv>, ProviderError> {
        let start_time = (Utc::now() - chrono::Duration::days(period.approx_days()))
            .timestamp_millis();
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&startTime={}&limit={}",
            self.base_url,
            Self::pair_symbol(symbol),
            Self::kline_interval(interval),
            start_time,
            MAX_BARS,
        );
        debug!(symbol = symbol, url = %url, "Requesting Binance klines");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status == 429 || status == 418 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!("HTTP {}", status)));
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(Self::parse_kline_row(row)?);
        }
        records.sort_by_key(|r| r.time);

        Ok(records)
    }
}
