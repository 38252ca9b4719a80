//! CryptoCompare API adapter (https://min-api.cryptocompare.com).
//!
//! Free-tier friendly: sliding-window rate limiting plus exponential
//! backoff on transient failures. Covers crypto symbols only.

use crate::models::{Interval, Market, Ohlcv, Period};
use crate::providers::{MarketDataProvider, ProviderError};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration as StdDuration, SystemTime};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

const BASE_URL: &str = "https://min-api.cryptocompare.com";

/// Free tier allows 5 calls/second.
const RATE_LIMIT_PER_SECOND: u32 = 5;

/// Retries for one logical request before giving up on this source.
const MAX_RETRIES: u32 = 3;

/// Histo endpoints cap `limit` at 2000 bars per call.
const MAX_BARS: i64 = 2000;

#[derive(Debug, Deserialize)]
struct HistoResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Data", default)]
    data: Option<HistoData>,
}

#[derive(Debug, Deserialize)]
struct HistoData {
    #[serde(rename = "Data", default)]
    data: Vec<HistoCandle>,
}

#[derive(Debug, Deserialize)]
struct HistoCandle {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(rename = "volumefrom")]
    volume_from: f64,
}

pub struct CryptoCompareProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    request_timestamps: Mutex<Vec<SystemTime>>,
}

impl CryptoCompareProvider {
    pub fn new(api_key: Option<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            api_key,
            request_timestamps: Mutex::new(Vec::new()),
        })
    }

    fn endpoint_path(interval: Interval) -> &'static str {
        match interval {
            Interval::Daily => "/data/v2/histoday",
            Interval::Hourly => "/data/v2/histohour",
            Interval::Minute => "/data/v2/histominute",
        }
    }

    /// Bars to request for a lookback window at a given interval.
    fn bar_limit(period: Period, interval: Interval) -> i64 {
        let bars = match interval {
            Interval::Daily => period.approx_days(),
            Interval::Hourly => period.approx_days() * 24,
            Interval::Minute => period.approx_days() * 24 * 60,
        };
        bars.min(MAX_BARS)
    }

    /// Sliding-window limiter shared across concurrent worker tasks.
    async fn enforce_rate_limit(&self) {
        let current_time = SystemTime::now();
        let mut timestamps = self.request_timestamps.lock().await;

        timestamps.retain(|&timestamp| {
            current_time
                .duration_since(timestamp)
                .unwrap_or(StdDuration::from_secs(0))
                < StdDuration::from_secs(1)
        });

        if timestamps.len() >= RATE_LIMIT_PER_SECOND as usize {
            if let Some(&oldest) = timestamps.first() {
                let elapsed = current_time
                    .duration_since(oldest)
                    .unwrap_or(StdDuration::from_secs(0));
                if elapsed < StdDuration::from_secs(1) {
                    let wait = StdDuration::from_secs(1) - elapsed + StdDuration::from_millis(50);
                    debug!("CryptoCompare rate limit reached, waiting {:?}", wait);
                    drop(timestamps);
                    sleep(wait).await;
                    let mut timestamps = self.request_timestamps.lock().await;
                    timestamps.push(current_time);
                    return;
                }
            }
        }

        timestamps.push(current_time);
    }

    async fn request_histo(&self, url: &str) -> Result<Vec<HistoCandle>, ProviderError> {
        let mut last_error = ProviderError::Empty;

        for attempt in 0..MAX_RETRIES {
            self.enforce_rate_limit().await;

            if attempt > 0 {
                let delay = StdDuration::from_secs_f64(
                    2.0_f64.powi(attempt as i32 - 1) + rand::random::<f64>(),
                );
                debug!(
                    "CryptoCompare retry backoff: attempt {}/{}, waiting {:.1}s",
                    attempt + 1,
                    MAX_RETRIES,
                    delay.as_secs_f64()
                );
                sleep(delay).await;
            }

            let mut request = self.client.get(url);
            if let Some(ref api_key) = self.api_key {
                request = request.header("Authorization", format!("Apikey {}", api_key));
            }

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("CryptoCompare request failed (attempt {}): {}", attempt + 1, e);
                    last_error = if e.is_timeout() {
                        ProviderError::Timeout
                    } else {
                        ProviderError::Network(e.to_string())
                    };
                    continue;
                }
            };

            let status = response.status();
            if status == 429 {
                // Rate limited at the HTTP layer is terminal for this
                // source; the chain moves on rather than hammering it.
                return Err(ProviderError::RateLimited);
            }
            if status.is_server_error() {
                warn!("CryptoCompare server error ({}), retrying", status);
                last_error = ProviderError::Network(format!("HTTP {}", status));
                continue;
            }
            if !status.is_success() {
                return Err(ProviderError::Network(format!("HTTP {}", status)));
            }

            let body = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    last_error = ProviderError::Network(e.to_string());
                    continue;
                }
            };

            let parsed: HistoResponse = match serde_json::from_str(&body) {
                Ok(parsed) => parsed,
                Err(e) => return Err(ProviderError::Malformed(e.to_string())),
            };

            if parsed.response != "Success" {
                if parsed.message.contains("rate limit") {
                    return Err(ProviderError::RateLimited);
                }
                return Err(ProviderError::Malformed(parsed.message));
            }

            return Ok(parsed.data.map(|d| d.data).unwrap_or_default());
        }

        Err(last_error)
    }
}

#[async_trait]
impl MarketDataProvider for CryptoCompareProvider {
    fn name(&self) -> &'static str {
        "cryptocompare"
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
        let url = format!(
            "{}{}?fsym={}&tsym=USD&limit={}",
            self.base_url,
            Self::endpoint_path(interval),
            symbol.to_uppercase(),
            Self::bar_limit(period, interval),
        );

        let candles = self.request_histo(&url).await?;

        let mut records: Vec<Ohlcv> = candles
            .into_iter()
            .filter_map(|c| {
                let time = DateTime::from_timestamp(c.time, 0)?;
                // Zero-price rows pad the start of histo responses for
                // symbols younger than the requested window.
                if c.open == 0.0 && c.close == 0.0 {
                    return None;
                }
                Some(Ohlcv::new(time, c.open, c.high, c.low, c.close, c.volume_from as u64))
            })
            .collect();
        records.sort_by_key(|r| r.time);

        Ok(records)
    }
}
