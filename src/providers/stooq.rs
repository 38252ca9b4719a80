//! Stooq daily-history adapter (https://stooq.com).
//!
//! Serves equities and futures as CSV downloads. Daily bars only; the
//! compatibility predicate keeps intraday requests away from this source.

use crate::models::{Interval, Market, Ohlcv, Period};
use crate::providers::{MarketDataProvider, ProviderError};
use crate::utils::parse_timestamp;
use async_trait::async_trait;
use chrono::Utc;
use isahc::{config::Configurable, prelude::*, HttpClient};
use std::time::Duration as StdDuration;
use tracing::debug;

const BASE_URL: &str = "https://stooq.com";

pub struct StooqProvider {
    client: HttpClient,
    base_url: String,
}

impl StooqProvider {
    pub fn new() -> Result<Self, ProviderError> {
        let client = HttpClient::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Stooq ticker form: bare symbols get the ".us" suffix; symbols that
    /// already carry a venue suffix (futures use ".f") pass through.
    fn stooq_symbol(symbol: &str) -> String {
        let lower = symbol.to_lowercase();
        if lower.contains('.') {
            lower
        } else {
            format!("{}.us", lower)
        }
    }

    fn parse_csv_body(body: &str, period: Period) -> Result<Vec<Ohlcv>, ProviderError> {
        let cutoff = Utc::now() - chrono::Duration::days(period.approx_days());
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(body.as_bytes());

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| ProviderError::Malformed(e.to_string()))?;
            if record.len() < 5 {
                continue;
            }

            let time = match record.get(0).map(parse_timestamp) {
                Some(Ok(time)) => time,
                _ => continue,
            };
            if time < cutoff {
                continue;
            }

            let field = |idx: usize, name: &str| -> Result<f64, ProviderError> {
                record
                    .get(idx)
                    .and_then(|s| s.parse::<f64>().ok())
                    .ok_or_else(|| ProviderError::Malformed(format!("invalid {} field", name)))
            };

            // Indices and some futures publish no volume column.
            let volume = record
                .get(5)
                .and_then(|s| s.parse::<f64>().ok())
                .unwrap_or(0.0);

            records.push(Ohlcv::new(
                time,
                field(1, "open")?,
                field(2, "high")?,
                field(3, "low")?,
                field(4, "close")?,
                volume as u64,
            ));
        }

        records.sort_by_key(|r| r.time);
        Ok(records)
    }
}

#[async_trait]
impl MarketDataProvider for StooqProvider {
    fn name(&self) -> &'static str {
        "stooq"
    }

    fn supports(&self, _symbol: &str, market: Market, interval: Interval) -> bool {
        matches!(market, Market::Equity | Market::Futures) && interval == Interval::Daily
    }

    async fn fetch(
        &self,
        symbol: &str,
        period: Period,
        _interval: Interval,
    ) -> Result<Vec<Ohlcv>, ProviderError> {
        let url = format!(
            "{}/q/d/l/?s={}&i=d",
            self.base_url,
            Self::stooq_symbol(symbol),
        );
        debug!(symbol = symbol, url = %url, "Requesting Stooq history");

        let mut response = self
            .client
            .get_async(url.as_str())
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Network(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        // Stooq answers unknown symbols with a 200 and a stub body.
        if body.trim().is_empty() || body.starts_with("No data") {
            return Err(ProviderError::Empty);
        }

        Self::parse_csv_body(&body, period)
    }
}
