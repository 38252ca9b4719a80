use crate::constants::PROVIDER_TIMEOUT;
use crate::error::Error;
use crate::models::{Interval, Market, Ohlcv, Period};
use crate::providers::MarketDataProvider;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Ordered fallback list of upstream sources.
///
/// Providers are tried strictly in registration order. Error, empty series,
/// and timeout all advance to the next eligible provider; exhaustion yields
/// the distinguished [`Error::AllSourcesFailed`], never partial data dressed
/// up as success.
pub struct ProviderChain {
    providers: Vec<Box<dyn MarketDataProvider>>,
    provider_timeout: Duration,
}

impl ProviderChain {
    pub fn new(providers: Vec<Box<dyn MarketDataProvider>>) -> Self {
        Self {
            providers,
            provider_timeout: PROVIDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, provider_timeout: Duration) -> Self {
        self.provider_timeout = provider_timeout;
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub async fn fetch(
        &self,
        symbol: &str,
        market: Market,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<Ohlcv>, Error> {
        let mut attempts = 0usize;

        for provider in &self.providers {
            if !provider.supports(symbol, market, interval) {
                debug!(
                    provider = provider.name(),
                    symbol = symbol,
                    market = %market,
                    "Provider does not cover this symbol, skipping"
                );
                continue;
            }

            attempts += 1;
            let outcome =
                tokio::time::timeout(self.provider_timeout, provider.fetch(symbol, period, interval))
                    .await;

            match outcome {
                Err(_elapsed) => {
                    warn!(
                        provider = provider.name(),
                        symbol = symbol,
                        timeout_secs = self.provider_timeout.as_secs(),
                        "Provider call timed out, trying next source"
                    );
                }
                Ok(Err(e)) => {
                    warn!(
                        provider = provider.name(),
                        symbol = symbol,
                        error = %e,
                        transient = e.is_transient(),
                        "Provider call failed, trying next source"
                    );
                }
                Ok(Ok(records)) if records.is_empty() => {
                    warn!(
                        provider = provider.name(),
                        symbol = symbol,
                        "Provider returned an empty series, trying next source"
                    );
                }
                Ok(Ok(records)) => {
                    info!(
                        provider = provider.name(),
                        symbol = symbol,
                        records = records.len(),
                        attempts = attempts,
                        "Fetched series from upstream"
                    );
                    return Ok(records);
                }
            }
        }

        warn!(
            symbol = symbol,
            eligible_attempts = attempts,
            "All data sources exhausted"
        );
        Err(Error::AllSourcesFailed(symbol.to_string()))
    }
}
