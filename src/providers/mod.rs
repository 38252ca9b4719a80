mod binance;
mod chain;
mod cryptocompare;
mod stooq;

pub use binance::BinanceProvider;
pub use chain::ProviderChain;
pub use cryptocompare::CryptoCompareProvider;
pub use stooq::StooqProvider;

use crate::models::{Interval, Market, Ohlcv, Period};
use async_trait::async_trait;
use thiserror::Error as ThisError;

/// Upstream failure taxonomy. The chain advances on every variant; the
/// split matters for retry decisions inside an adapter (transient errors
/// are worth retrying against the same source, the rest are not).
#[derive(Debug, ThisError)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no data returned")]
    Empty,
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout | ProviderError::RateLimited | ProviderError::Network(_)
        )
    }
}

/// One upstream time-series source.
///
/// A provider "succeeds" only when it returns a non-empty series without
/// error; everything else advances the chain to the next source.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Compatibility predicate: whether this source can possibly answer a
    /// request for this symbol. The chain skips incompatible providers
    /// without counting a failed attempt.
    fn supports(&self, symbol: &str, market: Market, interval: Interval) -> bool;

    async fn fetch(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<Ohlcv>, ProviderError>;
}
