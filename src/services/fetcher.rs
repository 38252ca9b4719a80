use crate::cache::{CacheKey, CacheStore, CachedSeries};
use crate::error::Error;
use crate::models::{Interval, Market, Ohlcv, Period};
use crate::providers::ProviderChain;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One fetch call's parameters. Transient: created per call, never stored.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub symbol: String,
    pub market: Market,
    pub period: Period,
    pub interval: Interval,
    /// Staleness tolerance for this read; the cached artifact itself
    /// carries no TTL.
    pub ttl: Duration,
}

/// Cache-first fetch with ordered provider fallback.
///
/// Both collaborators are injected at construction, so tests can run the
/// whole path against a temp-dir cache and scripted providers.
pub struct ResilientFetcher {
    cache: Arc<CacheStore>,
    chain: Arc<ProviderChain>,
}

impl ResilientFetcher {
    pub fn new(cache: Arc<CacheStore>, chain: Arc<ProviderChain>) -> Self {
        Self { cache, chain }
    }

    /// Resolve a series: fresh cache entry if one exists, otherwise the
    /// provider chain, writing back on success. Chain exhaustion surfaces
    /// as [`Error::AllSourcesFailed`]; callers skip the symbol rather than
    /// treating that as fatal.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Ohlcv>, Error> {
        let key = CacheKey::new(&request.symbol, request.period, request.interval);

        if let Some(entry) = self.cache.get_fresh(&key, request.ttl).await {
            debug!(
                symbol = %request.symbol,
                records = entry.records.len(),
                "Serving fetch from cache"
            );
            return Ok(entry.records);
        }

        let records = self
            .chain
            .fetch(&request.symbol, request.market, request.period, request.interval)
            .await?;

        // Best-effort write-back: a failed cache write degrades the next
        // fetch, not this one.
        let entry = CachedSeries::new(&request.symbol, records.clone());
        if let Err(e) = self.cache.put(&key, &entry).await {
            warn!(symbol = %request.symbol, error = %e, "Cache write failed after fetch");
        }

        Ok(records)
    }
}
