mod progress;

pub use progress::{ProgressSnapshot, RunProgress, RunStatus, RunSummary};

use crate::constants::{DEFAULT_CACHE_TTL_SECS, DEFAULT_POOL_SIZE, DEFAULT_SYMBOL_TIMEOUT_SECS};
use crate::error::Error;
use crate::models::{Interval, Period};
use crate::scoring::{ScoringRegistry, SignalAggregator};
use crate::services::{load_universe, FetchRequest, ResilientFetcher, ResultStore, UniverseEntry};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};

/// One execution of the orchestrator over a symbol universe.
///
/// Owned exclusively by the orchestrator; outside observers hold the
/// cloneable progress handle and poll snapshots.
pub struct AnalysisRun {
    run_id: String,
    started_at: DateTime<Utc>,
    progress: Arc<RunProgress>,
    status: RwLock<RunStatus>,
}

impl AnalysisRun {
    fn new() -> Self {
        let run_id = format!(
            "{}-{:04x}",
            Utc::now().format("%Y%m%dT%H%M%SZ"),
            rand::thread_rng().gen::<u16>()
        );
        Self {
            run_id,
            started_at: Utc::now(),
            progress: Arc::new(RunProgress::new()),
            status: RwLock::new(RunStatus::Idle),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn progress(&self) -> Arc<RunProgress> {
        self.progress.clone()
    }

    pub fn status(&self) -> RunStatus {
        *self.status.read().expect("status lock poisoned")
    }

    fn set_status(&self, status: RunStatus) {
        *self.status.write().expect("status lock poisoned") = status;
    }
}

/// Fixed per-run settings. Pool size and timeouts are configuration, never
/// derived from universe size.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub pool_size: usize,
    pub symbol_timeout: Duration,
    pub cache_ttl: Duration,
    pub period: Period,
    pub interval: Interval,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            symbol_timeout: Duration::from_secs(DEFAULT_SYMBOL_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            period: Period::OneYear,
            interval: Interval::Daily,
        }
    }
}

/// Fans a symbol universe across a bounded worker pool. Each worker runs
/// fetch, score, aggregate, persist for one symbol, then bumps the shared
/// counters. Individual symbol failures and timeouts become skips; only a
/// universe that cannot be resolved fails the run.
pub struct Orchestrator {
    fetcher: Arc<ResilientFetcher>,
    registry: Arc<ScoringRegistry>,
    results: Arc<ResultStore>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<ResilientFetcher>,
        registry: Arc<ScoringRegistry>,
        results: Arc<ResultStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            fetcher,
            registry,
            results,
            config,
        }
    }

    /// Create the run state. Grab the progress handle before calling
    /// [`Orchestrator::execute`] if a concurrent reader wants live counts.
    pub fn new_run(&self) -> AnalysisRun {
        AnalysisRun::new()
    }

    /// Resolve the universe and run the whole pipeline. Returns the final
    /// accounting, or an error iff the universe itself could not be
    /// resolved (the only path to a Failed run).
    pub async fn execute(
        &self,
        run: &AnalysisRun,
        universe_path: &Path,
        cancel: watch::Receiver<bool>,
    ) -> Result<RunSummary, Error> {
        let universe = match load_universe(universe_path) {
            Ok(universe) => universe,
            Err(e) => {
                run.set_status(RunStatus::Failed);
                error!(run_id = run.run_id(), error = %e, "Run failed: could not resolve symbol universe");
                return Err(e);
            }
        };

        run.progress.set_total(universe.len());
        run.set_status(RunStatus::Running);
        info!(
            run_id = run.run_id(),
            symbols = universe.len(),
            pool_size = self.config.pool_size,
            period = %self.config.period,
            interval = %self.config.interval,
            "Analysis run started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.pool_size.max(1)));
        let mut tasks = Vec::with_capacity(universe.len());

        for entry in universe {
            let semaphore = semaphore.clone();
            let fetcher = self.fetcher.clone();
            let registry = self.registry.clone();
            let results = self.results.clone();
            let progress = run.progress.clone();
            let cancel = cancel.clone();
            let run_id = run.run_id.clone();
            let config = self.config.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");

                if *cancel.borrow() {
                    progress.record_skipped();
                    debug!(symbol = %entry.symbol, "Skipping symbol: run cancelled before start");
                    return;
                }

                let symbol = entry.symbol.clone();
                let pipeline =
                    Self::analyze_symbol(fetcher, registry, results, run_id, entry, &config);

                tokio::select! {
                    _ = wait_for_cancel(cancel) => {
                        progress.record_skipped();
                        debug!(symbol = %symbol, "Skipping symbol: run cancelled mid-flight");
                    }
                    outcome = tokio::time::timeout(config.symbol_timeout, pipeline) => {
                        match outcome {
                            Err(_elapsed) => {
                                progress.record_skipped();
                                warn!(
                                    symbol = %symbol,
                                    timeout_secs = config.symbol_timeout.as_secs_f64(),
                                    "Symbol timed out, recorded as skipped"
                                );
                            }
                            Ok(Err(e)) => {
                                progress.record_skipped();
                                warn!(symbol = %symbol, error = %e, "Symbol skipped");
                            }
                            Ok(Ok(())) => {
                                progress.record_scored();
                            }
                        }
                    }
                }
            }));
        }

        for outcome in futures::future::join_all(tasks).await {
            if outcome.is_err() {
                // A panicked worker still lands in the skip bucket so the
                // final accounting covers every symbol.
                run.progress.record_skipped();
            }
        }

        run.set_status(RunStatus::Completed);
        let snapshot = run.progress.snapshot();
        info!(
            run_id = run.run_id(),
            scored = snapshot.scored,
            skipped = snapshot.skipped,
            elapsed_secs = snapshot.elapsed.as_secs_f64(),
            "Analysis run completed"
        );

        Ok(RunSummary {
            run_id: run.run_id.clone(),
            status: RunStatus::Completed,
            symbol_count: snapshot.total,
            scored: snapshot.scored,
            skipped: snapshot.skipped,
            elapsed: snapshot.elapsed,
        })
    }

    /// One symbol's pipeline: fetch, score, aggregate, persist.
    async fn analyze_symbol(
        fetcher: Arc<ResilientFetcher>,
        registry: Arc<ScoringRegistry>,
        results: Arc<ResultStore>,
        run_id: String,
        entry: UniverseEntry,
        config: &OrchestratorConfig,
    ) -> Result<(), Error> {
        let request = FetchRequest {
            symbol: entry.symbol.clone(),
            market: entry.market,
            period: config.period,
            interval: config.interval,
            ttl: config.cache_ttl,
        };

        let series = fetcher.fetch(&request).await?;
        let breakdown = registry.score_all(&entry.symbol, &series);
        let result = SignalAggregator::aggregate(&entry.symbol, entry.market, breakdown);
        results.insert(&run_id, &result).await?;

        debug!(
            symbol = %result.symbol,
            composite = result.composite_score,
            signal = %result.signal,
            "Symbol scored and persisted"
        );
        Ok(())
    }
}

/// Resolves only when cancellation is actually signalled. A dropped sender
/// means cancellation can never arrive, not that it did.
async fn wait_for_cancel(mut cancel: watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::models::{Market, Ohlcv};
    use crate::providers::{MarketDataProvider, ProviderChain, ProviderError};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use tempfile::TempDir;

    /// Behavior keyed on symbol prefix: SLOW hangs, BAD errors, everything
    /// else returns a scoreable series.
    struct PrefixProvider;

    #[async_trait]
    impl MarketDataProvider for PrefixProvider {
        fn name(&self) -> &'static str {
            "prefix"
        }

        fn supports(&self, _symbol: &str, _market: Market, _interval: Interval) -> bool {
            true
        }

        async fn fetch(
            &self,
            symbol: &str,
            _period: Period,
            _interval: Interval,
        ) -> Result<Vec<Ohlcv>, ProviderError> {
            if symbol.starts_with("SLOW") {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if symbol.starts_with("BAD") {
                return Err(ProviderError::Network("scripted failure".into()));
            }
            Ok((0..60)
                .map(|i| {
                    let time = Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap();
                    let close = 100.0 + (i as f64) * 0.5;
                    Ohlcv::new(time, close - 0.2, close + 1.0, close - 1.0, close, 10_000 + i as u64)
                })
                .collect())
        }
    }

    struct Harness {
        orchestrator: Orchestrator,
        results: Arc<ResultStore>,
        universe_path: std::path::PathBuf,
        _tmp: TempDir,
    }

    async fn harness(symbols: &[(&str, &str)], config: OrchestratorConfig) -> Harness {
        let tmp = TempDir::new().unwrap();

        let entries: Vec<serde_json::Value> = symbols
            .iter()
            .map(|(symbol, market)| serde_json::json!({"symbol": symbol, "market": market}))
            .collect();
        let universe_path = tmp.path().join("universe.json");
        std::fs::write(&universe_path, serde_json::to_vec(&entries).unwrap()).unwrap();

        let cache = Arc::new(CacheStore::new(tmp.path().join("cache")));
        let chain = Arc::new(ProviderChain::new(vec![Box::new(PrefixProvider)]));
        let fetcher = Arc::new(ResilientFetcher::new(cache, chain));
        let registry = Arc::new(ScoringRegistry::standard());
        let results = Arc::new(ResultStore::new(tmp.path().join("results.db")).await.unwrap());

        Harness {
            orchestrator: Orchestrator::new(fetcher, registry.clone(), results.clone(), config),
            results,
            universe_path,
            _tmp: tmp,
        }
    }

    fn fast_config() -> OrchestratorConfig {
        OrchestratorConfig {
            pool_size: 4,
            symbol_timeout: Duration::from_millis(300),
            cache_ttl: Duration::from_secs(3600),
            ..OrchestratorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_accounts_for_every_symbol_with_timeouts() {
        let harness = harness(
            &[
                ("AAA", "crypto"),
                ("BBB", "crypto"),
                ("CCC", "equity"),
                ("DDD", "equity"),
                ("SLOW1", "crypto"),
                ("SLOW2", "equity"),
            ],
            fast_config(),
        )
        .await;

        let run = harness.orchestrator.new_run();
        let (_tx, rx) = watch::channel(false);
        let summary = harness
            .orchestrator
            .execute(&run, &harness.universe_path, rx)
            .await
            .unwrap();

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.symbol_count, 6);
        assert_eq!(summary.scored, 4);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.scored + summary.skipped, summary.symbol_count);
        assert_eq!(run.status(), RunStatus::Completed);

        // Only scored symbols persist; timed-out ones leave no row.
        assert_eq!(harness.results.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_fetch_exhaustion_is_a_skip_not_a_failure() {
        let harness = harness(&[("AAA", "crypto"), ("BAD1", "crypto")], fast_config()).await;

        let run = harness.orchestrator.new_run();
        let (_tx, rx) = watch::channel(false);
        let summary = harness
            .orchestrator
            .execute(&run, &harness.universe_path, rx)
            .await
            .unwrap();

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.scored, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(harness.results.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_universe_fails_the_run() {
        let harness = harness(&[("AAA", "crypto")], fast_config()).await;

        let run = harness.orchestrator.new_run();
        let (_tx, rx) = watch::channel(false);
        let err = harness
            .orchestrator
            .execute(&run, &harness._tmp.path().join("missing.json"), rx)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert_eq!(run.status(), RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_cancellation_skips_outstanding_symbols_without_persisting() {
        let config = OrchestratorConfig {
            pool_size: 2,
            symbol_timeout: Duration::from_secs(60),
            cache_ttl: Duration::from_secs(3600),
            ..OrchestratorConfig::default()
        };
        let harness = harness(
            &[
                ("SLOW1", "crypto"),
                ("SLOW2", "crypto"),
                ("SLOW3", "equity"),
                ("SLOW4", "equity"),
            ],
            config,
        )
        .await;

        let run = harness.orchestrator.new_run();
        let (tx, rx) = watch::channel(false);

        let (summary, _) = tokio::join!(
            harness.orchestrator.execute(&run, &harness.universe_path, rx),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                tx.send(true).expect("run still listening");
            }
        );
        let summary = summary.unwrap();

        assert_eq!(summary.scored, 0);
        assert_eq!(summary.skipped, 4);
        assert_eq!(harness.results.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_progress_is_readable_while_running() {
        let harness = harness(
            &[("AAA", "crypto"), ("BBB", "crypto"), ("CCC", "equity")],
            OrchestratorConfig {
                pool_size: 1,
                ..fast_config()
            },
        )
        .await;

        let run = harness.orchestrator.new_run();
        let progress = run.progress();
        let (_tx, rx) = watch::channel(false);

        let observer = async {
            let mut seen = Vec::new();
            loop {
                let snap = progress.snapshot();
                seen.push(snap.completed);
                if snap.total == 3 && snap.completed == 3 {
                    return seen;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };

        let (summary, seen) = tokio::join!(
            harness.orchestrator.execute(&run, &harness.universe_path, rx),
            observer
        );

        assert_eq!(summary.unwrap().scored, 3);
        // Counts only ever move forward.
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }
}
