use crate::cache::CacheStore;
use crate::constants::{DEFAULT_CACHE_TTL_SECS, DEFAULT_POOL_SIZE, DEFAULT_SYMBOL_TIMEOUT_SECS};
use crate::models::{Interval, Period};
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::providers::{
    BinanceProvider, CryptoCompareProvider, MarketDataProvider, ProviderChain, StooqProvider,
};
use crate::scoring::ScoringRegistry;
use crate::services::{ResilientFetcher, ResultStore};
use crate::utils::{get_cache_dir, get_results_db_path, get_universe_path};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn env_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

pub async fn run(
    universe: Option<PathBuf>,
    period_arg: String,
    interval_arg: String,
    pool_size: Option<usize>,
    timeout_secs: Option<u64>,
    ttl_secs: Option<u64>,
) {
    let period = match Period::parse(&period_arg) {
        Ok(period) => period,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    let interval = match Interval::parse(&interval_arg) {
        Ok(interval) => interval,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let universe_path = universe.unwrap_or_else(get_universe_path);
    let config = OrchestratorConfig {
        pool_size: pool_size.unwrap_or_else(|| env_or("POOL_SIZE", DEFAULT_POOL_SIZE)),
        symbol_timeout: Duration::from_secs(
            timeout_secs.unwrap_or_else(|| env_or("SYMBOL_TIMEOUT_SECS", DEFAULT_SYMBOL_TIMEOUT_SECS)),
        ),
        cache_ttl: Duration::from_secs(
            ttl_secs.unwrap_or_else(|| env_or("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)),
        ),
        period,
        interval,
    };

    println!("🚀 Starting analysis run");
    println!("   📋 Universe:  {}", universe_path.display());
    println!("   📅 Period:    {} @ {}", period, interval);
    println!("   👷 Pool size: {}", config.pool_size);

    let cache_dir = get_cache_dir();
    println!("   📁 Cache dir: {}", cache_dir.display());
    let cache = Arc::new(CacheStore::new(cache_dir));

    let mut providers: Vec<Box<dyn MarketDataProvider>> = Vec::new();
    match BinanceProvider::new() {
        Ok(provider) => providers.push(Box::new(provider)),
        Err(e) => eprintln!("⚠️  Binance provider unavailable: {}", e),
    }
    match CryptoCompareProvider::new(std::env::var("CRYPTOCOMPARE_API_KEY").ok()) {
        Ok(provider) => providers.push(Box::new(provider)),
        Err(e) => eprintln!("⚠️  CryptoCompare provider unavailable: {}", e),
    }
    match StooqProvider::new() {
        Ok(provider) => providers.push(Box::new(provider)),
        Err(e) => eprintln!("⚠️  Stooq provider unavailable: {}", e),
    }
    if providers.is_empty() {
        eprintln!("❌ No upstream providers could be constructed");
        std::process::exit(1);
    }
    println!("   🔗 Providers: {}", providers.len());

    let fetcher = Arc::new(ResilientFetcher::new(cache, Arc::new(ProviderChain::new(providers))));
    let registry = Arc::new(ScoringRegistry::standard());
    println!("   🧮 Modules:   {}", registry.module_names().join(", "));

    let results = match ResultStore::new(get_results_db_path()).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("❌ Failed to open result store: {}", e);
            std::process::exit(1);
        }
    };

    let orchestrator = Orchestrator::new(fetcher, registry, results, config);
    let run = orchestrator.new_run();
    println!("   🆔 Run id:    {}\n", run.run_id());

    // Operator abort: first Ctrl-C cancels the run; in-flight symbols are
    // skipped at their next suspension point.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n🛑 Cancellation requested, winding down...");
            let _ = cancel_tx.send(true);
        }
    });

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
            .expect("progress template is valid")
            .progress_chars("#>-"),
    );

    let progress = run.progress();
    let reporter = {
        let pb = pb.clone();
        tokio::spawn(async move {
            loop {
                let snap = progress.snapshot();
                if snap.total > 0 {
                    pb.set_length(snap.total as u64);
                    pb.set_position(snap.completed as u64);
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        })
    };

    let outcome = orchestrator.execute(&run, &universe_path, cancel_rx).await;
    reporter.abort();
    pb.finish_and_clear();

    match outcome {
        Ok(summary) => {
            println!("✅ Run {} completed in {:.1}s", summary.run_id, summary.elapsed.as_secs_f64());
            println!("   📈 Scored:  {}/{}", summary.scored, summary.symbol_count);
            println!("   ⏭️  Skipped: {}/{}", summary.skipped, summary.symbol_count);
            if summary.skipped > 0 {
                println!("   💡 Skipped symbols are logged above; they do not fail the run");
            }
        }
        Err(e) => {
            eprintln!("❌ Run failed: {}", e);
            std::process::exit(1);
        }
    }
}
