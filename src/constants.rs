//! Fixed configuration values and tuning knobs.
//!
//! Anything marked "env" can be overridden at runtime through the named
//! environment variable; everything else is a hard constant.

use std::time::Duration;

/// Cache artifact encoding version written into every current-format entry.
///
/// - v1: serde_json object file (`.json`, deprecated)
/// - v2: bincode file (`.bin`, current)
pub const CACHE_ENCODING_VERSION: u32 = 2;

/// Default freshness window for cached series reads (env: `CACHE_TTL_SECS`).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 900;

/// Default worker pool size for analysis runs (env: `POOL_SIZE`).
/// Fixed per run, never proportional to universe size.
pub const DEFAULT_POOL_SIZE: usize = 8;

/// Wall-clock budget for one symbol's fetch-score-persist pipeline
/// (env: `SYMBOL_TIMEOUT_SECS`). A task that exceeds it is recorded as
/// skipped, not as a run failure.
pub const DEFAULT_SYMBOL_TIMEOUT_SECS: u64 = 60;

/// Upper bound for a single provider call inside the fallback chain.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(20);

/// Composite-score thresholds, checked highest first. Boundaries are
/// inclusive on the lower bound of each band.
pub const SIGNAL_BUY_THRESHOLD: f64 = 65.0;
pub const SIGNAL_HOLD_STRONG_THRESHOLD: f64 = 55.0;
pub const SIGNAL_HOLD_THRESHOLD: f64 = 45.0;
pub const SIGNAL_HOLD_WEAK_THRESHOLD: f64 = 35.0;

/// Composite score assigned when every scoring module failed for a symbol.
/// The symbol is flagged low-confidence instead of being dropped.
pub const NEUTRAL_COMPOSITE_SCORE: f64 = 50.0;

/// Fixed weights for the built-in scoring modules. Aggregation always
/// normalizes over the modules that succeeded, so the sum here only has to
/// be positive, not exactly 1.0.
pub const WEIGHT_TREND: f64 = 0.30;
pub const WEIGHT_MOMENTUM: f64 = 0.25;
pub const WEIGHT_RANGE: f64 = 0.20;
pub const WEIGHT_VOLUME: f64 = 0.15;
pub const WEIGHT_VOLATILITY: f64 = 0.10;

/// Minimum records a series must carry before the scoring modules run.
pub const MIN_RECORDS_FOR_SCORING: usize = 30;

/// RSI lookback used by the momentum module.
pub const RSI_PERIOD: usize = 14;

/// SMA lookbacks used by the trend module.
pub const TREND_FAST_PERIOD: usize = 20;
pub const TREND_SLOW_PERIOD: usize = 50;

/// Lookback for the range-position module (52 trading weeks of dailies).
pub const RANGE_LOOKBACK: usize = 252;

/// Recent window compared against the full-series baseline by the volume
/// module.
pub const VOLUME_RECENT_WINDOW: usize = 10;
