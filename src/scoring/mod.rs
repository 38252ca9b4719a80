mod aggregator;
pub mod indicators;
mod momentum;
mod range;
mod trend;
mod volatility;
mod volume;

pub use aggregator::SignalAggregator;
pub use momentum::MomentumModule;
pub use range::RangePositionModule;
pub use trend::TrendModule;
pub use volatility::VolatilityModule;
pub use volume::VolumeModule;

use crate::constants::{
    WEIGHT_MOMENTUM, WEIGHT_RANGE, WEIGHT_TREND, WEIGHT_VOLATILITY, WEIGHT_VOLUME,
};
use crate::error::Error;
use crate::models::{ModuleScore, Ohlcv};
use tracing::warn;

/// One independent scoring heuristic.
///
/// Modules are pure functions of their inputs: no shared mutable state, no
/// I/O. A score outside [0, 100] is clamped by the registry.
pub trait ScoringModule: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, symbol: &str, series: &[Ohlcv]) -> Result<f64, Error>;
}

struct RegisteredModule {
    weight: f64,
    module: Box<dyn ScoringModule>,
}

/// Explicit, ordered set of scoring modules with their fixed weights.
///
/// Built once at startup; nothing is discovered at runtime. Weights can be
/// tuned per deployment through `MODULE_WEIGHT_*` environment variables.
pub struct ScoringRegistry {
    modules: Vec<RegisteredModule>,
}

impl ScoringRegistry {
    pub fn empty() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// The built-in module set.
    pub fn standard() -> Self {
        Self::empty()
            .register(Box::new(TrendModule), weight_from_env("MODULE_WEIGHT_TREND", WEIGHT_TREND))
            .register(
                Box::new(MomentumModule),
                weight_from_env("MODULE_WEIGHT_MOMENTUM", WEIGHT_MOMENTUM),
            )
            .register(
                Box::new(RangePositionModule),
                weight_from_env("MODULE_WEIGHT_RANGE", WEIGHT_RANGE),
            )
            .register(Box::new(VolumeModule), weight_from_env("MODULE_WEIGHT_VOLUME", WEIGHT_VOLUME))
            .register(
                Box::new(VolatilityModule),
                weight_from_env("MODULE_WEIGHT_VOLATILITY", WEIGHT_VOLATILITY),
            )
    }

    pub fn register(mut self, module: Box<dyn ScoringModule>, weight: f64) -> Self {
        self.modules.push(RegisteredModule { weight, module });
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.module.name()).collect()
    }

    /// Invoke every registered module for one symbol. A failing module
    /// produces a [`ModuleScore::failed`] entry and never aborts the rest.
    pub fn score_all(&self, symbol: &str, series: &[Ohlcv]) -> Vec<ModuleScore> {
        self.modules
            .iter()
            .map(|entry| {
                let name = entry.module.name();
                match entry.module.score(symbol, series) {
                    Ok(score) => ModuleScore::succeeded(name, entry.weight, score.clamp(0.0, 100.0)),
                    Err(e) => {
                        warn!(symbol = symbol, module = name, error = %e, "Scoring module failed");
                        ModuleScore::failed(name, entry.weight, e.to_string())
                    }
                }
            })
            .collect()
    }
}

fn weight_from_env(var: &str, default: f64) -> f64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|w| (0.0..=1.0).contains(w))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn flat_series(n: usize) -> Vec<Ohlcv> {
        (0..n)
            .map(|i| {
                let time = Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap();
                Ohlcv::new(time, 100.0, 101.0, 99.0, 100.0, 10_000)
            })
            .collect()
    }

    struct FixedModule(&'static str, f64);

    impl ScoringModule for FixedModule {
        fn name(&self) -> &'static str {
            self.0
        }
        fn score(&self, _symbol: &str, _series: &[Ohlcv]) -> Result<f64, Error> {
            Ok(self.1)
        }
    }

    struct FailingModule;

    impl ScoringModule for FailingModule {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn score(&self, _symbol: &str, _series: &[Ohlcv]) -> Result<f64, Error> {
            Err(Error::Score("no data".to_string()))
        }
    }

    #[test]
    fn test_standard_registry_has_five_modules() {
        let registry = ScoringRegistry::standard();
        assert_eq!(registry.len(), 5);
        assert_eq!(
            registry.module_names(),
            vec!["trend", "momentum", "range", "volume", "volatility"]
        );
    }

    #[test]
    fn test_score_all_collects_successes_and_failures() {
        let registry = ScoringRegistry::empty()
            .register(Box::new(FixedModule("a", 80.0)), 0.5)
            .register(Box::new(FailingModule), 0.3)
            .register(Box::new(FixedModule("b", 140.0)), 0.2);

        let results = registry.score_all("TEST", &flat_series(10));
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].score, Some(80.0));
        assert!(results[1].score.is_none());
        assert!(results[1].error.is_some());
        // Out-of-range scores are clamped, not rejected.
        assert_eq!(results[2].score, Some(100.0));
    }
}
