use crate::constants::NEUTRAL_COMPOSITE_SCORE;
use crate::models::{CompositeResult, Market, ModuleScore, Signal};
use chrono::Utc;
use tracing::debug;

/// Combines module sub-scores into one composite score and signal.
///
/// Aggregation never errors: the weighted mean is taken over the modules
/// that succeeded, and a symbol where everything failed still yields a
/// neutral, low-confidence result instead of blocking the pipeline.
pub struct SignalAggregator;

impl SignalAggregator {
    pub fn aggregate(symbol: &str, market: Market, breakdown: Vec<ModuleScore>) -> CompositeResult {
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;

        for module in &breakdown {
            if let Some(score) = module.score {
                weighted_sum += score * module.weight;
                weight_total += module.weight;
            }
        }

        let (composite_score, low_confidence) = if weight_total > 0.0 {
            (weighted_sum / weight_total, false)
        } else {
            (NEUTRAL_COMPOSITE_SCORE, true)
        };

        let signal = Signal::from_score(composite_score);
        debug!(
            symbol = symbol,
            composite = composite_score,
            signal = %signal,
            modules_succeeded = breakdown.iter().filter(|m| m.score.is_some()).count(),
            modules_total = breakdown.len(),
            low_confidence = low_confidence,
            "Aggregated composite score"
        );

        CompositeResult {
            symbol: symbol.to_string(),
            market,
            composite_score,
            signal,
            low_confidence,
            breakdown,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(module: &str, weight: f64, score: f64) -> ModuleScore {
        ModuleScore::succeeded(module, weight, score)
    }

    fn failed(module: &str, weight: f64) -> ModuleScore {
        ModuleScore::failed(module, weight, "boom".to_string())
    }

    #[test]
    fn test_all_modules_succeeding_gives_exact_weighted_mean() {
        let breakdown = vec![
            ok("a", 0.30, 80.0),
            ok("b", 0.25, 60.0),
            ok("c", 0.20, 40.0),
            ok("d", 0.15, 90.0),
            ok("e", 0.10, 20.0),
        ];
        let result = SignalAggregator::aggregate("TEST", Market::Equity, breakdown);

        let expected = (80.0 * 0.30 + 60.0 * 0.25 + 40.0 * 0.20 + 90.0 * 0.15 + 20.0 * 0.10)
            / (0.30 + 0.25 + 0.20 + 0.15 + 0.10);
        assert!((result.composite_score - expected).abs() < 1e-9);
        assert!(!result.low_confidence);
    }

    #[test]
    fn test_failed_modules_are_excluded_from_the_denominator() {
        // 2 of 5 modules fail; the mean is over the succeeding subset only.
        let breakdown = vec![
            ok("a", 0.30, 80.0),
            failed("b", 0.25),
            ok("c", 0.20, 40.0),
            failed("d", 0.15),
            ok("e", 0.10, 20.0),
        ];
        let result = SignalAggregator::aggregate("TEST", Market::Crypto, breakdown);

        let expected = (80.0 * 0.30 + 40.0 * 0.20 + 20.0 * 0.10) / (0.30 + 0.20 + 0.10);
        assert!((result.composite_score - expected).abs() < 1e-9);
        assert!(!result.low_confidence);
        assert_eq!(result.breakdown.len(), 5);
    }

    #[test]
    fn test_total_failure_yields_neutral_low_confidence_result() {
        let breakdown = vec![failed("a", 0.5), failed("b", 0.5)];
        let result = SignalAggregator::aggregate("TEST", Market::Futures, breakdown);

        assert_eq!(result.composite_score, NEUTRAL_COMPOSITE_SCORE);
        assert!(result.low_confidence);
        assert_eq!(result.signal, Signal::Hold);
    }

    #[test]
    fn test_signal_follows_threshold_ladder() {
        for (score, signal) in [
            (65.0, Signal::Buy),
            (55.0, Signal::HoldStrong),
            (45.0, Signal::Hold),
            (35.0, Signal::HoldWeak),
            (34.999, Signal::Sell),
        ] {
            let result =
                SignalAggregator::aggregate("TEST", Market::Equity, vec![ok("only", 1.0, score)]);
            assert_eq!(result.signal, signal, "score {}", score);
        }
    }
}
