use crate::constants::RSI_PERIOD;
use crate::error::Error;
use crate::models::Ohlcv;
use crate::scoring::indicators::calculate_rsi;
use crate::scoring::ScoringModule;

/// RSI momentum score. The indicator is already on the [0, 100] scale, so
/// it maps directly.
pub struct MomentumModule;

impl ScoringModule for MomentumModule {
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn score(&self, _symbol: &str, series: &[Ohlcv]) -> Result<f64, Error> {
        let closes: Vec<f64> = series.iter().map(|r| r.close).collect();
        calculate_rsi(&closes, RSI_PERIOD).ok_or_else(|| {
            Error::Score(format!(
                "momentum needs {} records, got {}",
                RSI_PERIOD + 1,
                series.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn series_from_closes(closes: &[f64]) -> Vec<Ohlcv> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let time = Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap();
                Ohlcv::new(time, close, close, close, close, 1_000)
            })
            .collect()
    }

    #[test]
    fn test_steady_gains_score_high() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let score = MomentumModule.score("UP", &series_from_closes(&closes)).unwrap();
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_steady_losses_score_low() {
        let closes: Vec<f64> = (0..30).map(|i| 130.0 - i as f64).collect();
        let score = MomentumModule.score("DOWN", &series_from_closes(&closes)).unwrap();
        assert!(score < 10.0, "score = {}", score);
    }

    #[test]
    fn test_insufficient_records_error() {
        let closes = vec![100.0; 5];
        assert!(MomentumModule.score("SHORT", &series_from_closes(&closes)).is_err());
    }
}
