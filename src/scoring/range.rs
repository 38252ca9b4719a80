use crate::constants::{MIN_RECORDS_FOR_SCORING, RANGE_LOOKBACK};
use crate::error::Error;
use crate::models::Ohlcv;
use crate::scoring::ScoringModule;

/// Position of the last close within the lookback high/low band, as a
/// percentage: at the lows scores 0, at the highs scores 100.
pub struct RangePositionModule;

impl ScoringModule for RangePositionModule {
    fn name(&self) -> &'static str {
        "range"
    }

    fn score(&self, _symbol: &str, series: &[Ohlcv]) -> Result<f64, Error> {
        if series.len() < MIN_RECORDS_FOR_SCORING {
            return Err(Error::Score(format!(
                "range needs {} records, got {}",
                MIN_RECORDS_FOR_SCORING,
                series.len()
            )));
        }

        let window_start = series.len().saturating_sub(RANGE_LOOKBACK);
        let window = &series[window_start..];

        let high = window.iter().map(|r| r.high).fold(f64::MIN, f64::max);
        let low = window.iter().map(|r| r.low).fold(f64::MAX, f64::min);
        let close = series.last().expect("length checked above").close;

        if high <= low {
            return Ok(50.0);
        }

        Ok(((close - low) / (high - low) * 100.0).clamp(0.0, 100.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn series(highs_lows_closes: &[(f64, f64, f64)]) -> Vec<Ohlcv> {
        highs_lows_closes
            .iter()
            .enumerate()
            .map(|(i, &(high, low, close))| {
                let time = Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap();
                Ohlcv::new(time, close, high, low, close, 1_000)
            })
            .collect()
    }

    #[test]
    fn test_close_at_the_highs() {
        let mut bars = vec![(110.0, 90.0, 100.0); 40];
        bars.push((110.0, 90.0, 110.0));
        let score = RangePositionModule.score("X", &series(&bars)).unwrap();
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_close_at_the_lows() {
        let mut bars = vec![(110.0, 90.0, 100.0); 40];
        bars.push((110.0, 90.0, 90.0));
        let score = RangePositionModule.score("X", &series(&bars)).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_midpoint_close() {
        let mut bars = vec![(110.0, 90.0, 100.0); 40];
        bars.push((110.0, 90.0, 100.0));
        let score = RangePositionModule.score("X", &series(&bars)).unwrap();
        assert!((score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_band_is_neutral() {
        let bars = vec![(100.0, 100.0, 100.0); 40];
        let score = RangePositionModule.score("X", &series(&bars)).unwrap();
        assert_eq!(score, 50.0);
    }
}
