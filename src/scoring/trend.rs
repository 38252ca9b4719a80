use crate::constants::{MIN_RECORDS_FOR_SCORING, TREND_FAST_PERIOD, TREND_SLOW_PERIOD};
use crate::error::Error;
use crate::models::Ohlcv;
use crate::scoring::indicators::{calculate_sma, ma_distance};
use crate::scoring::ScoringModule;

/// Moving-average trend score.
///
/// Neutral 50 when price sits on its averages; distance above the fast and
/// slow MA pushes the score up, distance below pushes it down, and a
/// fast-over-slow alignment adds a fixed bonus.
pub struct TrendModule;

impl ScoringModule for TrendModule {
    fn name(&self) -> &'static str {
        "trend"
    }

    fn score(&self, _symbol: &str, series: &[Ohlcv]) -> Result<f64, Error> {
        if series.len() < TREND_SLOW_PERIOD.max(MIN_RECORDS_FOR_SCORING) {
            return Err(Error::Score(format!(
                "trend needs {} records, got {}",
                TREND_SLOW_PERIOD.max(MIN_RECORDS_FOR_SCORING),
                series.len()
            )));
        }

        let closes: Vec<f64> = series.iter().map(|r| r.close).collect();
        let fast = calculate_sma(&closes, TREND_FAST_PERIOD);
        let slow = calculate_sma(&closes, TREND_SLOW_PERIOD);

        let close = *closes.last().expect("length checked above");
        let fast_ma = *fast.last().expect("same length as closes");
        let slow_ma = *slow.last().expect("same length as closes");

        let fast_dist = ma_distance(close, fast_ma);
        let slow_dist = ma_distance(close, slow_ma);

        let mut score = 50.0 + fast_dist * 3.0 + slow_dist * 2.0;
        if fast_ma > slow_ma {
            score += 5.0;
        }

        Ok(score.clamp(0.0, 100.0))
    }
}
