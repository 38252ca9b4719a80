use crate::constants::MIN_RECORDS_FOR_SCORING;
use crate::error::Error;
use crate::models::Ohlcv;
use crate::scoring::indicators::{percent_returns, stddev};
use crate::scoring::ScoringModule;

/// Inverse-volatility score: calmer series score higher. One percent of
/// daily return dispersion costs 20 points off the top of the scale.
pub struct VolatilityModule;

impl ScoringModule for VolatilityModule {
    fn name(&self) -> &'static str {
        "volatility"
    }

    fn score(&self, _symbol: &str, series: &[Ohlcv]) -> Result<f64, Error> {
        if series.len() < MIN_RECORDS_FOR_SCORING {
            return Err(Error::Score(format!(
                "volatility needs {} records, got {}",
                MIN_RECORDS_FOR_SCORING,
                series.len()
            )));
        }

        let closes: Vec<f64> = series.iter().map(|r| r.close).collect();
        let returns = percent_returns(&closes);
        if returns.is_empty() {
            return Err(Error::Score("no usable returns in series".to_string()));
        }

        let dispersion = stddev(&returns);
        Ok((100.0 - dispersion * 20.0).clamp(0.0, 100.0))
    }
}
