use crate::constants::{MIN_RECORDS_FOR_SCORING, VOLUME_RECENT_WINDOW};
use crate::error::Error;
use crate::models::Ohlcv;
use crate::scoring::ScoringModule;

/// Volume participation score: recent average volume against the
/// whole-series baseline. Baseline volume scores 50; twice the baseline
/// saturates at 100.
pub struct VolumeModule;

impl ScoringModule for VolumeModule {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn score(&self, _symbol: &str, series: &[Ohlcv]) -> Result<f64, Error> {
        if series.len() < MIN_RECORDS_FOR_SCORING {
            return Err(Error::Score(format!(
                "volume needs {} records, got {}",
                MIN_RECORDS_FOR_SCORING,
                series.len()
            )));
        }

        let baseline: f64 =
            series.iter().map(|r| r.volume as f64).sum::<f64>() / series.len() as f64;
        if baseline == 0.0 {
            // Index-style series publish no volume; exclude this module
            // from the weighting rather than returning a fake neutral.
            return Err(Error::Score("series has no volume data".to_string()));
        }

        let recent_start = series.len().saturating_sub(VOLUME_RECENT_WINDOW);
        let recent = &series[recent_start..];
        let recent_avg: f64 =
            recent.iter().map(|r| r.volume as f64).sum::<f64>() / recent.len() as f64;

        Ok((recent_avg / baseline * 50.0).clamp(0.0, 100.0))
    }
}
