use crate::constants::{
    SIGNAL_BUY_THRESHOLD, SIGNAL_HOLD_STRONG_THRESHOLD, SIGNAL_HOLD_THRESHOLD,
    SIGNAL_HOLD_WEAK_THRESHOLD,
};
use crate::models::Market;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categorical trading signal derived from a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    HoldStrong,
    Hold,
    HoldWeak,
    Sell,
}

impl Signal {
    /// Map a composite score onto the signal ladder. Bands are checked
    /// highest first; each boundary is inclusive on its lower bound.
    pub fn from_score(score: f64) -> Self {
        if score >= SIGNAL_BUY_THRESHOLD {
            Signal::Buy
        } else if score >= SIGNAL_HOLD_STRONG_THRESHOLD {
            Signal::HoldStrong
        } else if score >= SIGNAL_HOLD_THRESHOLD {
            Signal::Hold
        } else if score >= SIGNAL_HOLD_WEAK_THRESHOLD {
            Signal::HoldWeak
        } else {
            Signal::Sell
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::HoldStrong => "HOLD_STRONG",
            Signal::Hold => "HOLD",
            Signal::HoldWeak => "HOLD_WEAK",
            Signal::Sell => "SELL",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "BUY" => Ok(Signal::Buy),
            "HOLD_STRONG" => Ok(Signal::HoldStrong),
            "HOLD" => Ok(Signal::Hold),
            "HOLD_WEAK" => Ok(Signal::HoldWeak),
            "SELL" => Ok(Signal::Sell),
            _ => Err(format!("Unknown signal: {}", s)),
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one scoring module invocation for one symbol.
///
/// A module that errored contributes no score and its weight is excluded
/// from the normalization denominator for that symbol only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleScore {
    pub module: String,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModuleScore {
    pub fn succeeded(module: &str, weight: f64, score: f64) -> Self {
        Self {
            module: module.to_string(),
            weight,
            score: Some(score),
            error: None,
        }
    }

    pub fn failed(module: &str, weight: f64, error: String) -> Self {
        Self {
            module: module.to_string(),
            weight,
            score: None,
            error: Some(error),
        }
    }
}

/// Final aggregated result for one (symbol, run). Immutable after creation;
/// the sole unit written to the result store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeResult {
    pub symbol: String,
    pub market: Market,
    pub composite_score: f64,
    pub signal: Signal,
    /// Set when zero modules produced a score and the composite fell back
    /// to the neutral value.
    pub low_confidence: bool,
    pub breakdown: Vec<ModuleScore>,
    pub timestamp: DateTime<Utc>,
}

impl CompositeResult {
    /// Sub-score for a named module, if it succeeded.
    pub fn module_score(&self, module: &str) -> Option<f64> {
        self.breakdown
            .iter()
            .find(|m| m.module == module)
            .and_then(|m| m.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_threshold_boundaries() {
        assert_eq!(Signal::from_score(65.0), Signal::Buy);
        assert_eq!(Signal::from_score(55.0), Signal::HoldStrong);
        assert_eq!(Signal::from_score(45.0), Signal::Hold);
        assert_eq!(Signal::from_score(35.0), Signal::HoldWeak);
        assert_eq!(Signal::from_score(34.999), Signal::Sell);
    }

    #[test]
    fn test_signal_extremes() {
        assert_eq!(Signal::from_score(100.0), Signal::Buy);
        assert_eq!(Signal::from_score(0.0), Signal::Sell);
    }

    #[test]
    fn test_signal_parse_round_trip() {
        for signal in [
            Signal::Buy,
            Signal::HoldStrong,
            Signal::Hold,
            Signal::HoldWeak,
            Signal::Sell,
        ] {
            assert_eq!(Signal::parse(signal.as_str()).unwrap(), signal);
        }
    }
}
