use crate::models::{Interval, Period};

/// Deterministic identifier for one cached series artifact.
///
/// The hex digest names the on-disk file, so it must be stable across runs
/// and across encodings of the same (symbol, period, interval) request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    hex: String,
}

impl CacheKey {
    pub fn new(symbol: &str, period: Period, interval: Interval) -> Self {
        let input = format!(
            "{}|{}|{}",
            symbol.to_uppercase(),
            period.as_str(),
            interval.as_str()
        );
        Self {
            hex: blake3::hash(input.as_bytes()).to_hex().to_string(),
        }
    }

    pub fn as_hex(&self) -> &str {
        &self.hex
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let a = CacheKey::new("BTC", Period::OneYear, Interval::Daily);
        let b = CacheKey::new("BTC", Period::OneYear, Interval::Daily);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_is_case_insensitive_on_symbol() {
        let a = CacheKey::new("aapl", Period::OneYear, Interval::Daily);
        let b = CacheKey::new("AAPL", Period::OneYear, Interval::Daily);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_varies_with_request_shape() {
        let base = CacheKey::new("AAPL", Period::OneYear, Interval::Daily);
        assert_ne!(base, CacheKey::new("MSFT", Period::OneYear, Interval::Daily));
        assert_ne!(base, CacheKey::new("AAPL", Period::SixMonths, Interval::Daily));
        assert_ne!(base, CacheKey::new("AAPL", Period::OneYear, Interval::Hourly));
    }
}
