use serde::{Deserialize, Serialize};

/// Bar interval for market data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// Daily bars
    Daily,
    /// Hourly bars
    Hourly,
    /// Minute bars
    Minute,
}

impl Interval {
    /// Stable wire/cache form ("1D", "1H", "1m")
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1D",
            Interval::Hourly => "1H",
            Interval::Minute => "1m",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "1D" | "D" | "DAILY" => Ok(Interval::Daily),
            "1H" | "H" | "HOURLY" => Ok(Interval::Hourly),
            "1M" | "M" | "MINUTE" => Ok(Interval::Minute),
            _ => Err(format!("Invalid interval: {}. Valid options: 1D, 1H, 1m", s)),
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookback window for a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
}

impl Period {
    /// Stable wire/cache form
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
        }
    }

    /// Calendar-day span used to derive provider start timestamps
    pub fn approx_days(&self) -> i64 {
        match self {
            Period::OneMonth => 31,
            Period::ThreeMonths => 92,
            Period::SixMonths => 183,
            Period::OneYear => 366,
            Period::TwoYears => 731,
            Period::FiveYears => 1827,
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "1mo" => Ok(Period::OneMonth),
            "3mo" => Ok(Period::ThreeMonths),
            "6mo" => Ok(Period::SixMonths),
            "1y" => Ok(Period::OneYear),
            "2y" => Ok(Period::TwoYears),
            "5y" => Ok(Period::FiveYears),
            _ => Err(format!(
                "Invalid period: {}. Valid options: 1mo, 3mo, 6mo, 1y, 2y, 5y",
                s
            )),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
