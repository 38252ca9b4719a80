use crate::error::Error;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;

/// Get cache directory from environment variable or use default
pub fn get_cache_dir() -> PathBuf {
    std::env::var("CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("cache_data"))
}

/// Get results database path from environment variable or use default
pub fn get_results_db_path() -> PathBuf {
    std::env::var("RESULTS_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("results.db"))
}

/// Get symbol universe file path from environment variable or use default
pub fn get_universe_path() -> PathBuf {
    std::env::var("UNIVERSE_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("universe.json"))
}

/// Parse a timestamp that may be a date ("2024-01-05"), a datetime
/// ("2024-01-05 09:30:00" / ISO 8601), or epoch seconds.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, Error> {
    let s = s.trim();

    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| Error::Parse(format!("Epoch out of range: {}", s)));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc());
    }

    Err(Error::Parse(format!("Unrecognized timestamp: {}", s)))
}
