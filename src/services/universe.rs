use crate::error::Error;
use crate::models::Market;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// One symbol in the analysis universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseEntry {
    pub symbol: String,
    pub market: Market,
}

/// Load the symbol universe from a JSON file.
///
/// This is the one input whose failure fails a whole run: an unreadable,
/// unparsable, or empty universe is a configuration error, not a skip.
pub fn load_universe(path: &Path) -> Result<Vec<UniverseEntry>, Error> {
    let bytes = std::fs::read(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read universe file {}: {}",
            path.display(),
            e
        ))
    })?;

    let entries: Vec<UniverseEntry> = serde_json::from_slice(&bytes).map_err(|e| {
        Error::Config(format!(
            "Failed to parse universe file {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut seen = HashSet::new();
    let mut universe = Vec::with_capacity(entries.len());
    for entry in entries {
        let symbol = entry.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            continue;
        }
        if !seen.insert(symbol.clone()) {
            warn!(symbol = %symbol, "Duplicate symbol in universe file, keeping first entry");
            continue;
        }
        universe.push(UniverseEntry {
            symbol,
            market: entry.market,
        });
    }

    if universe.is_empty() {
        return Err(Error::Config(format!(
            "Universe file {} contains no symbols",
            path.display()
        )));
    }

    info!(symbols = universe.len(), path = %path.display(), "Universe loaded");
    Ok(universe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_universe(tmp: &TempDir, body: &str) -> std::path::PathBuf {
        let path = tmp.path().join("universe.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_universe() {
        let tmp = TempDir::new().unwrap();
        let path = write_universe(
            &tmp,
            r#"[
                {"symbol": "aapl", "market": "equity"},
                {"symbol": "BTC", "market": "crypto"},
                {"symbol": "ES.F", "market": "futures"}
            ]"#,
        );

        let universe = load_universe(&path).unwrap();
        assert_eq!(universe.len(), 3);
        assert_eq!(universe[0].symbol, "AAPL");
        assert_eq!(universe[1].market, Market::Crypto);
    }

    #[test]
    fn test_duplicates_keep_first_entry() {
        let tmp = TempDir::new().unwrap();
        let path = write_universe(
            &tmp,
            r#"[
                {"symbol": "AAPL", "market": "equity"},
                {"symbol": "aapl", "market": "crypto"}
            ]"#,
        );

        let universe = load_universe(&path).unwrap();
        assert_eq!(universe.len(), 1);
        assert_eq!(universe[0].market, Market::Equity);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_universe(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_universe_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_universe(&tmp, "[]");
        assert!(matches!(load_universe(&path).unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_universe(&tmp, "{not json");
        assert!(matches!(load_universe(&path).unwrap_err(), Error::Config(_)));
    }
}
