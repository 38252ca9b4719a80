use serde::{Deserialize, Serialize};

/// Market classification for a tradable symbol.
///
/// Providers declare which markets they can serve; the fallback chain uses
/// this to skip providers that cannot possibly answer a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Equity,
    Crypto,
    Futures,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Equity => "equity",
            Market::Crypto => "crypto",
            Market::Futures => "futures",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "equity" | "stock" => Ok(Market::Equity),
            "crypto" => Ok(Market::Crypto),
            "futures" => Ok(Market::Futures),
            _ => Err(format!(
                "Invalid market: {}. Valid options: equity, crypto, futures",
                s
            )),
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
