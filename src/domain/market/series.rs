use super::timeframe::Timeframe;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bybit market category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketCategory {
    Spot,
    Linear,
}

impl MarketCategory {
    /// Category string as used by the Bybit v5 REST API
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketCategory::Spot => "spot",
            MarketCategory::Linear => "linear",
        }
    }
}

impl FromStr for MarketCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "spot" => Ok(MarketCategory::Spot),
            "linear" => Ok(MarketCategory::Linear),
            _ => anyhow::bail!("Invalid market category: {}. Must be 'spot' or 'linear'", s),
        }
    }
}

impl fmt::Display for MarketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Uniquely identifies one kline series in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub category: MarketCategory,
}

impl SeriesKey {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, category: MarketCategory) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            category,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.category, self.symbol, self.timeframe)
    }
}
