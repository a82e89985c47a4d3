use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents different timeframe intervals for kline series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    OneMin,
    FiveMin,
    FifteenMin,
    ThirtyMin,
    OneHour,
    FourHour,
    OneDay,
}

impl Timeframe {
    /// Returns the duration of this timeframe in minutes
    pub fn to_minutes(&self) -> usize {
        match self {
            Timeframe::OneMin => 1,
            Timeframe::FiveMin => 5,
            Timeframe::FifteenMin => 15,
            Timeframe::ThirtyMin => 30,
            Timeframe::OneHour => 60,
            Timeframe::FourHour => 240,
            Timeframe::OneDay => 1440,
        }
    }

    /// Returns the duration of one bar in milliseconds
    pub fn duration_ms(&self) -> i64 {
        (self.to_minutes() as i64) * 60_000
    }

    /// Converts to Bybit v5 API interval string.
    ///
    /// Bybit uses bare minute counts for intraday intervals and "D" for daily.
    pub fn to_bybit_interval(&self) -> &'static str {
        match self {
            Timeframe::OneMin => "1",
            Timeframe::FiveMin => "5",
            Timeframe::FifteenMin => "15",
            Timeframe::ThirtyMin => "30",
            Timeframe::OneHour => "60",
            Timeframe::FourHour => "240",
            Timeframe::OneDay => "D",
        }
    }

    /// Returns all available timeframes in ascending order
    pub fn all() -> Vec<Timeframe> {
        vec![
            Timeframe::OneMin,
            Timeframe::FiveMin,
            Timeframe::FifteenMin,
            Timeframe::ThirtyMin,
            Timeframe::OneHour,
            Timeframe::FourHour,
            Timeframe::OneDay,
        ]
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "1" | "1m" => Ok(Timeframe::OneMin),
            "5" | "5m" => Ok(Timeframe::FiveMin),
            "15" | "15m" => Ok(Timeframe::FifteenMin),
            "30" | "30m" => Ok(Timeframe::ThirtyMin),
            "60" | "1h" => Ok(Timeframe::OneHour),
            "240" | "4h" => Ok(Timeframe::FourHour),
            "d" | "1d" => Ok(Timeframe::OneDay),
            _ => Err(anyhow!("Invalid timeframe: {}", s)),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::OneMin => "1m",
            Timeframe::FiveMin => "5m",
            Timeframe::FifteenMin => "15m",
            Timeframe::ThirtyMin => "30m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHour => "4h",
            Timeframe::OneDay => "1d",
        };
        write!(f, "{}", s)
    }
}
