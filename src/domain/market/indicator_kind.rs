use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of indicators the signal engine can evaluate.
///
/// The fusion loop iterates a typed collection of these instead of
/// branching on string names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Bollinger,
    Macd,
    Kdj,
    Sar,
    Fibonacci,
    CandlePatterns,
    Ichimoku,
    Donchian,
    Stochastic,
    Supertrend,
    EmaStack,
    MaStack,
    Adx,
    StochRsiStack,
    RsiStack,
}

impl IndicatorKind {
    /// Display label used in a signal's contributing-indicator set
    pub fn label(&self) -> &'static str {
        match self {
            IndicatorKind::Bollinger => "BB",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Kdj => "KDJ",
            IndicatorKind::Sar => "SAR",
            IndicatorKind::Fibonacci => "Fibonacci",
            IndicatorKind::CandlePatterns => "Candle",
            IndicatorKind::Ichimoku => "Ichimoku",
            IndicatorKind::Donchian => "Donchian",
            IndicatorKind::Stochastic => "Stochastic",
            IndicatorKind::Supertrend => "Supertrend",
            IndicatorKind::EmaStack => "EMA",
            IndicatorKind::MaStack => "MA",
            IndicatorKind::Adx => "ADX",
            IndicatorKind::StochRsiStack => "StochRSI",
            IndicatorKind::RsiStack => "RSI",
        }
    }

    /// Every indicator the engine knows about
    pub fn all() -> Vec<IndicatorKind> {
        vec![
            IndicatorKind::Bollinger,
            IndicatorKind::Macd,
            IndicatorKind::Kdj,
            IndicatorKind::Sar,
            IndicatorKind::Fibonacci,
            IndicatorKind::CandlePatterns,
            IndicatorKind::Ichimoku,
            IndicatorKind::Donchian,
            IndicatorKind::Stochastic,
            IndicatorKind::Supertrend,
            IndicatorKind::EmaStack,
            IndicatorKind::MaStack,
            IndicatorKind::Adx,
            IndicatorKind::StochRsiStack,
            IndicatorKind::RsiStack,
        ]
    }
}

impl FromStr for IndicatorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bb" | "bollinger" => Ok(IndicatorKind::Bollinger),
            "macd" => Ok(IndicatorKind::Macd),
            "kdj" => Ok(IndicatorKind::Kdj),
            "sar" => Ok(IndicatorKind::Sar),
            "fib" | "fibonacci" => Ok(IndicatorKind::Fibonacci),
            "candle" | "candle_patterns" => Ok(IndicatorKind::CandlePatterns),
            "ichimoku" => Ok(IndicatorKind::Ichimoku),
            "donchian" => Ok(IndicatorKind::Donchian),
            "stochastic" => Ok(IndicatorKind::Stochastic),
            "supertrend" => Ok(IndicatorKind::Supertrend),
            "ema5x" | "ema_stack" => Ok(IndicatorKind::EmaStack),
            "ma5x" | "ma_stack" => Ok(IndicatorKind::MaStack),
            "adx" => Ok(IndicatorKind::Adx),
            "stochrsi5x" | "stoch_rsi_stack" => Ok(IndicatorKind::StochRsiStack),
            "rsi5x" | "rsi_stack" => Ok(IndicatorKind::RsiStack),
            _ => anyhow::bail!("Unknown indicator: {}", s),
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
