use serde::{Deserialize, Serialize};

/// One OHLCV price bar for a fixed time bucket.
///
/// Within a series candles are strictly ordered by `open_time` ascending
/// with no duplicates; producers deliver them in non-decreasing
/// `open_time` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open timestamp in milliseconds
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Bar close timestamp in milliseconds (`open_time` + bar duration)
    pub close_time: i64,
}

impl Candle {
    /// Full candle range (high to low)
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Absolute body size (open to close)
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Latest 24h snapshot for one symbol, used only for universe filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub turnover24h: f64,
    pub last_price: f64,
}
