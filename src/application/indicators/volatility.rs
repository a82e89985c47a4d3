use super::moving::sma;
use crate::domain::market::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Supertrend {
    pub upper: f64,
    pub lower: f64,
}

/// Average True Range: SMA(period) of the true range series
/// `max(high - low, |high - prev_close|, |low - prev_close|)`.
///
/// Needs `period + 1` candles since the true range consumes one bar of
/// lookback.
pub fn atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }
    let mut true_ranges = Vec::with_capacity(candles.len() - 1);
    for pair in candles.windows(2) {
        let prev_close = pair[0].close;
        let current = &pair[1];
        let tr = (current.high - current.low)
            .max((current.high - prev_close).abs())
            .max((current.low - prev_close).abs());
        true_ranges.push(tr);
    }
    sma(&true_ranges, period)
}

/// Supertrend bands around the current bar midpoint:
/// `(high + low) / 2 ± multiplier * ATR(period)`
pub fn supertrend(candles: &[Candle], period: usize, multiplier: f64) -> Option<Supertrend> {
    if multiplier <= 0.0 {
        return None;
    }
    let atr = atr(candles, period)?;
    let last = candles.last()?;
    let mid = (last.high + last.low) / 2.0;
    Some(Supertrend {
        upper: mid + multiplier * atr,
        lower: mid - multiplier * atr,
    })
}
