use crate::domain::market::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ichimoku {
    pub tenkan: f64,
    pub kijun: f64,
    pub senkou_a: f64,
    pub senkou_b: f64,
}

/// Midpoint of the high/low range over the last `period` candles
fn midpoint(candles: &[Candle], period: usize) -> f64 {
    let tail = &candles[candles.len() - period..];
    let high = tail.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = tail.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    (high + low) / 2.0
}

/// Ichimoku cloud components: tenkan/kijun midpoints, senkou A =
/// (tenkan + kijun) / 2, senkou B = midpoint over its own period.
pub fn ichimoku(
    candles: &[Candle],
    tenkan_period: usize,
    kijun_period: usize,
    senkou_b_period: usize,
) -> Option<Ichimoku> {
    if tenkan_period == 0 || kijun_period == 0 || senkou_b_period == 0 {
        return None;
    }
    let longest = tenkan_period.max(kijun_period).max(senkou_b_period);
    if candles.len() < longest {
        return None;
    }

    let tenkan = midpoint(candles, tenkan_period);
    let kijun = midpoint(candles, kijun_period);
    Some(Ichimoku {
        tenkan,
        kijun,
        senkou_a: (tenkan + kijun) / 2.0,
        senkou_b: midpoint(candles, senkou_b_period),
    })
}
