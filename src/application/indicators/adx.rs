use super::moving::sma;
use crate::domain::market::Candle;

/// Average Directional Index.
///
/// +DM/-DM and the true range are smoothed by SMA(period);
/// `DX = |+DI - -DI| / (+DI + -DI or 1) * 100`. The reference formulation
/// ends with one more SMA(period) pass over the single-element DX
/// sequence; that pass is an identity here, so DX is returned directly.
pub fn adx(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let mut plus_dm = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm = Vec::with_capacity(candles.len() - 1);
    let mut true_ranges = Vec::with_capacity(candles.len() - 1);

    for pair in candles.windows(2) {
        let prev = &pair[0];
        let current = &pair[1];
        let up = current.high - prev.high;
        let down = prev.low - current.low;
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });

        let tr = (current.high - current.low)
            .max((current.high - prev.close).abs())
            .max((current.low - prev.close).abs());
        true_ranges.push(tr);
    }

    let smoothed_tr = sma(&true_ranges, period)?;
    let tr_denom = if smoothed_tr == 0.0 { 1.0 } else { smoothed_tr };
    let plus_di = 100.0 * sma(&plus_dm, period)? / tr_denom;
    let minus_di = 100.0 * sma(&minus_dm, period)? / tr_denom;

    let di_sum = plus_di + minus_di;
    let di_denom = if di_sum == 0.0 { 1.0 } else { di_sum };
    Some((plus_di - minus_di).abs() / di_denom * 100.0)
}
