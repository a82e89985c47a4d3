use super::moving::sma;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kdj {
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stochastic {
    pub k: f64,
    pub d: f64,
}

/// Raw %K series: for each index from `period - 1`,
/// `(close - min(low)) / (max(high) - min(low) or 1) * 100` over the
/// trailing `period` window.
fn raw_stochastic_k(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Option<Vec<f64>> {
    if period == 0
        || closes.len() < period
        || highs.len() != closes.len()
        || lows.len() != closes.len()
    {
        return None;
    }

    let mut ks = Vec::with_capacity(closes.len() - period + 1);
    for i in (period - 1)..closes.len() {
        let window = (i + 1 - period)..=i;
        let high = highs[window.clone()].iter().cloned().fold(f64::MIN, f64::max);
        let low = lows[window].iter().cloned().fold(f64::MAX, f64::min);
        let range = if high - low == 0.0 { 1.0 } else { high - low };
        ks.push((closes[i] - low) / range * 100.0);
    }
    Some(ks)
}

/// KDJ oscillator: `K = SMA(k_smooth)` of the raw %K tail, `D =
/// SMA(d_smooth)` of the %K series shifted back by `k_smooth - 1`,
/// `J = 3K - 2D`.
pub fn kdj(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    k_smooth: usize,
    d_smooth: usize,
) -> Option<Kdj> {
    if k_smooth == 0 || d_smooth == 0 {
        return None;
    }
    let ks = raw_stochastic_k(highs, lows, closes, period)?;
    let k = sma(&ks, k_smooth)?;
    let shifted_end = ks.len() + 1 - k_smooth;
    let d = sma(&ks[..shifted_end], d_smooth)?;
    Some(Kdj {
        k,
        d,
        j: 3.0 * k - 2.0 * d,
    })
}

/// Stochastic oscillator: `K = SMA(smooth)` of the raw %K tail, `D =
/// SMA(d_period)` of the raw %K tail (D is computed from raw %K, not from
/// the smoothed K).
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
    smooth: usize,
) -> Option<Stochastic> {
    if d_period == 0 || smooth == 0 {
        return None;
    }
    let ks = raw_stochastic_k(highs, lows, closes, k_period)?;
    let k = sma(&ks, smooth)?;
    let d = sma(&ks, d_period)?;
    Some(Stochastic { k, d })
}

/// Wilder-style RSI via SMA of gains/losses over the last `period` deltas.
/// Defined as 100 when the average loss is zero. Always in [0, 100].
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        let diff = pair[1] - pair[0];
        gains.push(diff.max(0.0));
        losses.push((-diff).max(0.0));
    }

    let avg_gain = sma(&gains, period)?;
    let avg_loss = sma(&losses, period)?;
    if avg_loss == 0.0 {
        Some(100.0)
    } else {
        Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
    }
}

/// Rolling RSI: one RSI value per trailing `period + 1`-close window
fn rsi_series(closes: &[f64], period: usize) -> Option<Vec<f64>> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    closes.windows(period + 1).map(|w| rsi(w, period)).collect()
}

/// Stochastic oscillator applied to the rolling RSI series in place of
/// price, with the conventional 3/3 D and smoothing periods.
pub fn stoch_rsi(closes: &[f64], period: usize) -> Option<Stochastic> {
    let rsis = rsi_series(closes, period)?;
    stochastic(&rsis, &rsis, &rsis, period, 3, 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sawtooth(len: usize) -> Vec<f64> {
        (0..len).map(|i| 100.0 + (i % 10) as f64).collect()
    }

    #[test]
    fn test_kdj_insufficient_data() {
        let closes = [1.0; 5];
        assert!(kdj(&closes, &closes, &closes, 9, 3, 3).is_none());
        assert!(kdj(&closes, &closes, &closes, 5, 0, 3).is_none());
    }

    #[test]
    fn test_kdj_j_identity() {
        let closes = sawtooth(40);
        let highs: Vec<f64> = closes.iter().map(|c| c + 1.0).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
        let out = kdj(&highs, &lows, &closes, 9, 3, 3).unwrap();
        assert!((out.j - (3.0 * out.k - 2.0 * out.d)).abs() < 1e-12);
        assert!(out.k >= 0.0 && out.k <= 100.0);
    }

    #[test]
    fn test_stochastic_overbought_at_highs() {
        // Closes pinned to window highs: %K near 100
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let highs = closes.clone();
        let lows: Vec<f64> = closes.iter().map(|c| c - 5.0).collect();
        let out = stochastic(&highs, &lows, &closes, 14, 3, 3).unwrap();
        assert!(out.k > 80.0);
    }

    #[test]
    fn test_stochastic_flat_window_divides_by_one() {
        let flat = [42.0; 20];
        let out = stochastic(&flat, &flat, &flat, 14, 3, 3).unwrap();
        assert_eq!(out.k, 0.0);
        assert_eq!(out.d, 0.0);
    }

    #[test]
    fn test_rsi_bounds() {
        let up: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let down: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let wave = sawtooth(30);

        for series in [&up, &down, &wave] {
            let value = rsi(series, 14).unwrap();
            assert!((0.0..=100.0).contains(&value), "RSI out of range: {}", value);
        }
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let up: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert_eq!(rsi(&up, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let down: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert!(rsi(&down, 14).unwrap() < 1e-9);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert!(rsi(&[1.0; 14], 14).is_none());
    }

    #[test]
    fn test_stoch_rsi_needs_two_periods() {
        // rsi_series needs period+1, stochastic over it needs period more
        let closes = sawtooth(20);
        assert!(stoch_rsi(&closes, 14).is_none());

        let closes = sawtooth(60);
        let out = stoch_rsi(&closes, 14).unwrap();
        assert!(out.k >= 0.0 && out.k <= 100.0);
    }
}
