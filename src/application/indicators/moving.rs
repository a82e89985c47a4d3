/// Arithmetic mean of the last `period` values
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let tail = &values[values.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average over the whole slice, seeded with its first
/// element (not an SMA-seeded EMA), smoothing constant `k = 2/(period+1)`.
///
/// Callers control the lookback by trimming the slice they pass in.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = values[0];
    for value in &values[1..] {
        ema = value * k + ema * (1.0 - k);
    }
    Some(ema)
}
