use super::moving::ema;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub macd: f64,
    pub signal_line: f64,
    pub histogram: f64,
}

/// MACD over trimmed tail windows.
///
/// The MACD line is `EMA(fast)` over the last `fast + signal_period`
/// closes minus `EMA(slow)` over the last `slow + signal_period` closes.
/// The signal line is `EMA(signal_period)` of the MACD value recomputed at
/// each of the last `signal_period` offsets, each over a window of exactly
/// `fast` (resp. `slow`) closes ending at that offset.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> Option<Macd> {
    if fast == 0 || slow == 0 || signal_period == 0 {
        return None;
    }
    let len = closes.len();
    if len < slow + signal_period || len < fast + signal_period {
        return None;
    }

    let macd_line =
        ema(&closes[len - (fast + signal_period)..], fast)?
            - ema(&closes[len - (slow + signal_period)..], slow)?;

    let mut macd_series = Vec::with_capacity(signal_period);
    for i in 0..signal_period {
        let fast_ema = ema(&closes[len - fast - signal_period + i..len - signal_period + i], fast)?;
        let slow_ema = ema(&closes[len - slow - signal_period + i..len - signal_period + i], slow)?;
        macd_series.push(fast_ema - slow_ema);
    }
    let signal_line = ema(&macd_series, signal_period)?;

    Some(Macd {
        macd: macd_line,
        signal_line,
        histogram: macd_line - signal_line,
    })
}
