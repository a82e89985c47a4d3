use super::moving::sma;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Bollinger Bands over the last `period` closes.
///
/// The half-width is the population standard deviation of the window times
/// `std_dev_mult`. `margin_percent` widens the upper band and narrows the
/// lower band asymmetrically (`1 + m` vs `1 - m`); this asymmetry is part
/// of the contract.
pub fn bollinger(
    closes: &[f64],
    period: usize,
    std_dev_mult: f64,
    margin_percent: f64,
) -> Option<BollingerBands> {
    let middle = sma(closes, period)?;
    let tail = &closes[closes.len() - period..];
    let variance = tail.iter().map(|p| (p - middle).powi(2)).sum::<f64>() / period as f64;
    let half_width = variance.sqrt() * std_dev_mult;
    let margin = margin_percent / 100.0;

    Some(BollingerBands {
        middle,
        upper: middle + half_width * (1.0 + margin),
        lower: middle - half_width * (1.0 - margin),
    })
}
