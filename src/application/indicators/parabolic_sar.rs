/// Parabolic SAR (Wilder recurrence), returning the latest value.
///
/// The trend flips when the SAR line crosses the previous or current bar's
/// extreme; the acceleration factor grows by `step` per new extreme and is
/// capped at `max_step`. Every emitted value is scaled by
/// `1 + margin_percent / 100` (the margin only ever widens).
pub fn parabolic_sar(
    highs: &[f64],
    lows: &[f64],
    step: f64,
    max_step: f64,
    margin_percent: f64,
) -> Option<f64> {
    if highs.len() < 2 || highs.len() != lows.len() || step <= 0.0 || max_step <= 0.0 {
        return None;
    }

    let margin = 1.0 + margin_percent / 100.0;
    let mut sar = lows[0];
    let mut extreme = highs[0];
    let mut af = step;
    let mut rising = true;
    let mut last = sar;

    for i in 1..highs.len() {
        sar += af * (extreme - sar);
        if rising {
            if sar > lows[i - 1] || sar > lows[i] {
                // Flip to downtrend
                sar = extreme;
                af = step;
                rising = false;
                extreme = lows[..=i].iter().cloned().fold(f64::INFINITY, f64::min);
            } else {
                if highs[i] > extreme {
                    extreme = highs[i];
                    af = (af + step).min(max_step);
                }
                sar = sar.min(lows[i - 1]);
            }
        } else if sar < highs[i - 1] || sar < highs[i] {
            // Flip to uptrend
            sar = extreme;
            af = step;
            rising = true;
            extreme = highs[..=i].iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        } else {
            if lows[i] < extreme {
                extreme = lows[i];
                af = (af + step).min(max_step);
            }
            sar = sar.max(highs[i - 1]);
        }
        last = sar * margin;
    }

    Some(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data() {
        assert!(parabolic_sar(&[1.0], &[0.9], 0.02, 0.2, 0.0).is_none());
        assert!(parabolic_sar(&[1.0, 2.0], &[0.9, 1.9], 0.0, 0.2, 0.0).is_none());
    }

    #[test]
    fn test_uptrend_sar_below_price() {
        let highs: Vec<f64> = (0..40).map(|i| 101.0 + i as f64).collect();
        let lows: Vec<f64> = (0..40).map(|i| 99.0 + i as f64).collect();
        let sar = parabolic_sar(&highs, &lows, 0.02, 0.2, 0.0).unwrap();
        assert!(sar < *lows.last().unwrap());
    }

    #[test]
    fn test_downtrend_sar_above_price() {
        let highs: Vec<f64> = (0..40).map(|i| 201.0 - i as f64).collect();
        let lows: Vec<f64> = (0..40).map(|i| 199.0 - i as f64).collect();
        let sar = parabolic_sar(&highs, &lows, 0.02, 0.2, 0.0).unwrap();
        assert!(sar > *highs.last().unwrap());
    }

    #[test]
    fn test_margin_scales_output() {
        let highs: Vec<f64> = (0..40).map(|i| 101.0 + i as f64).collect();
        let lows: Vec<f64> = (0..40).map(|i| 99.0 + i as f64).collect();
        let plain = parabolic_sar(&highs, &lows, 0.02, 0.2, 0.0).unwrap();
        let scaled = parabolic_sar(&highs, &lows, 0.02, 0.2, 5.0).unwrap();
        assert!((scaled - plain * 1.05).abs() < 1e-9);
    }
}
