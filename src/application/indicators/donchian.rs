#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Donchian {
    pub upper: f64,
    pub lower: f64,
}

/// Donchian channel: rolling max(high) / min(low) over the last `period`
pub fn donchian(highs: &[f64], lows: &[f64], period: usize) -> Option<Donchian> {
    if period == 0 || highs.len() < period || lows.len() < period {
        return None;
    }
    let upper = highs[highs.len() - period..]
        .iter()
        .cloned()
        .fold(f64::MIN, f64::max);
    let lower = lows[lows.len() - period..]
        .iter()
        .cloned()
        .fold(f64::MAX, f64::min);
    Some(Donchian { upper, lower })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data() {
        assert!(donchian(&[1.0; 10], &[1.0; 10], 20).is_none());
    }

    #[test]
    fn test_channel_bounds() {
        let highs: Vec<f64> = (0..30).map(|i| 100.0 + (i % 5) as f64).collect();
        let lows: Vec<f64> = highs.iter().map(|h| h - 10.0).collect();
        let out = donchian(&highs, &lows, 20).unwrap();
        assert_eq!(out.upper, 104.0);
        assert_eq!(out.lower, 90.0);
        assert!(out.upper >= out.lower);
    }

    #[test]
    fn test_window_excludes_older_extremes() {
        let mut highs = vec![500.0]; // outside the window
        highs.extend((0..20).map(|i| 100.0 + i as f64));
        let lows: Vec<f64> = highs.iter().map(|h| h - 1.0).collect();
        let out = donchian(&highs, &lows, 20).unwrap();
        assert_eq!(out.upper, 119.0);
    }
}
