/// Fibonacci retracement prices for the high/low of the supplied window.
///
/// Levels are percentages (e.g. 38.2), not fractions:
/// `price(level) = low + (high - low) * level / 100`.
pub fn fibonacci_levels(prices: &[f64], levels: &[f64]) -> Option<Vec<f64>> {
    if prices.len() < 2 {
        return None;
    }
    let high = prices.iter().cloned().fold(f64::MIN, f64::max);
    let low = prices.iter().cloned().fold(f64::MAX, f64::min);
    let range = high - low;
    Some(levels.iter().map(|level| low + range * level / 100.0).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data() {
        assert!(fibonacci_levels(&[1.0], &[50.0]).is_none());
    }

    #[test]
    fn test_levels_are_percentages() {
        let prices = [100.0, 150.0, 200.0, 120.0];
        let levels = fibonacci_levels(&prices, &[0.0, 23.6, 50.0, 100.0]).unwrap();
        assert_eq!(levels[0], 100.0);
        assert!((levels[1] - 123.6).abs() < 1e-9);
        assert_eq!(levels[2], 150.0);
        assert_eq!(levels[3], 200.0);
    }

    #[test]
    fn test_empty_level_set() {
        let prices = [100.0, 200.0];
        assert_eq!(fibonacci_levels(&prices, &[]), Some(vec![]));
    }
}
