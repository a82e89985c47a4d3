use crate::domain::market::{Candle, SeriesKey};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

/// Maximum number of candles retained per series
pub const MAX_SERIES_LEN: usize = 200;

/// In-memory rolling window of candles keyed by (symbol, timeframe, category).
///
/// Writers are the market data feed handlers only; readers are the signal
/// engine and confirmation coordinator. Single-writer-per-key discipline is
/// assumed — the lock protects the map itself, not upsert interleaving for
/// one key across feeds.
///
/// The store never re-sorts: producers must deliver candles in
/// non-decreasing `open_time` order.
#[derive(Default)]
pub struct KlineStore {
    series: RwLock<HashMap<SeriesKey, VecDeque<Candle>>>,
}

impl KlineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a candle in the given series.
    ///
    /// A candle with an `open_time` already present replaces the existing
    /// entry in place (repeated ticks within the same open bar); otherwise
    /// the candle is appended and the oldest entry evicted once the series
    /// exceeds [`MAX_SERIES_LEN`].
    pub fn upsert(&self, key: &SeriesKey, candle: Candle) {
        let mut series = self.series.write().unwrap_or_else(|e| e.into_inner());
        let window = series.entry(key.clone()).or_default();

        if let Some(existing) = window
            .iter_mut()
            .rev()
            .find(|c| c.open_time == candle.open_time)
        {
            *existing = candle;
            return;
        }

        window.push_back(candle);
        while window.len() > MAX_SERIES_LEN {
            window.pop_front();
        }
    }

    /// Returns the full series oldest-to-newest (possibly empty).
    ///
    /// No history length precondition is enforced here; consumers check
    /// sufficiency before computing indicators.
    pub fn series(&self, key: &SeriesKey) -> Vec<Candle> {
        let series = self.series.read().unwrap_or_else(|e| e.into_inner());
        series
            .get(key)
            .map(|w| w.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Latest candle of the series, if any
    pub fn latest(&self, key: &SeriesKey) -> Option<Candle> {
        let series = self.series.read().unwrap_or_else(|e| e.into_inner());
        series.get(key).and_then(|w| w.back().cloned())
    }

    /// Current length of the series
    pub fn len(&self, key: &SeriesKey) -> usize {
        let series = self.series.read().unwrap_or_else(|e| e.into_inner());
        series.get(key).map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, key: &SeriesKey) -> bool {
        self.len(key) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{MarketCategory, Timeframe};

    fn key() -> SeriesKey {
        SeriesKey::new("BTCUSDT", Timeframe::OneHour, MarketCategory::Spot)
    }

    fn candle(open_time: i64, close: f64) -> Candle {
        Candle {
            open_time,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
            close_time: open_time + 3_600_000,
        }
    }

    #[test]
    fn test_append_preserves_order() {
        let store = KlineStore::new();
        for i in 0..5 {
            store.upsert(&key(), candle(i * 3_600_000, i as f64));
        }
        let series = store.series(&key());
        assert_eq!(series.len(), 5);
        assert!(series.windows(2).all(|w| w[0].open_time < w[1].open_time));
    }

    #[test]
    fn test_same_open_time_replaces_in_place() {
        let store = KlineStore::new();
        store.upsert(&key(), candle(0, 100.0));
        store.upsert(&key(), candle(0, 105.0));

        let series = store.series(&key());
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].close, 105.0);
        assert_eq!(store.latest(&key()).unwrap().close, 105.0);
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let store = KlineStore::new();
        for i in 0..(MAX_SERIES_LEN as i64 + 50) {
            store.upsert(&key(), candle(i * 3_600_000, i as f64));
        }
        let series = store.series(&key());
        assert_eq!(series.len(), MAX_SERIES_LEN);
        // The 50 oldest bars are gone
        assert_eq!(series[0].open_time, 50 * 3_600_000);
        assert_eq!(
            store.latest(&key()).unwrap().open_time,
            (MAX_SERIES_LEN as i64 + 49) * 3_600_000
        );
    }

    #[test]
    fn test_missing_series_is_empty() {
        let store = KlineStore::new();
        assert!(store.series(&key()).is_empty());
        assert!(store.latest(&key()).is_none());
        assert_eq!(store.len(&key()), 0);
    }

    #[test]
    fn test_keys_are_independent() {
        let store = KlineStore::new();
        let other = SeriesKey::new("ETHUSDT", Timeframe::OneHour, MarketCategory::Spot);
        store.upsert(&key(), candle(0, 100.0));
        store.upsert(&other, candle(0, 2000.0));

        assert_eq!(store.latest(&key()).unwrap().close, 100.0);
        assert_eq!(store.latest(&other).unwrap().close, 2000.0);
    }
}
