use crate::domain::market::Candle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Candlestick patterns evaluated over the last two or three candles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlePattern {
    Doji,
    Hammer,
    HangingMan,
    BullishEngulfing,
    BearishEngulfing,
    MorningStar,
    EveningStar,
}

impl CandlePattern {
    /// The direction a detection of this pattern implies
    pub fn is_bullish(&self) -> bool {
        matches!(
            self,
            CandlePattern::Doji
                | CandlePattern::Hammer
                | CandlePattern::BullishEngulfing
                | CandlePattern::MorningStar
        )
    }

    pub fn all() -> Vec<CandlePattern> {
        vec![
            CandlePattern::Doji,
            CandlePattern::Hammer,
            CandlePattern::HangingMan,
            CandlePattern::BullishEngulfing,
            CandlePattern::BearishEngulfing,
            CandlePattern::MorningStar,
            CandlePattern::EveningStar,
        ]
    }
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CandlePattern::Doji => "Doji",
            CandlePattern::Hammer => "Hammer",
            CandlePattern::HangingMan => "Hanging Man",
            CandlePattern::BullishEngulfing => "Bullish Engulfing",
            CandlePattern::BearishEngulfing => "Bearish Engulfing",
            CandlePattern::MorningStar => "Morning Star",
            CandlePattern::EveningStar => "Evening Star",
        };
        write!(f, "{}", s)
    }
}

/// Evaluates the requested pattern set against the tail of the series.
///
/// Returns `None` below three candles of history, otherwise the (possibly
/// empty) list of detected patterns.
pub fn detect_patterns(candles: &[Candle], requested: &[CandlePattern]) -> Option<Vec<CandlePattern>> {
    if candles.len() < 3 {
        return None;
    }
    let last = &candles[candles.len() - 1];
    let prev = &candles[candles.len() - 2];
    let prev2 = &candles[candles.len() - 3];

    let detected = requested
        .iter()
        .copied()
        .filter(|pattern| matches_pattern(*pattern, last, prev, prev2))
        .collect();
    Some(detected)
}

fn matches_pattern(pattern: CandlePattern, last: &Candle, prev: &Candle, prev2: &Candle) -> bool {
    match pattern {
        // Body within 10% of the full range
        CandlePattern::Doji => last.body() <= last.range() * 0.1,
        // Bullish body near the top, lower shadow at least 1% under the open
        CandlePattern::Hammer => {
            last.is_bullish()
                && last.low < last.open * 0.99
                && (last.high - last.close) < last.body() * 0.3
        }
        // Mirror of the hammer: bearish body near the top
        CandlePattern::HangingMan => {
            last.is_bearish()
                && last.low < last.close * 0.99
                && (last.high - last.open) < last.body() * 0.3
        }
        CandlePattern::BullishEngulfing => {
            last.is_bullish()
                && prev.is_bearish()
                && last.open < prev.close
                && last.close > prev.open
        }
        CandlePattern::BearishEngulfing => {
            last.is_bearish()
                && prev.is_bullish()
                && last.open > prev.close
                && last.close < prev.open
        }
        // Bearish bar, small-bodied middle bar, bullish close above the
        // midpoint of the first body
        CandlePattern::MorningStar => {
            prev2.is_bearish()
                && prev.body() <= prev.range() * 0.3
                && last.is_bullish()
                && last.close > (prev2.open + prev2.close) / 2.0
        }
        CandlePattern::EveningStar => {
            prev2.is_bullish()
                && prev.body() <= prev.range() * 0.3
                && last.is_bearish()
                && last.close < (prev2.open + prev2.close) / 2.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            open_time: 0,
            open,
            high,
            low,
            close,
            volume: 1.0,
            close_time: 60_000,
        }
    }

    fn neutral() -> Candle {
        candle(100.0, 110.0, 90.0, 105.0)
    }

    #[test]
    fn test_insufficient_history() {
        let candles = [neutral(), neutral()];
        assert!(detect_patterns(&candles, &CandlePattern::all()).is_none());
    }

    #[test]
    fn test_doji() {
        let candles = [neutral(), neutral(), candle(100.0, 105.0, 95.0, 100.5)];
        let detected = detect_patterns(&candles, &[CandlePattern::Doji]).unwrap();
        assert_eq!(detected, vec![CandlePattern::Doji]);
    }

    #[test]
    fn test_hammer() {
        // Long lower shadow, close near the high
        let candles = [neutral(), neutral(), candle(100.0, 103.1, 95.0, 103.0)];
        let detected = detect_patterns(&candles, &[CandlePattern::Hammer]).unwrap();
        assert_eq!(detected, vec![CandlePattern::Hammer]);
    }

    #[test]
    fn test_bullish_engulfing() {
        let candles = [
            neutral(),
            candle(102.0, 103.0, 99.0, 100.0), // bearish
            candle(99.5, 103.5, 99.0, 102.5),  // engulfs it
        ];
        let detected = detect_patterns(&candles, &[CandlePattern::BullishEngulfing]).unwrap();
        assert_eq!(detected, vec![CandlePattern::BullishEngulfing]);
    }

    #[test]
    fn test_bearish_engulfing() {
        let candles = [
            neutral(),
            candle(100.0, 103.0, 99.0, 102.0), // bullish
            candle(102.5, 103.0, 98.5, 99.5),  // engulfs it
        ];
        let detected = detect_patterns(&candles, &[CandlePattern::BearishEngulfing]).unwrap();
        assert_eq!(detected, vec![CandlePattern::BearishEngulfing]);
    }

    #[test]
    fn test_morning_star() {
        let candles = [
            candle(110.0, 111.0, 99.0, 100.0), // strong bearish
            candle(99.0, 100.0, 97.0, 99.5),   // small body
            candle(100.0, 109.0, 99.5, 108.0), // bullish above midpoint (105)
        ];
        let detected = detect_patterns(&candles, &[CandlePattern::MorningStar]).unwrap();
        assert_eq!(detected, vec![CandlePattern::MorningStar]);
    }

    #[test]
    fn test_evening_star() {
        let candles = [
            candle(100.0, 111.0, 99.0, 110.0), // strong bullish
            candle(111.0, 113.0, 110.0, 111.5), // small body
            candle(110.0, 110.5, 101.0, 102.0), // bearish below midpoint (105)
        ];
        let detected = detect_patterns(&candles, &[CandlePattern::EveningStar]).unwrap();
        assert_eq!(detected, vec![CandlePattern::EveningStar]);
    }

    #[test]
    fn test_unrequested_patterns_ignored() {
        let candles = [neutral(), neutral(), candle(100.0, 105.0, 95.0, 100.5)];
        let detected = detect_patterns(&candles, &[CandlePattern::Hammer]).unwrap();
        assert!(detected.is_empty());
    }
}
