use super::timeframe::Timeframe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Direction of a single indicator vote or a fused signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// One opinion from one indicator evaluated on one series snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorVote {
    pub name: &'static str,
    pub direction: Direction,
}

/// A fused directional signal handed to the presentation collaborator.
///
/// Value type: constructed fresh per evaluation, never mutated. The core
/// holds no signal history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    pub price: f64,
    /// Fraction of votes agreeing with the winning direction, in (0, 1]
    pub strength: f64,
    /// Contributing indicator names, deduplicated for display
    pub contributing: BTreeSet<String>,
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Wall-clock emission timestamp in milliseconds
    pub timestamp: i64,
}

impl Signal {
    /// Fuses raw per-indicator votes into a signal.
    ///
    /// Returns `None` when no indicator voted. The direction is BUY only
    /// on a strict buy majority; ties resolve to SELL. Strength counts
    /// raw votes even when the same indicator name appears twice;
    /// `contributing` deduplicates names for display only.
    pub fn from_votes(
        votes: &[IndicatorVote],
        price: f64,
        symbol: impl Into<String>,
        timeframe: Timeframe,
    ) -> Option<Self> {
        let buy_count = votes
            .iter()
            .filter(|v| v.direction == Direction::Buy)
            .count();
        let sell_count = votes.len() - buy_count;
        let total = buy_count + sell_count;
        if total == 0 {
            return None;
        }

        let direction = if buy_count > sell_count {
            Direction::Buy
        } else {
            Direction::Sell
        };

        Some(Signal {
            direction,
            price,
            strength: buy_count.max(sell_count) as f64 / total as f64,
            contributing: votes.iter().map(|v| v.name.to_string()).collect(),
            symbol: symbol.into(),
            timeframe,
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(name: &'static str, direction: Direction) -> IndicatorVote {
        IndicatorVote { name, direction }
    }

    #[test]
    fn test_no_votes_no_signal() {
        assert!(Signal::from_votes(&[], 1.0, "BTCUSDT", Timeframe::OneHour).is_none());
    }

    #[test]
    fn test_strict_majority_selects_buy() {
        let votes = [
            vote("BB", Direction::Buy),
            vote("MACD", Direction::Buy),
            vote("SAR", Direction::Sell),
        ];
        let signal = Signal::from_votes(&votes, 1.0, "BTCUSDT", Timeframe::OneHour).unwrap();
        assert_eq!(signal.direction, Direction::Buy);
        assert!((signal.strength - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_tie_resolves_to_sell() {
        let votes = [vote("BB", Direction::Buy), vote("SAR", Direction::Sell)];
        let signal = Signal::from_votes(&votes, 1.0, "BTCUSDT", Timeframe::OneHour).unwrap();
        assert_eq!(signal.direction, Direction::Sell);
        assert!((signal.strength - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_names_count_raw_but_display_deduped() {
        let votes = [
            vote("RSI", Direction::Buy),
            vote("RSI", Direction::Buy),
            vote("SAR", Direction::Sell),
        ];
        let signal = Signal::from_votes(&votes, 1.0, "BTCUSDT", Timeframe::OneHour).unwrap();
        assert_eq!(signal.direction, Direction::Buy);
        assert!((signal.strength - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(signal.contributing.len(), 2);
    }

    #[test]
    fn test_strength_always_in_unit_interval() {
        let votes = [vote("BB", Direction::Buy)];
        let signal = Signal::from_votes(&votes, 1.0, "BTCUSDT", Timeframe::OneHour).unwrap();
        assert!(signal.strength > 0.0 && signal.strength <= 1.0);
        assert!((signal.strength - 1.0).abs() < 1e-12);
    }
}
