use crate::application::indicators;
use crate::config::{IndicatorParams, ScanConfig};
use crate::domain::market::{Candle, Direction, IndicatorKind, IndicatorVote, Signal, Timeframe};
use tracing::trace;

/// Fuses per-indicator votes over one candle window into a single signal.
///
/// Stateless: every evaluation reads only the series snapshot and the
/// session configuration.
pub struct SignalEngine;

impl SignalEngine {
    /// Evaluates every enabled indicator against the series and fuses the
    /// votes. Returns `None` below the configured minimum history or when
    /// no indicator votes; transport concerns never reach this layer.
    pub fn evaluate(
        candles: &[Candle],
        config: &ScanConfig,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Option<Signal> {
        if candles.len() < config.min_candles {
            trace!(
                symbol,
                %timeframe,
                len = candles.len(),
                "Insufficient kline history for evaluation"
            );
            return None;
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let price = *closes.last()?;

        let mut votes = Vec::new();
        for kind in &config.enabled_indicators {
            if let Some(direction) =
                indicator_vote(*kind, candles, &closes, &highs, &lows, price, &config.indicators)
            {
                votes.push(IndicatorVote {
                    name: kind.label(),
                    direction,
                });
            }
        }

        Signal::from_votes(&votes, price, symbol, timeframe)
    }
}

/// One indicator's opinion: BUY, SELL, or abstain (`None`).
///
/// Insufficient data for an indicator is an abstention, never an error.
fn indicator_vote(
    kind: IndicatorKind,
    candles: &[Candle],
    closes: &[f64],
    highs: &[f64],
    lows: &[f64],
    price: f64,
    params: &IndicatorParams,
) -> Option<Direction> {
    match kind {
        IndicatorKind::Bollinger => {
            let bb =
                indicators::bollinger(closes, params.bb_period, params.bb_std_dev, params.bb_margin)?;
            if price <= bb.lower {
                Some(Direction::Buy)
            } else if price >= bb.upper {
                Some(Direction::Sell)
            } else {
                None
            }
        }
        IndicatorKind::Macd => {
            let m = indicators::macd(closes, params.macd_fast, params.macd_slow, params.macd_signal)?;
            if m.macd > m.signal_line {
                Some(Direction::Buy)
            } else if m.macd < m.signal_line {
                Some(Direction::Sell)
            } else {
                None
            }
        }
        IndicatorKind::Kdj => {
            let out = indicators::kdj(
                highs,
                lows,
                closes,
                params.kdj_period,
                params.kdj_k,
                params.kdj_d,
            )?;
            oversold_overbought_vote(out.k, out.d)
        }
        IndicatorKind::Sar => {
            let sar = indicators::parabolic_sar(
                highs,
                lows,
                params.sar_step,
                params.sar_max_step,
                params.sar_margin,
            )?;
            if price > sar {
                Some(Direction::Buy)
            } else if price < sar {
                Some(Direction::Sell)
            } else {
                None
            }
        }
        IndicatorKind::Fibonacci => {
            let window = &closes[closes.len().saturating_sub(params.fib_window)..];
            let levels = indicators::fibonacci_levels(window, &params.fib_levels)?;
            let closest = levels
                .into_iter()
                .min_by(|a, b| {
                    (a - price)
                        .abs()
                        .partial_cmp(&(b - price).abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })?;
            // Within 1% of the nearest retracement level: BUY only
            if price <= closest * 1.01 && price >= closest * 0.99 {
                Some(Direction::Buy)
            } else {
                None
            }
        }
        IndicatorKind::CandlePatterns => {
            let detected = indicators::detect_patterns(candles, &params.candle_patterns)?;
            if detected.iter().any(|p| p.is_bullish()) {
                Some(Direction::Buy)
            } else if !detected.is_empty() {
                Some(Direction::Sell)
            } else {
                None
            }
        }
        IndicatorKind::Ichimoku => {
            let cloud = indicators::ichimoku(
                candles,
                params.ichimoku_tenkan,
                params.ichimoku_kijun,
                params.ichimoku_senkou_b,
            )?;
            if price > cloud.senkou_a && price > cloud.senkou_b {
                Some(Direction::Buy)
            } else if price < cloud.senkou_a && price < cloud.senkou_b {
                Some(Direction::Sell)
            } else {
                None
            }
        }
        IndicatorKind::Donchian => {
            let channel = indicators::donchian(highs, lows, params.donchian_period)?;
            if price >= channel.upper {
                Some(Direction::Buy)
            } else if price <= channel.lower {
                Some(Direction::Sell)
            } else {
                None
            }
        }
        IndicatorKind::Stochastic => {
            let out = indicators::stochastic(
                highs,
                lows,
                closes,
                params.stoch_k_period,
                params.stoch_d_period,
                params.stoch_smooth,
            )?;
            oversold_overbought_vote(out.k, out.d)
        }
        IndicatorKind::Supertrend => {
            let bands = indicators::supertrend(
                candles,
                params.supertrend_period,
                params.supertrend_multiplier,
            )?;
            if price > bands.upper {
                Some(Direction::Buy)
            } else if price < bands.lower {
                Some(Direction::Sell)
            } else {
                None
            }
        }
        IndicatorKind::EmaStack => {
            breadth_vote(price, &stack_values(closes, &params.ema_periods, indicators::ema)?)
        }
        IndicatorKind::MaStack => {
            breadth_vote(price, &stack_values(closes, &params.ma_periods, indicators::sma)?)
        }
        IndicatorKind::Adx => {
            // Momentum confirmation only: no SELL branch
            let value = indicators::adx(candles, params.adx_period)?;
            (value > 25.0).then_some(Direction::Buy)
        }
        IndicatorKind::StochRsiStack => {
            let readings: Vec<f64> = params
                .stoch_rsi_periods
                .iter()
                .filter_map(|&p| indicators::stoch_rsi(closes, p))
                .map(|s| s.k)
                .collect();
            any_threshold_vote(&readings, 20.0, 80.0)
        }
        IndicatorKind::RsiStack => {
            let readings: Vec<f64> = params
                .rsi_periods
                .iter()
                .filter_map(|&p| indicators::rsi(closes, p))
                .collect();
            any_threshold_vote(&readings, 30.0, 70.0)
        }
    }
}

/// Oversold-and-rising / overbought-and-falling rule shared by KDJ and
/// Stochastic
fn oversold_overbought_vote(k: f64, d: f64) -> Option<Direction> {
    if k < 20.0 && k > d {
        Some(Direction::Buy)
    } else if k > 80.0 && k < d {
        Some(Direction::Sell)
    } else {
        None
    }
}

/// Evaluates a multi-period stack; `None` unless every period resolves
fn stack_values(
    closes: &[f64],
    periods: &[usize; 5],
    f: fn(&[f64], usize) -> Option<f64>,
) -> Option<Vec<f64>> {
    periods.iter().map(|&p| f(closes, p)).collect()
}

/// Breadth check: price above/below every stack value except the shortest
/// period, which is excluded from the comparison
fn breadth_vote(price: f64, values: &[f64]) -> Option<Direction> {
    if values.iter().skip(1).all(|v| price > *v) {
        Some(Direction::Buy)
    } else if values.iter().skip(1).all(|v| price < *v) {
        Some(Direction::Sell)
    } else {
        None
    }
}

/// BUY when any reading is under `low`, otherwise SELL when any is over
/// `high`
fn any_threshold_vote(readings: &[f64], low: f64, high: f64) -> Option<Direction> {
    if readings.iter().any(|r| *r < low) {
        Some(Direction::Buy)
    } else if readings.iter().any(|r| *r > high) {
        Some(Direction::Sell)
    } else {
        None
    }
}
