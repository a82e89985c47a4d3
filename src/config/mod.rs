//! Configuration module for brisk.
//!
//! One immutable [`ScanConfig`] is constructed per scan session (from
//! defaults, a TOML file, or environment variables) and passed by
//! reference into the signal engine and confirmation coordinator; nothing
//! in the core reads configuration storage at evaluation time.

use crate::application::indicators::CandlePattern;
use crate::domain::market::{IndicatorKind, MarketCategory, Timeframe};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Per-indicator parameters, defaulting to the classic settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub bb_margin: f64,

    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,

    pub kdj_period: usize,
    pub kdj_k: usize,
    pub kdj_d: usize,

    pub sar_step: f64,
    pub sar_max_step: f64,
    pub sar_margin: f64,

    /// Retracement levels as percentages
    pub fib_levels: Vec<f64>,
    /// Trailing close window the retracement is computed over
    pub fib_window: usize,

    pub candle_patterns: Vec<CandlePattern>,

    pub ichimoku_tenkan: usize,
    pub ichimoku_kijun: usize,
    pub ichimoku_senkou_b: usize,

    pub donchian_period: usize,

    pub stoch_k_period: usize,
    pub stoch_d_period: usize,
    pub stoch_smooth: usize,

    pub supertrend_period: usize,
    pub supertrend_multiplier: f64,

    pub ema_periods: [usize; 5],
    pub ma_periods: [usize; 5],

    pub adx_period: usize,

    pub stoch_rsi_periods: [usize; 5],
    pub rsi_periods: [usize; 5],
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            bb_period: 20,
            bb_std_dev: 2.0,
            bb_margin: 0.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            kdj_period: 9,
            kdj_k: 3,
            kdj_d: 3,
            sar_step: 0.02,
            sar_max_step: 0.2,
            sar_margin: 0.0,
            fib_levels: vec![23.6, 38.2, 50.0, 61.8],
            fib_window: 50,
            candle_patterns: CandlePattern::all(),
            ichimoku_tenkan: 9,
            ichimoku_kijun: 26,
            ichimoku_senkou_b: 52,
            donchian_period: 20,
            stoch_k_period: 14,
            stoch_d_period: 3,
            stoch_smooth: 3,
            supertrend_period: 10,
            supertrend_multiplier: 3.0,
            ema_periods: [10, 20, 50, 100, 200],
            ma_periods: [10, 20, 50, 100, 200],
            adx_period: 14,
            stoch_rsi_periods: [14; 5],
            rsi_periods: [14; 5],
        }
    }
}

/// REST transport profile
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    pub base_url: String,
    /// Requests allowed per fixed window
    pub request_limit: usize,
    pub window_secs: u64,
    /// Fixed cooldown after an HTTP 429 before the single retry
    pub rate_limit_cooldown_secs: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bybit.com".to_string(),
            request_limit: 40,
            window_secs: 10,
            rate_limit_cooldown_secs: 10,
        }
    }
}

/// WebSocket transport profile
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WsConfig {
    pub base_url: String,
    pub ping_interval_secs: u64,
    pub max_reconnect_attempts: u32,
    /// Subscription topics sent per drain tick (one tick per second)
    pub subscriptions_per_second: usize,
}

impl WsConfig {
    /// Public stream endpoint for a market category
    pub fn url_for(&self, category: MarketCategory) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), category)
    }
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            base_url: "wss://stream.bybit.com/v5/public".to_string(),
            ping_interval_secs: 20,
            max_reconnect_attempts: 5,
            subscriptions_per_second: 10,
        }
    }
}

/// Immutable per-session scanner configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub category: MarketCategory,
    /// Quote currency suffix symbols must carry
    pub quote_asset: String,
    /// Minimum 24h turnover for a symbol to enter the universe
    pub min_volume: f64,
    /// Turnover-ranked cap on the scanned universe
    pub max_symbols: usize,
    /// Primary timeframes evaluated per symbol
    pub timeframes: Vec<Timeframe>,
    /// Timeframes that must agree with the primary before acceptance
    pub confirm_timeframes: Vec<Timeframe>,
    /// Series length below which the engine returns no opinion
    pub min_candles: usize,
    pub scan_interval_secs: u64,
    pub enabled_indicators: Vec<IndicatorKind>,
    pub indicators: IndicatorParams,
    pub rest: RestConfig,
    pub ws: WsConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            category: MarketCategory::Spot,
            quote_asset: "USDT".to_string(),
            min_volume: 100_000.0,
            max_symbols: 30,
            timeframes: vec![Timeframe::OneHour],
            confirm_timeframes: vec![],
            min_candles: 50,
            scan_interval_secs: 30,
            enabled_indicators: IndicatorKind::all(),
            indicators: IndicatorParams::default(),
            rest: RestConfig::default(),
            ws: WsConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Loads configuration from a TOML file; missing keys keep defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        toml::from_str(&raw).context("Failed to parse scan config")
    }

    /// Builds configuration from environment variables over defaults.
    ///
    /// Recognized variables: `BRISK_CATEGORY`, `BRISK_QUOTE_ASSET`,
    /// `BRISK_MIN_VOLUME`, `BRISK_MAX_SYMBOLS`, `BRISK_TIMEFRAMES`,
    /// `BRISK_CONFIRM_TIMEFRAMES`, `BRISK_INDICATORS`,
    /// `BRISK_MIN_CANDLES`, `BRISK_SCAN_INTERVAL`, `BRISK_REST_URL`,
    /// `BRISK_WS_URL`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(v) = env::var("BRISK_CATEGORY") {
            config.category = MarketCategory::from_str(&v)?;
        }
        if let Ok(v) = env::var("BRISK_QUOTE_ASSET") {
            config.quote_asset = v;
        }
        if let Ok(v) = env::var("BRISK_MIN_VOLUME") {
            config.min_volume = v.parse().context("Invalid BRISK_MIN_VOLUME")?;
        }
        if let Ok(v) = env::var("BRISK_MAX_SYMBOLS") {
            config.max_symbols = v.parse().context("Invalid BRISK_MAX_SYMBOLS")?;
        }
        if let Ok(v) = env::var("BRISK_TIMEFRAMES") {
            config.timeframes = parse_csv(&v)?;
        }
        if let Ok(v) = env::var("BRISK_CONFIRM_TIMEFRAMES") {
            config.confirm_timeframes = parse_csv(&v)?;
        }
        if let Ok(v) = env::var("BRISK_INDICATORS") {
            config.enabled_indicators = parse_csv(&v)?;
        }
        if let Ok(v) = env::var("BRISK_MIN_CANDLES") {
            config.min_candles = v.parse().context("Invalid BRISK_MIN_CANDLES")?;
        }
        if let Ok(v) = env::var("BRISK_SCAN_INTERVAL") {
            config.scan_interval_secs = v.parse().context("Invalid BRISK_SCAN_INTERVAL")?;
        }
        if let Ok(v) = env::var("BRISK_REST_URL") {
            config.rest.base_url = v;
        }
        if let Ok(v) = env::var("BRISK_WS_URL") {
            config.ws.base_url = v;
        }

        if config.timeframes.is_empty() {
            anyhow::bail!("At least one primary timeframe must be configured");
        }
        Ok(config)
    }
}

fn parse_csv<T: FromStr<Err = anyhow::Error>>(raw: &str) -> Result<Vec<T>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(T::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_settings() {
        let config = ScanConfig::default();
        assert_eq!(config.indicators.bb_period, 20);
        assert_eq!(config.indicators.macd_slow, 26);
        assert_eq!(config.indicators.ema_periods, [10, 20, 50, 100, 200]);
        assert_eq!(config.min_candles, 50);
        assert_eq!(config.rest.request_limit, 40);
        assert_eq!(config.enabled_indicators.len(), IndicatorKind::all().len());
    }

    #[test]
    fn test_toml_overrides_keep_defaults_elsewhere() {
        let raw = r#"
            category = "linear"
            min_volume = 250000.0
            timeframes = ["FifteenMin", "OneHour"]

            [indicators]
            bb_period = 30
        "#;
        let config: ScanConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.category, MarketCategory::Linear);
        assert_eq!(config.min_volume, 250_000.0);
        assert_eq!(config.timeframes.len(), 2);
        assert_eq!(config.indicators.bb_period, 30);
        // Untouched keys keep defaults
        assert_eq!(config.indicators.macd_fast, 12);
        assert_eq!(config.max_symbols, 30);
    }

    #[test]
    fn test_ws_url_for_category() {
        let ws = WsConfig::default();
        assert_eq!(
            ws.url_for(MarketCategory::Spot),
            "wss://stream.bybit.com/v5/public/spot"
        );
        assert_eq!(
            ws.url_for(MarketCategory::Linear),
            "wss://stream.bybit.com/v5/public/linear"
        );
    }

    #[test]
    fn test_parse_csv_timeframes() {
        let parsed: Vec<Timeframe> = parse_csv("1m, 1h,4h").unwrap();
        assert_eq!(
            parsed,
            vec![Timeframe::OneMin, Timeframe::OneHour, Timeframe::FourHour]
        );
        assert!(parse_csv::<Timeframe>("1m,bogus").is_err());
    }
}
