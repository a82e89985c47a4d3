use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::market_data::kline_store::KlineStore;
use crate::application::signal::KlineProvider;
use crate::config::ScanConfig;
use crate::domain::market::{Candle, SeriesKey, Ticker, Timeframe};
use crate::infrastructure::bybit::{BybitRestClient, BybitWsManager};
use crate::infrastructure::core::rate_limiter::RateLimiter;

/// History fetched per series on bootstrap and on-demand backfill
const BOOTSTRAP_LIMIT: usize = 200;

/// Owns the market-data plumbing for one scan session.
///
/// On start it builds the symbol universe over REST, backfills kline history,
/// and hands live updates to the WebSocket manager. A background task polls
/// REST instead whenever the stream has exhausted its reconnect budget.
pub struct MarketDataFeed {
    config: Arc<ScanConfig>,
    store: Arc<KlineStore>,
    rest: Arc<BybitRestClient>,
    ws: Arc<BybitWsManager>,
    tickers: Arc<RwLock<HashMap<String, Ticker>>>,
    poll_handle: Mutex<Option<JoinHandle<()>>>,
}

impl MarketDataFeed {
    pub fn new(
        config: Arc<ScanConfig>,
        store: Arc<KlineStore>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        let rest = Arc::new(BybitRestClient::new(&config.rest, rate_limiter));
        let tickers = Arc::new(RwLock::new(HashMap::new()));
        let ws = Arc::new(BybitWsManager::new(
            &config.ws,
            config.category,
            store.clone(),
            tickers.clone(),
        ));
        Self {
            config,
            store,
            rest,
            ws,
            tickers,
            poll_handle: Mutex::new(None),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let symbols = self.refresh_universe().await?;
        if symbols.is_empty() {
            warn!("symbol universe is empty after filtering, nothing to stream");
            return Ok(());
        }
        info!(symbols = symbols.len(), "symbol universe built");

        self.bootstrap_klines(&symbols).await;

        let timeframes = self.required_timeframes();
        let mut topics = Vec::with_capacity(symbols.len() * (1 + timeframes.len()));
        for symbol in &symbols {
            topics.push(format!("tickers.{symbol}"));
            for timeframe in &timeframes {
                topics.push(format!(
                    "kline.{}.{}",
                    timeframe.to_bybit_interval(),
                    symbol
                ));
            }
        }
        self.ws.start(topics).await;

        let mut handle_guard = self.poll_handle.lock().await;
        if let Some(handle) = handle_guard.take() {
            handle.abort();
        }
        *handle_guard = Some(self.spawn_poll_fallback(symbols));
        Ok(())
    }

    pub async fn stop(&self) {
        let mut handle_guard = self.poll_handle.lock().await;
        if let Some(handle) = handle_guard.take() {
            handle.abort();
        }
        self.ws.stop().await;
        info!("market data feed stopped");
    }

    /// Current scan universe, turnover-ranked best first.
    ///
    /// Re-applies the volume floor so a symbol whose live turnover decays
    /// below it drops out between scans.
    pub fn active_symbols(&self) -> Vec<String> {
        let cache = self.tickers.read().unwrap_or_else(|e| e.into_inner());
        let mut ranked: Vec<(String, f64)> = cache
            .values()
            .filter(|t| t.turnover24h >= self.config.min_volume)
            .map(|t| (t.symbol.clone(), t.turnover24h))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(self.config.max_symbols);
        ranked.into_iter().map(|(symbol, _)| symbol).collect()
    }

    /// Primary and confirmation timeframes, deduplicated in order
    fn required_timeframes(&self) -> Vec<Timeframe> {
        let mut timeframes = Vec::new();
        for tf in self
            .config
            .timeframes
            .iter()
            .chain(self.config.confirm_timeframes.iter())
        {
            if !timeframes.contains(tf) {
                timeframes.push(*tf);
            }
        }
        timeframes
    }

    async fn refresh_universe(&self) -> Result<Vec<String>> {
        let rows = self
            .rest
            .get_tickers(self.config.category)
            .await
            .context("failed to fetch ticker universe")?;
        Ok(Self::apply_universe(&self.config, &self.tickers, rows))
    }

    /// Filters, ranks and caps a ticker snapshot, replacing the cache with
    /// the surviving rows. Shared by bootstrap and the degraded poll loop
    /// so both transports keep the universe fresh.
    fn apply_universe(
        config: &ScanConfig,
        tickers: &RwLock<HashMap<String, Ticker>>,
        mut rows: Vec<Ticker>,
    ) -> Vec<String> {
        rows.retain(|t| {
            t.symbol.ends_with(&config.quote_asset) && t.turnover24h >= config.min_volume
        });
        rows.sort_by(|a, b| b.turnover24h.total_cmp(&a.turnover24h));
        rows.truncate(config.max_symbols);

        let symbols: Vec<String> = rows.iter().map(|t| t.symbol.clone()).collect();
        let mut cache = tickers.write().unwrap_or_else(|e| e.into_inner());
        cache.clear();
        for ticker in rows {
            cache.insert(ticker.symbol.clone(), ticker);
        }
        symbols
    }

    /// Seeds history for every symbol and timeframe; one failed series is
    /// logged and skipped, not fatal for the session.
    async fn bootstrap_klines(&self, symbols: &[String]) {
        let timeframes = self.required_timeframes();
        for symbol in symbols {
            for timeframe in &timeframes {
                match self
                    .rest
                    .get_klines(self.config.category, symbol, *timeframe, BOOTSTRAP_LIMIT)
                    .await
                {
                    Ok(candles) => {
                        let key = SeriesKey::new(symbol, *timeframe, self.config.category);
                        self.merge_series(&key, candles);
                    }
                    Err(e) => warn!(%symbol, %timeframe, "kline bootstrap failed: {e}"),
                }
            }
        }
        info!("kline history bootstrapped");
    }

    /// Merges an oldest-first REST batch into the store without reordering
    /// a series the stream may already have advanced past the batch.
    fn merge_series(&self, key: &SeriesKey, candles: Vec<Candle>) {
        let newest_known = self.store.latest(key).map(|c| c.open_time);
        for candle in candles {
            if newest_known.is_none_or(|t| candle.open_time >= t) {
                self.store.upsert(key, candle);
            }
        }
    }

    fn spawn_poll_fallback(&self, symbols: Vec<String>) -> JoinHandle<()> {
        let config = self.config.clone();
        let store = self.store.clone();
        let rest = self.rest.clone();
        let ws = self.ws.clone();
        let tickers = self.tickers.clone();
        let timeframes = self.required_timeframes();
        let mut symbols = symbols;

        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(config.scan_interval_secs.max(1)));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !ws.is_degraded() {
                    continue;
                }
                debug!("stream degraded, polling tickers and klines over REST");
                // Keep turnover ranking live; the stream no longer feeds
                // the ticker cache
                match rest.get_tickers(config.category).await {
                    Ok(rows) => {
                        symbols = MarketDataFeed::apply_universe(&config, &tickers, rows);
                    }
                    Err(e) => warn!("ticker poll failed, keeping last universe: {e}"),
                }
                for symbol in &symbols {
                    for timeframe in &timeframes {
                        match rest
                            .get_klines(config.category, symbol, *timeframe, BOOTSTRAP_LIMIT)
                            .await
                        {
                            Ok(candles) => {
                                let key = SeriesKey::new(symbol, *timeframe, config.category);
                                let newest_known = store.latest(&key).map(|c| c.open_time);
                                for candle in candles {
                                    if newest_known.is_none_or(|t| candle.open_time >= t) {
                                        store.upsert(&key, candle);
                                    }
                                }
                            }
                            Err(e) => warn!(%symbol, %timeframe, "kline poll failed: {e}"),
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl KlineProvider for MarketDataFeed {
    /// Serves from the in-memory store when it holds enough history,
    /// otherwise backfills the series over REST first.
    async fn klines(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Candle>> {
        let key = SeriesKey::new(symbol, timeframe, self.config.category);
        let cached = self.store.series(&key);
        if cached.len() >= self.config.min_candles {
            return Ok(cached);
        }

        let fetched = self
            .rest
            .get_klines(self.config.category, symbol, timeframe, BOOTSTRAP_LIMIT)
            .await
            .with_context(|| format!("kline backfill failed for {symbol} {timeframe}"))?;
        self.merge_series(&key, fetched);
        Ok(self.store.series(&key))
    }
}
