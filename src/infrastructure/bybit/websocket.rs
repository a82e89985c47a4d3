use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::application::market_data::kline_store::KlineStore;
use crate::config::WsConfig;
use crate::domain::market::{Candle, MarketCategory, SeriesKey, Ticker, Timeframe};

/// Streams Bybit v5 public ticker and kline topics into the shared caches.
///
/// Subscriptions are throttled through a queue drained once per second, the
/// connection is kept alive with `{"op":"ping"}` frames, and a dropped
/// connection is retried with exponential backoff. Once the retry budget is
/// spent the manager marks itself degraded and REST polling takes over for
/// the rest of the session.
pub struct BybitWsManager {
    url: String,
    ping_interval: Duration,
    max_reconnect_attempts: u32,
    subscriptions_per_second: usize,
    category: MarketCategory,
    store: Arc<KlineStore>,
    tickers: Arc<RwLock<HashMap<String, Ticker>>>,
    degraded: Arc<AtomicBool>,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

struct StreamContext {
    url: String,
    ping_interval: Duration,
    subscriptions_per_second: usize,
    topics: Vec<String>,
    category: MarketCategory,
    store: Arc<KlineStore>,
    tickers: Arc<RwLock<HashMap<String, Ticker>>>,
}

impl BybitWsManager {
    pub fn new(
        config: &WsConfig,
        category: MarketCategory,
        store: Arc<KlineStore>,
        tickers: Arc<RwLock<HashMap<String, Ticker>>>,
    ) -> Self {
        Self {
            url: config.url_for(category),
            ping_interval: Duration::from_secs(config.ping_interval_secs),
            max_reconnect_attempts: config.max_reconnect_attempts,
            subscriptions_per_second: config.subscriptions_per_second.max(1),
            category,
            store,
            tickers,
            degraded: Arc::new(AtomicBool::new(false)),
            task_handle: Mutex::new(None),
        }
    }

    /// Replaces the active stream task with one subscribed to `topics`.
    pub async fn start(&self, topics: Vec<String>) {
        let mut handle_guard = self.task_handle.lock().await;
        if let Some(handle) = handle_guard.take() {
            debug!("aborting previous stream task");
            handle.abort();
        }
        self.degraded.store(false, Ordering::SeqCst);

        if topics.is_empty() {
            info!("no stream topics requested, not spawning a stream task");
            return;
        }

        let ctx = StreamContext {
            url: self.url.clone(),
            ping_interval: self.ping_interval,
            subscriptions_per_second: self.subscriptions_per_second,
            topics,
            category: self.category,
            store: self.store.clone(),
            tickers: self.tickers.clone(),
        };
        let max_attempts = self.max_reconnect_attempts;
        let degraded = self.degraded.clone();

        *handle_guard = Some(tokio::spawn(async move {
            Self::run_stream(ctx, max_attempts, degraded).await;
        }));
    }

    pub async fn stop(&self) {
        let mut handle_guard = self.task_handle.lock().await;
        if let Some(handle) = handle_guard.take() {
            handle.abort();
            info!("stream task stopped");
        }
    }

    /// True once the reconnect budget is spent for this session
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    async fn run_stream(ctx: StreamContext, max_attempts: u32, degraded: Arc<AtomicBool>) {
        let mut attempt: u32 = 0;
        loop {
            match Self::connect_and_stream(&ctx).await {
                Ok(()) => info!("stream connection closed by server"),
                Err(e) => error!("stream connection failed: {e:#}"),
            }

            attempt += 1;
            if attempt > max_attempts {
                warn!(
                    max_attempts,
                    "reconnect budget spent, REST polling takes over for this session"
                );
                degraded.store(true, Ordering::SeqCst);
                return;
            }

            let delay = reconnect_delay(attempt);
            info!(attempt, delay_ms = delay.as_millis() as u64, "reconnecting stream");
            tokio::time::sleep(delay).await;
        }
    }

    async fn connect_and_stream(ctx: &StreamContext) -> Result<()> {
        info!(url = %ctx.url, topics = ctx.topics.len(), "connecting stream");
        let (ws_stream, _) = connect_async(&ctx.url)
            .await
            .context("failed to connect public stream")?;
        let (mut write, mut read) = ws_stream.split();

        // Single writer task; everything else sends through the channel
        let (ws_tx, mut ws_rx) = mpsc::channel::<Message>(100);
        let writer = tokio::spawn(async move {
            while let Some(msg) = ws_rx.recv().await {
                if write.send(msg).await.is_err() {
                    break;
                }
            }
        });

        let ping_tx = ws_tx.clone();
        let ping_interval = ctx.ping_interval;
        let pinger = tokio::spawn(async move {
            let mut interval = tokio::time::interval(ping_interval);
            interval.tick().await;
            loop {
                interval.tick().await;
                let ping = r#"{"op":"ping"}"#.to_string();
                if ping_tx.send(Message::Text(ping.into())).await.is_err() {
                    break;
                }
            }
        });

        // Drain the subscription queue in per-second batches; Bybit caps
        // subscribe commands, so a fresh connection must not burst them all
        let sub_tx = ws_tx.clone();
        let mut queue: VecDeque<String> = ctx.topics.iter().cloned().collect();
        let batch_size = ctx.subscriptions_per_second;
        let subscriber = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            while !queue.is_empty() {
                interval.tick().await;
                let batch: Vec<String> = queue
                    .drain(..batch_size.min(queue.len()))
                    .collect();
                debug!(topics = batch.len(), "sending subscribe batch");
                let msg = serde_json::json!({ "op": "subscribe", "args": batch });
                if sub_tx.send(Message::Text(msg.to_string().into())).await.is_err() {
                    break;
                }
            }
        });

        let outcome = loop {
            let Some(msg_result) = read.next().await else {
                break Ok(());
            };
            match msg_result {
                Ok(Message::Text(text)) => {
                    if let Err(e) =
                        handle_message(&text, ctx.category, &ctx.store, &ctx.tickers)
                    {
                        warn!("failed to handle stream message: {e:#}");
                    }
                }
                Ok(Message::Ping(payload)) => {
                    let _ = ws_tx.send(Message::Pong(payload)).await;
                }
                Ok(Message::Pong(_)) => debug!("pong received"),
                Ok(Message::Close(frame)) => {
                    info!(?frame, "stream closed by server");
                    break Ok(());
                }
                Err(e) => break Err(anyhow!("stream read error: {e}")),
                _ => {}
            }
        };

        subscriber.abort();
        pinger.abort();
        writer.abort();
        outcome
    }
}

/// Backoff before reconnect attempt `attempt` (1-based): 1s doubling per
/// prior failure, capped at 30s
fn reconnect_delay(attempt: u32) -> Duration {
    let delay_ms = 1000u64
        .saturating_mul(1u64 << attempt.saturating_sub(1).min(15))
        .min(30_000);
    Duration::from_millis(delay_ms)
}

/// Routes one text frame into the kline store or the ticker cache.
///
/// Control frames (`op` echoes, subscribe acks) are ignored; malformed data
/// frames are dropped with an error so one bad payload never kills the
/// connection.
fn handle_message(
    text: &str,
    category: MarketCategory,
    store: &KlineStore,
    tickers: &RwLock<HashMap<String, Ticker>>,
) -> Result<()> {
    let value: Value = serde_json::from_str(text).context("invalid stream JSON")?;

    if value.get("op").is_some() || value.get("success").is_some() {
        debug!("stream control frame: {text}");
        return Ok(());
    }
    let Some(topic) = value.get("topic").and_then(Value::as_str) else {
        return Ok(());
    };

    if let Some(rest) = topic.strip_prefix("kline.") {
        let (interval, symbol) = rest
            .split_once('.')
            .ok_or_else(|| anyhow!("malformed kline topic: {topic}"))?;
        let timeframe = Timeframe::from_str(interval)?;
        let rows = value
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("kline frame without data array"))?;

        // Parse the whole frame before touching the store: a malformed row
        // drops the frame with the series left unchanged
        let mut candles = Vec::with_capacity(rows.len());
        for row in rows {
            candles.push(parse_kline_frame(row, timeframe)?);
        }
        let key = SeriesKey::new(symbol, timeframe, category);
        for candle in candles {
            store.upsert(&key, candle);
        }
    } else if let Some(symbol) = topic.strip_prefix("tickers.") {
        let Some(data) = value.get("data") else {
            return Ok(());
        };
        update_ticker(tickers, symbol, data);
    }

    Ok(())
}

fn parse_kline_frame(row: &Value, timeframe: Timeframe) -> Result<Candle> {
    let open_time = row
        .get("start")
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow!("kline frame without start time"))?;
    let field = |name: &str| -> Result<f64> {
        row.get(name)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| anyhow!("bad kline field {name}"))
    };
    Ok(Candle {
        open_time,
        open: field("open")?,
        high: field("high")?,
        low: field("low")?,
        close: field("close")?,
        volume: field("volume")?,
        close_time: open_time + timeframe.duration_ms(),
    })
}

/// Ticker deltas may carry only the changed fields; merge into the snapshot.
fn update_ticker(tickers: &RwLock<HashMap<String, Ticker>>, symbol: &str, data: &Value) {
    let string_field = |name: &str| -> Option<f64> {
        data.get(name)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<f64>().ok())
    };
    let last_price = string_field("lastPrice");
    let turnover24h = string_field("turnover24h");

    let mut cache = tickers.write().unwrap_or_else(|e| e.into_inner());
    let entry = cache.entry(symbol.to_string()).or_insert_with(|| Ticker {
        symbol: symbol.to_string(),
        turnover24h: 0.0,
        last_price: 0.0,
    });
    if let Some(last_price) = last_price {
        entry.last_price = last_price;
    }
    if let Some(turnover24h) = turnover24h {
        entry.turnover24h = turnover24h;
    }
}
