use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::market_data::{KlineStore, MarketDataFeed};
use crate::application::signal::ConfirmationCoordinator;
use crate::config::ScanConfig;
use crate::domain::market::Signal;
use crate::infrastructure::core::rate_limiter::RateLimiter;

/// Drives the scan cycle: Idle until started, then walks the symbol universe
/// on a fixed interval and pushes every confirmed signal into the channel.
///
/// `start` and `stop` are idempotent; repeating the current state is a no-op.
pub struct ScanOrchestrator {
    config: Arc<ScanConfig>,
    feed: Arc<MarketDataFeed>,
    signal_tx: mpsc::Sender<Signal>,
    scan_task: Mutex<Option<JoinHandle<()>>>,
}

impl ScanOrchestrator {
    pub fn new(config: ScanConfig, signal_tx: mpsc::Sender<Signal>) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(KlineStore::new());
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rest.request_limit,
            Duration::from_secs(config.rest.window_secs),
        ));
        let feed = Arc::new(MarketDataFeed::new(config.clone(), store, rate_limiter));
        Self {
            config,
            feed,
            signal_tx,
            scan_task: Mutex::new(None),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let mut task_guard = self.scan_task.lock().await;
        if task_guard.is_some() {
            debug!("scan already running, start ignored");
            return Ok(());
        }

        self.feed.start().await?;

        let config = self.config.clone();
        let feed = self.feed.clone();
        let signal_tx = self.signal_tx.clone();
        *task_guard = Some(tokio::spawn(async move {
            Self::scan_loop(config, feed, signal_tx).await;
        }));
        info!(
            interval_secs = self.config.scan_interval_secs,
            timeframes = self.config.timeframes.len(),
            "scan started"
        );
        Ok(())
    }

    pub async fn stop(&self) {
        let mut task_guard = self.scan_task.lock().await;
        let Some(handle) = task_guard.take() else {
            debug!("scan already idle, stop ignored");
            return;
        };
        handle.abort();
        self.feed.stop().await;
        info!("scan stopped");
    }

    pub async fn is_scanning(&self) -> bool {
        self.scan_task.lock().await.is_some()
    }

    async fn scan_loop(
        config: Arc<ScanConfig>,
        feed: Arc<MarketDataFeed>,
        signal_tx: mpsc::Sender<Signal>,
    ) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(config.scan_interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let symbols = feed.active_symbols();
            debug!(symbols = symbols.len(), "scan cycle begins");

            for symbol in &symbols {
                for timeframe in &config.timeframes {
                    let Some(signal) =
                        ConfirmationCoordinator::confirm(feed.as_ref(), &config, symbol, *timeframe)
                            .await
                    else {
                        continue;
                    };
                    info!(
                        symbol = %signal.symbol,
                        timeframe = %signal.timeframe,
                        direction = %signal.direction,
                        strength = signal.strength,
                        "signal confirmed"
                    );
                    if signal_tx.send(signal).await.is_err() {
                        warn!("signal receiver dropped, ending scan loop");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let (tx, _rx) = mpsc::channel(8);
        let orchestrator = ScanOrchestrator::new(ScanConfig::default(), tx);
        assert!(!orchestrator.is_scanning().await);
        orchestrator.stop().await;
        orchestrator.stop().await;
        assert!(!orchestrator.is_scanning().await);
    }
}
