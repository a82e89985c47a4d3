use super::engine::SignalEngine;
use crate::config::ScanConfig;
use crate::domain::market::{Candle, Signal, Timeframe};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Source of candle series for signal evaluation.
///
/// Implementations may serve from the in-memory store or fetch over REST;
/// the coordinator does not care which.
#[async_trait]
pub trait KlineProvider: Send + Sync {
    async fn klines(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Candle>>;
}

/// Multi-timeframe agreement gate in front of the signal engine
pub struct ConfirmationCoordinator;

impl ConfirmationCoordinator {
    /// Evaluates the primary timeframe, then requires every configured
    /// confirmation timeframe (primary skipped) to produce a signal in
    /// the same direction.
    ///
    /// Fail-fast: short-circuits on the first timeframe that disagrees or
    /// has no evaluable data. A provider error counts as missing data and
    /// rejects the candidate for this cycle; nothing propagates upward.
    pub async fn confirm(
        provider: &dyn KlineProvider,
        config: &ScanConfig,
        symbol: &str,
        primary: Timeframe,
    ) -> Option<Signal> {
        let candles = match provider.klines(symbol, primary).await {
            Ok(candles) => candles,
            Err(e) => {
                warn!(symbol, %primary, "Kline fetch failed, skipping this cycle: {:#}", e);
                return None;
            }
        };
        let signal = SignalEngine::evaluate(&candles, config, symbol, primary)?;

        for timeframe in &config.confirm_timeframes {
            if *timeframe == primary {
                continue;
            }

            let confirm_candles = match provider.klines(symbol, *timeframe).await {
                Ok(candles) => candles,
                Err(e) => {
                    warn!(
                        symbol,
                        confirm = %timeframe,
                        "Confirmation fetch failed, rejecting candidate: {:#}",
                        e
                    );
                    return None;
                }
            };

            match SignalEngine::evaluate(&confirm_candles, config, symbol, *timeframe) {
                Some(confirm) if confirm.direction == signal.direction => {}
                Some(confirm) => {
                    debug!(
                        symbol,
                        %primary,
                        confirm_tf = %timeframe,
                        "Confirmation disagrees ({} vs {}), rejecting",
                        confirm.direction,
                        signal.direction
                    );
                    return None;
                }
                None => {
                    debug!(
                        symbol,
                        %primary,
                        confirm_tf = %timeframe,
                        "Confirmation timeframe has no signal, rejecting"
                    );
                    return None;
                }
            }
        }

        Some(signal)
    }
}
