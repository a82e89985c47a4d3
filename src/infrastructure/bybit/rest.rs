use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::RestConfig;
use crate::domain::market::{Candle, MarketCategory, Ticker, Timeframe};
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use crate::infrastructure::core::rate_limiter::RateLimiter;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("rate limited by exchange and cooldown retry also rejected")]
    RateLimited,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest_middleware::Error),
    #[error("unexpected HTTP status {0}")]
    Http(reqwest::StatusCode),
    #[error("exchange error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("malformed exchange payload: {0}")]
    Malformed(String),
}

/// Bybit v5 public REST client for tickers and klines.
///
/// Every call is gated by the shared [`RateLimiter`]; an HTTP 429 from the
/// exchange triggers one fixed cooldown and a single retry before the error
/// surfaces to the caller.
pub struct BybitRestClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
    cooldown: Duration,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ListResult<T> {
    list: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TickerRow {
    symbol: String,
    #[serde(rename = "turnover24h", default)]
    turnover_24h: String,
    #[serde(rename = "lastPrice", default)]
    last_price: String,
}

impl BybitRestClient {
    pub fn new(config: &RestConfig, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rate_limiter,
            cooldown: Duration::from_secs(config.rate_limit_cooldown_secs),
        }
    }

    /// Fetches the full ticker snapshot for a category.
    /// Rows whose numeric fields do not parse are dropped with a debug log.
    pub async fn get_tickers(&self, category: MarketCategory) -> Result<Vec<Ticker>, RestError> {
        let url = build_url_with_query(
            &format!("{}/v5/market/tickers", self.base_url),
            &[("category", category.as_str())],
        );
        let result: ListResult<TickerRow> = self.get_json(&url).await?;

        let tickers = result
            .list
            .into_iter()
            .filter_map(|row| {
                let turnover_24h = row.turnover_24h.parse::<f64>();
                let last_price = row.last_price.parse::<f64>();
                match (turnover_24h, last_price) {
                    (Ok(turnover24h), Ok(last_price)) => Some(Ticker {
                        symbol: row.symbol,
                        turnover24h,
                        last_price,
                    }),
                    _ => {
                        debug!(symbol = %row.symbol, "dropping ticker row with non-numeric fields");
                        None
                    }
                }
            })
            .collect();
        Ok(tickers)
    }

    /// Fetches up to `limit` klines, returned oldest-first.
    ///
    /// Bybit delivers rows newest-first as string arrays
    /// `[start, open, high, low, close, volume, turnover]`.
    pub async fn get_klines(
        &self,
        category: MarketCategory,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, RestError> {
        let limit = limit.to_string();
        let url = build_url_with_query(
            &format!("{}/v5/market/kline", self.base_url),
            &[
                ("category", category.as_str()),
                ("symbol", symbol),
                ("interval", timeframe.to_bybit_interval()),
                ("limit", limit.as_str()),
            ],
        );
        let result: ListResult<Vec<String>> = self.get_json(&url).await?;

        let mut candles = Vec::with_capacity(result.list.len());
        for row in &result.list {
            candles.push(parse_kline_row(row, timeframe)?);
        }
        candles.reverse();
        Ok(candles)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RestError> {
        let mut cooled_down = false;
        loop {
            self.rate_limiter.acquire().await;
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if cooled_down {
                    return Err(RestError::RateLimited);
                }
                cooled_down = true;
                warn!(
                    cooldown_secs = self.cooldown.as_secs(),
                    "exchange returned 429, cooling down before one retry"
                );
                tokio::time::sleep(self.cooldown).await;
                continue;
            }
            if !status.is_success() {
                return Err(RestError::Http(status));
            }

            let envelope: Envelope<T> = response
                .json()
                .await
                .map_err(|e| RestError::Malformed(e.to_string()))?;
            if envelope.ret_code != 0 {
                return Err(RestError::Api {
                    code: envelope.ret_code,
                    message: envelope.ret_msg,
                });
            }
            return envelope
                .result
                .ok_or_else(|| RestError::Malformed("missing result object".to_string()));
        }
    }
}

fn parse_kline_row(row: &[String], timeframe: Timeframe) -> Result<Candle, RestError> {
    if row.len() < 6 {
        return Err(RestError::Malformed(format!(
            "kline row has {} fields, expected at least 6",
            row.len()
        )));
    }
    let open_time = row[0]
        .parse::<i64>()
        .map_err(|_| RestError::Malformed(format!("bad kline start time: {}", row[0])))?;
    let field = |i: usize| -> Result<f64, RestError> {
        row[i]
            .parse::<f64>()
            .map_err(|_| RestError::Malformed(format!("bad kline field {}: {}", i, row[i])))
    };
    Ok(Candle {
        open_time,
        open: field(1)?,
        high: field(2)?,
        low: field(3)?,
        close: field(4)?,
        volume: field(5)?,
        close_time: open_time + timeframe.duration_ms(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_kline_row() {
        let candle = parse_kline_row(
            &row(&["1700000000000", "100.5", "101.2", "99.8", "100.9", "1234.5", "124000"]),
            Timeframe::OneHour,
        )
        .unwrap();
        assert_eq!(candle.open_time, 1_700_000_000_000);
        assert_eq!(candle.close_time, 1_700_000_000_000 + 3_600_000);
        assert_eq!(candle.open, 100.5);
        assert_eq!(candle.high, 101.2);
        assert_eq!(candle.low, 99.8);
        assert_eq!(candle.close, 100.9);
        assert_eq!(candle.volume, 1234.5);
    }

    #[test]
    fn test_parse_kline_row_rejects_short_row() {
        let err = parse_kline_row(&row(&["1700000000000", "100"]), Timeframe::OneMin).unwrap_err();
        assert!(matches!(err, RestError::Malformed(_)));
    }

    #[test]
    fn test_parse_kline_row_rejects_non_numeric() {
        let err = parse_kline_row(
            &row(&["1700000000000", "100", "abc", "99", "100", "1"]),
            Timeframe::OneMin,
        )
        .unwrap_err();
        assert!(matches!(err, RestError::Malformed(_)));
    }

    #[test]
    fn test_envelope_error_code_surfaces() {
        let json = r#"{"retCode":10001,"retMsg":"params error","result":null}"#;
        let envelope: Envelope<ListResult<Vec<String>>> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.ret_code, 10001);
        assert_eq!(envelope.ret_msg, "params error");
        assert!(envelope.result.is_none());
    }

    #[test]
    fn test_ticker_rows_deserialize() {
        let json = r#"{"retCode":0,"retMsg":"OK","result":{"list":[
            {"symbol":"BTCUSDT","turnover24h":"123456789.5","lastPrice":"65000.1"},
            {"symbol":"BADROW","turnover24h":"","lastPrice":"1.0"}
        ]}}"#;
        let envelope: Envelope<ListResult<TickerRow>> = serde_json::from_str(json).unwrap();
        let list = envelope.result.unwrap().list;
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].symbol, "BTCUSDT");
        assert!(list[1].turnover_24h.parse::<f64>().is_err());
    }
}
