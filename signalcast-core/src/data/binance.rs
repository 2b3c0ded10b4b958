//! Binance spot klines provider.
//!
//! Fetches candles from the public `/api/v3/klines` endpoint. Handles rate
//! limiting, retries with exponential backoff, and response parsing. The
//! latest (still forming) candle is kept: its close is the current price.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::provider::{DataError, DataProvider};
use crate::domain::{Bar, PriceSeries};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance caps a single klines request at 1000 candles.
const MAX_LIMIT: usize = 1000;

const INTERVALS: &[&str] = &[
    "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w", "1M",
];

pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl BinanceProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        })
    }

    /// `BTC/USDT` → `BTCUSDT`.
    pub fn market_symbol(symbol: &str) -> String {
        symbol
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase()
    }

    fn klines_url(&self, symbol: &str, interval: &str, limit: usize) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={interval}&limit={}",
            self.base_url,
            Self::market_symbol(symbol),
            limit.clamp(1, MAX_LIMIT)
        )
    }

    /// Parse the array-of-arrays klines payload.
    ///
    /// Row layout: `[open_time_ms, "open", "high", "low", "close", "volume", close_time_ms, ...]`.
    fn parse_klines(symbol: &str, payload: Value) -> Result<PriceSeries, DataError> {
        let rows = payload.as_array().ok_or_else(|| {
            DataError::ResponseFormatChanged(format!("klines for {symbol} is not an array"))
        })?;

        if rows.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let mut bars = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let cols = row.as_array().filter(|c| c.len() >= 6).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("kline row {i} has unexpected shape"))
            })?;

            let open_ms = cols[0].as_i64().ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("kline row {i}: open time is not an integer"))
            })?;
            let timestamp = DateTime::<Utc>::from_timestamp_millis(open_ms).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("kline row {i}: invalid timestamp {open_ms}"))
            })?;

            let bar = Bar {
                timestamp,
                open: decimal(&cols[1], i, "open")?,
                high: decimal(&cols[2], i, "high")?,
                low: decimal(&cols[3], i, "low")?,
                close: decimal(&cols[4], i, "close")?,
                volume: decimal(&cols[5], i, "volume")?,
            };
            if !bar.is_sane() {
                return Err(DataError::ResponseFormatChanged(format!(
                    "kline row {i}: OHLC values are inconsistent"
                )));
            }
            bars.push(bar);
        }

        Ok(PriceSeries::new(bars)?)
    }

    /// Execute the request with retry on rate limiting and transient failures.
    fn fetch_with_retry(&self, symbol: &str, url: &str) -> Result<Value, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, ?delay, "retrying klines request");
                std::thread::sleep(delay);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    // 418 is Binance's escalation of repeated 429s (temporary IP ban)
                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        warn!(symbol, %status, retry_after, "rate limited by Binance");
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        if status.as_u16() == 418 {
                            break;
                        }
                        continue;
                    }

                    if status == reqwest::StatusCode::BAD_REQUEST {
                        let body = resp.text().unwrap_or_default();
                        // -1121: "Invalid symbol."
                        if body.contains("-1121") {
                            return Err(DataError::SymbolNotFound {
                                symbol: symbol.to_string(),
                            });
                        }
                        return Err(DataError::Other(format!("HTTP 400 for {symbol}: {body}")));
                    }

                    if !status.is_success() {
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    return resp.json::<Value>().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse klines for {symbol}: {e}"
                        ))
                    });
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Binance encodes decimals as strings; accept plain numbers too.
fn decimal(value: &Value, row: usize, field: &str) -> Result<f64, DataError> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .filter(|v| v.is_finite());
    parsed.ok_or_else(|| {
        DataError::ResponseFormatChanged(format!("kline row {row}: {field} is not a decimal"))
    })
}

impl DataProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<PriceSeries, DataError> {
        if !INTERVALS.contains(&timeframe) {
            return Err(DataError::UnsupportedTimeframe(timeframe.to_string()));
        }
        let url = self.klines_url(symbol, timeframe, limit);
        let payload = self.fetch_with_retry(symbol, &url)?;
        Self::parse_klines(symbol, payload)
    }
}
