#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finrus/finrus/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance history provider.
//!
//! This crate provides a Yahoo Finance data provider that implements the
//! [`DataProvider`] and [`HistoryProvider`] traits from `finrus-core`.
//!
//! # Features
//!
//! - Fetch daily OHLCV bars using Yahoo Finance's chart API
//! - Built-in rate limiting (1 request per second by default)
//! - Adjusted close when Yahoo reports it
//! - Bars stamped with the exchange's GMT offset
//!
//! # Example
//!
//! ```no_run
//! use finrus_yahoo::YahooProvider;
//! use finrus_core::{FetchOutcome, HistoryProvider, Symbol};
//! use chrono::NaiveDate;
//!
//! # async fn example() {
//! let provider = YahooProvider::new();
//! let symbol = Symbol::new("AAPL");
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
//!
//! if let FetchOutcome::Bars(bars) = provider.fetch_history(&symbol, start, end).await {
//!     println!("Fetched {} bars", bars.len());
//! }
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use finrus_core::{
    DATE_FORMAT, DataProvider, FetchOutcome, HistoryError, HistoryProvider, RawBar, Result, Symbol,
};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Yahoo Finance chart API base URL.
const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Default rate limit delay in milliseconds.
const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Yahoo Finance history provider.
///
/// Implements [`DataProvider`] and [`HistoryProvider`]. Each call to
/// [`HistoryProvider::fetch_history`] issues exactly one chart request.
#[derive(Debug)]
pub struct YahooProvider {
    client: reqwest::Client,
    rate_limit_ms: u64,
    last_request_time: AtomicU64,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with default settings.
    ///
    /// Uses built-in rate limiting of 1 request per second.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rate_limit(Duration::from_millis(DEFAULT_RATE_LIMIT_MS))
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    ///
    /// Uses the provided client for all HTTP requests. Rate limiting
    /// is still applied.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Create a new Yahoo Finance provider with custom rate limiting.
    #[must_use]
    pub fn with_rate_limit(rate_limit: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to configure HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            client,
            rate_limit_ms: rate_limit.as_millis() as u64,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Apply rate limiting before making a request.
    async fn apply_rate_limit(&self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let last = self.last_request_time.load(Ordering::Relaxed);
        let elapsed = now.saturating_sub(last);

        if elapsed < self.rate_limit_ms {
            let wait_time = self.rate_limit_ms - elapsed;
            debug!("Rate limiting: waiting {}ms", wait_time);
            sleep(Duration::from_millis(wait_time)).await;
        }

        self.last_request_time.store(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            Ordering::Relaxed,
        );
    }

    /// Build the daily chart API URL for a symbol and `[start, end)` range.
    fn build_chart_url(&self, symbol: &Symbol, start: NaiveDate, end: NaiveDate) -> String {
        let midnight = |date: NaiveDate| {
            date.and_hms_opt(0, 0, 0)
                .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
                .unwrap_or(0)
        };

        format!(
            "{}/{}?period1={}&period2={}&interval=1d&includeAdjustedClose=true&events=div%2Csplit",
            CHART_API_URL,
            symbol.as_str(),
            midnight(start),
            midnight(end),
        )
    }

    /// Parse Yahoo Finance chart response into raw bars.
    ///
    /// Timestamps where every price is null (holidays Yahoo still lists) are
    /// skipped. A partially null price row is a parse error.
    fn parse_chart_response(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        response: ChartResponse,
    ) -> Result<Vec<RawBar>> {
        let result = response
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| HistoryError::SymbolNotFound(symbol.to_string()))?;

        let timestamps = result.timestamp.unwrap_or_default();

        if timestamps.is_empty() {
            return Err(HistoryError::NoDataFound {
                symbol: symbol.to_string(),
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }

        let gmt_offset = result.meta.map(|meta| meta.gmtoffset).unwrap_or_default();
        let offset = FixedOffset::east_opt(gmt_offset).ok_or_else(|| {
            HistoryError::Parse(format!("Invalid GMT offset {gmt_offset} for {symbol}"))
        })?;

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| HistoryError::Parse("Missing quote data".to_string()))?;

        let adj_close = result
            .indicators
            .adjclose
            .and_then(|ac| ac.into_iter().next())
            .map(|ac| ac.adjclose)
            .unwrap_or_default();

        let len = timestamps.len();
        if [
            quote.open.len(),
            quote.high.len(),
            quote.low.len(),
            quote.close.len(),
            quote.volume.len(),
        ]
        .iter()
        .any(|&n| n != len)
        {
            return Err(HistoryError::Parse(format!(
                "Quote columns do not match {len} timestamps for {symbol}"
            )));
        }

        let mut bars = Vec::with_capacity(len);
        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = Utc
                .timestamp_opt(ts, 0)
                .single()
                .ok_or_else(|| HistoryError::Parse(format!("Invalid timestamp {ts}")))?
                .with_timezone(&offset);

            let prices = (quote.open[i], quote.high[i], quote.low[i], quote.close[i]);
            let (open, high, low, close) = match prices {
                (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
                (None, None, None, None) => {
                    debug!(symbol = %symbol, timestamp = %timestamp, "Skipping empty bar");
                    continue;
                }
                _ => {
                    return Err(HistoryError::Parse(format!(
                        "Incomplete prices for {symbol} at {timestamp}"
                    )));
                }
            };

            let volume = quote.volume[i].unwrap_or_default() as f64;
            let mut bar = RawBar::new(timestamp, open, high, low, close, volume);
            if let Some(Some(adjusted)) = adj_close.get(i) {
                bar = bar.with_adjusted_close(*adjusted);
            }
            bars.push(bar);
        }

        Ok(bars)
    }

    /// Issue one chart request.
    async fn fetch_chart(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>> {
        // Validate date range
        if start > end {
            return Err(HistoryError::InvalidInput(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }

        // Apply rate limiting
        self.apply_rate_limit().await;

        let url = self.build_chart_url(symbol, start, end);
        debug!("Fetching history: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HistoryError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(HistoryError::RateLimited {
                provider: self.name().to_string(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(HistoryError::SymbolNotFound(symbol.to_string()));
        }

        if !response.status().is_success() {
            return Err(HistoryError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                symbol
            )));
        }

        let chart_response: ChartResponse = response
            .json()
            .await
            .map_err(|e| HistoryError::Parse(e.to_string()))?;

        // Check for API-level errors
        if let Some(error) = chart_response.chart.error.as_ref() {
            if error.code == "Not Found" {
                return Err(HistoryError::SymbolNotFound(symbol.to_string()));
            }
            return Err(HistoryError::Other(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        self.parse_chart_response(symbol, start, end, chart_response)
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn description(&self) -> &str {
        "Yahoo Finance daily OHLCV history"
    }
}

#[async_trait]
impl HistoryProvider for YahooProvider {
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FetchOutcome {
        self.fetch_chart(symbol, start, end).await.into()
    }
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

/// Chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_FIXTURE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "symbol": "AAPL",
                    "gmtoffset": -18000,
                    "exchangeTimezoneName": "America/New_York"
                },
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open":   [187.15, null, 182.15],
                        "high":   [188.44, null, 183.09],
                        "low":    [183.885, null, 180.88],
                        "close":  [185.64, null, 181.91],
                        "volume": [82488700, null, 71983600]
                    }],
                    "adjclose": [{"adjclose": [184.93, null, 181.21]}]
                }
            }],
            "error": null
        }
    }"#;

    fn dates() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    #[test]
    fn test_build_chart_url() {
        let provider = YahooProvider::new();
        let symbol = Symbol::new("AAPL");
        let (start, end) = dates();

        let url = provider.build_chart_url(&symbol, start, end);

        assert!(url.contains("/AAPL?"));
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1706659200"));
        assert!(url.contains("interval=1d"));
        assert!(url.contains("includeAdjustedClose=true"));
    }

    #[test]
    fn test_parse_chart_response() {
        let provider = YahooProvider::new();
        let symbol = Symbol::new("AAPL");
        let (start, end) = dates();
        let response: ChartResponse = serde_json::from_str(CHART_FIXTURE).unwrap();

        let bars = provider
            .parse_chart_response(&symbol, start, end, response)
            .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp.offset().local_minus_utc(), -18000);
        assert_eq!(bars[0].timestamp.naive_local().to_string(), "2024-01-02 09:30:00");
        assert_eq!(bars[0].low, 183.885);
        assert_eq!(bars[0].volume, 82_488_700.0);
        assert_eq!(bars[0].adjusted_close, Some(184.93));
        assert_eq!(bars[1].close, 181.91);
    }

    #[test]
    fn test_parse_empty_chart_is_no_data() {
        let provider = YahooProvider::new();
        let symbol = Symbol::new("AAPL");
        let (start, end) = dates();
        let response: ChartResponse = serde_json::from_str(
            r#"{"chart": {
                "result": [{"meta": {"gmtoffset": 0}, "indicators": {"quote": [{}]}}],
                "error": null
            }}"#,
        )
        .unwrap();

        let result = provider.parse_chart_response(&symbol, start, end, response);
        assert!(matches!(result, Err(HistoryError::NoDataFound { .. })));
        assert_eq!(FetchOutcome::from(result), FetchOutcome::Empty);
    }

    #[test]
    fn test_parse_missing_result_is_not_found() {
        let provider = YahooProvider::new();
        let symbol = Symbol::new("ZZZZZ");
        let (start, end) = dates();
        let response: ChartResponse =
            serde_json::from_str(r#"{"chart": {"result": null, "error": null}}"#).unwrap();

        let result = provider.parse_chart_response(&symbol, start, end, response);
        assert!(matches!(result, Err(HistoryError::SymbolNotFound(_))));
    }

    #[test]
    fn test_parse_partial_prices_is_error() {
        let provider = YahooProvider::new();
        let symbol = Symbol::new("AAPL");
        let (start, end) = dates();
        let response: ChartResponse = serde_json::from_str(
            r#"{"chart": {"result": [{
                "meta": {"gmtoffset": 0},
                "timestamp": [1704205800],
                "indicators": {"quote": [{
                    "open": [1.0], "high": [null], "low": [1.0], "close": [1.0], "volume": [10]
                }]}
            }], "error": null}}"#,
        )
        .unwrap();

        let result = provider.parse_chart_response(&symbol, start, end, response);
        assert!(matches!(result, Err(HistoryError::Parse(_))));
    }

    #[test]
    fn test_provider_info() {
        let provider = YahooProvider::default();
        assert_eq!(provider.name(), "Yahoo Finance");
        assert!(!provider.description().is_empty());
    }
}
