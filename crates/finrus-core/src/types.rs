//! Core data types for historical time-series retrieval.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`DateRange`] - Calendar range of a request, with future-date clamping
//! - [`HistoryRequest`] - A validated `(ticker, start, end, use_cache)` tuple
//! - [`RawBar`] - Provider-native OHLCV bar
//! - [`Row`] - Canonical, JSON-stable OHLCV row
//! - [`FetchResult`] - Rows plus retrieval metadata
//! - [`CacheInfo`] - Cache occupancy snapshot

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{HistoryError, Result};

/// Date format accepted on the request boundary and emitted in results.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format of [`FetchMetadata::fetched_at`].
pub const FETCHED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A trading symbol/ticker.
///
/// Symbols are automatically trimmed and uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, trimming whitespace and converting
    /// to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Creates a symbol, rejecting tickers that are empty after trimming.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidInput`] for an empty ticker.
    pub fn parse(s: &str) -> Result<Self> {
        let symbol = Self::new(s);
        if symbol.0.is_empty() {
            return Err(HistoryError::InvalidInput(
                "Ticker must be a non-empty string".to_string(),
            ));
        }
        Ok(symbol)
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::borrow::Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Parses a `YYYY-MM-DD` calendar date.
///
/// # Errors
/// Returns [`HistoryError::InvalidInput`] if the string is not a valid date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|e| {
        HistoryError::InvalidInput(format!("Dates must be in YYYY-MM-DD format: {s:?}: {e}"))
    })
}

/// A calendar date range `[start, end)` as sent upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range.
    pub start: NaiveDate,
    /// Day after the last requested day.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range from two dates without validation.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parses a range from two `YYYY-MM-DD` strings.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidInput`] if either date is malformed.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    /// The `days` long window ending on `today`.
    #[must_use]
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        Self::new(today - TimeDelta::days(i64::from(days)), today)
    }

    /// Rejects ranges whose start is not strictly before their end.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidInput`] if `start >= end`.
    pub fn ensure_ordered(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(HistoryError::InvalidInput(
                "start_date must be before end_date".to_string(),
            ));
        }
        Ok(())
    }

    /// Pulls future dates back to `today`.
    ///
    /// An end after today becomes today. A start after today replaces the
    /// whole range with the `fallback_days` window ending today; the
    /// original range is discarded, not refined.
    #[must_use]
    pub fn clamp_to(self, today: NaiveDate, fallback_days: u32) -> Self {
        if self.start > today {
            return Self::trailing(today, fallback_days);
        }
        if self.end > today {
            return Self::new(self.start, today);
        }
        self
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// A validated retrieval request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRequest {
    /// Normalized ticker.
    pub symbol: Symbol,
    /// Requested range, before clamping.
    pub range: DateRange,
    /// Whether the cache may be read and populated.
    pub use_cache: bool,
}

impl HistoryRequest {
    /// Validates the boundary tuple `(ticker, start_date, end_date, use_cache)`.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidInput`] for an empty ticker or a
    /// malformed date.
    pub fn parse(ticker: &str, start: &str, end: &str, use_cache: bool) -> Result<Self> {
        Ok(Self {
            symbol: Symbol::parse(ticker)?,
            range: DateRange::parse(start, end)?,
            use_cache,
        })
    }
}

/// A bar as delivered by an upstream provider.
///
/// The timestamp keeps the exchange offset the provider reported; prices
/// are unrounded and volume may be any float the provider produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    /// Timestamp of the bar in the exchange's local offset.
    pub timestamp: DateTime<FixedOffset>,
    /// Opening price.
    pub open: f64,
    /// Highest price during the period.
    pub high: f64,
    /// Lowest price during the period.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Trading volume.
    pub volume: f64,
    /// Split/dividend adjusted closing price.
    pub adjusted_close: Option<f64>,
}

impl RawBar {
    /// Creates a new raw bar.
    #[must_use]
    pub const fn new(
        timestamp: DateTime<FixedOffset>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            adjusted_close: None,
        }
    }

    /// Sets the adjusted close price.
    #[must_use]
    pub const fn with_adjusted_close(mut self, adjusted_close: f64) -> Self {
        self.adjusted_close = Some(adjusted_close);
        self
    }
}

/// A normalized OHLCV row.
///
/// Serializes with the column names consumers of the JSON API expect:
/// `Date`, `Open`, `High`, `Low`, `Close`, `Adj Close`, `Volume`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Calendar date, serialized as `YYYY-MM-DD`.
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// Opening price, rounded to cents.
    #[serde(rename = "Open")]
    pub open: f64,
    /// High price, rounded to cents.
    #[serde(rename = "High")]
    pub high: f64,
    /// Low price, rounded to cents.
    #[serde(rename = "Low")]
    pub low: f64,
    /// Closing price, rounded to cents.
    #[serde(rename = "Close")]
    pub close: f64,
    /// Adjusted close, rounded to cents, when the provider supplies it.
    #[serde(rename = "Adj Close", default, skip_serializing_if = "Option::is_none")]
    pub adj_close: Option<f64>,
    /// Whole-unit volume.
    #[serde(rename = "Volume")]
    pub volume: u64,
}

impl Row {
    /// Column names present in a set of rows, in serialization order.
    ///
    /// `Adj Close` is listed only if at least one row carries it.
    #[must_use]
    pub fn column_names(rows: &[Self]) -> Vec<String> {
        let mut columns = vec!["Date", "Open", "High", "Low", "Close"];
        if rows.iter().any(|row| row.adj_close.is_some()) {
            columns.push("Adj Close");
        }
        columns.push("Volume");
        columns.into_iter().map(String::from).collect()
    }
}

/// Metadata describing how a [`FetchResult`] was produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchMetadata {
    /// Effective (post-clamping) start date.
    pub start_date: NaiveDate,
    /// Effective (post-clamping) end date.
    pub end_date: NaiveDate,
    /// Local wall-clock time the upstream fetch completed.
    #[serde(with = "fetched_at_format")]
    pub fetched_at: NaiveDateTime,
    /// Number of rows.
    pub data_points: usize,
    /// Whether rows were retrieved.
    pub success: bool,
    /// Whether this result was served from the cache.
    pub cached: bool,
    /// Failure description, set exactly when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Attempt budget spent on a failed fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    /// Row field names of a successful fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

/// Rows for one ticker plus retrieval metadata.
///
/// Built only through [`FetchResult::success`] and [`FetchResult::failure`],
/// which keep `success`, `error`, `rows` and `data_points` consistent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    /// Normalized ticker.
    pub ticker: Symbol,
    /// Normalized rows in upstream order.
    #[serde(rename = "data")]
    pub rows: Vec<Row>,
    /// Retrieval metadata.
    pub metadata: FetchMetadata,
}

impl FetchResult {
    /// Builds a successful, uncached result.
    #[must_use]
    pub fn success(ticker: Symbol, range: DateRange, rows: Vec<Row>) -> Self {
        let columns = Row::column_names(&rows);
        Self {
            ticker,
            metadata: FetchMetadata {
                start_date: range.start,
                end_date: range.end,
                fetched_at: Local::now().naive_local(),
                data_points: rows.len(),
                success: true,
                cached: false,
                error: None,
                attempts: None,
                columns: Some(columns),
            },
            rows,
        }
    }

    /// Builds an error-shaped result with no rows.
    #[must_use]
    pub fn failure(
        ticker: Symbol,
        range: DateRange,
        error: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            ticker,
            rows: Vec::new(),
            metadata: FetchMetadata {
                start_date: range.start,
                end_date: range.end,
                fetched_at: Local::now().naive_local(),
                data_points: 0,
                success: false,
                cached: false,
                error: Some(error.into()),
                attempts: Some(attempts),
                columns: None,
            },
        }
    }

    /// Returns true if rows were retrieved.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.metadata.success
    }

    /// Returns the failure description, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.metadata.error.as_deref()
    }

    /// Marks this copy as served from the cache.
    #[must_use]
    pub fn into_cached(mut self) -> Self {
        self.metadata.cached = true;
        self
    }
}

/// Cache occupancy snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInfo {
    /// Entries held, fresh or not.
    pub total_items: usize,
    /// Entries that have not yet expired.
    pub valid_items: usize,
    /// Entries past their expiry, awaiting overwrite or purge.
    pub expired_items: usize,
    /// TTL applied to new entries.
    pub cache_duration_seconds: u64,
}

mod fetched_at_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::FETCHED_AT_FORMAT;

    pub(super) fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FETCHED_AT_FORMAT))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FETCHED_AT_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(Symbol::new("  aapl ").as_str(), "AAPL");
        assert_eq!(Symbol::parse("msft").unwrap().as_str(), "MSFT");
        assert!(matches!(
            Symbol::parse("   "),
            Err(HistoryError::InvalidInput(_))
        ));
        assert!("".parse::<Symbol>().is_err());
    }

    #[test]
    fn test_date_range_parse() {
        let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(range.end, date(2024, 1, 31));

        assert!(DateRange::parse("2024-13-01", "2024-01-31").is_err());
        assert!(DateRange::parse("01/02/2024", "2024-01-31").is_err());
        assert!(DateRange::parse("2024-02-30", "2024-03-01").is_err());
    }

    #[test]
    fn test_date_range_ordering() {
        assert!(DateRange::new(date(2024, 1, 1), date(2024, 1, 2)).ensure_ordered().is_ok());
        assert!(DateRange::new(date(2024, 1, 2), date(2024, 1, 2)).ensure_ordered().is_err());
        assert!(DateRange::new(date(2024, 1, 3), date(2024, 1, 2)).ensure_ordered().is_err());
    }

    #[test]
    fn test_clamp_past_range_unchanged() {
        let today = date(2024, 6, 15);
        let range = DateRange::new(date(2024, 1, 1), date(2024, 2, 1));
        assert_eq!(range.clamp_to(today, 30), range);
    }

    #[test]
    fn test_clamp_future_end() {
        let today = date(2024, 6, 15);
        let range = DateRange::new(date(2024, 6, 1), date(2024, 7, 1));
        assert_eq!(
            range.clamp_to(today, 30),
            DateRange::new(date(2024, 6, 1), today)
        );
    }

    #[test]
    fn test_clamp_future_start_replaces_range() {
        let today = date(2024, 6, 15);
        let range = DateRange::new(date(2099, 1, 1), date(2099, 2, 1));
        assert_eq!(
            range.clamp_to(today, 30),
            DateRange::new(date(2024, 5, 16), today)
        );
    }

    #[test]
    fn test_row_serialization_shape() {
        let row = Row {
            date: date(2024, 1, 2),
            open: 187.15,
            high: 188.44,
            low: 183.89,
            close: 185.64,
            adj_close: None,
            volume: 82_488_700,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Date"], "2024-01-02");
        assert_eq!(json["Close"], 185.64);
        assert_eq!(json["Volume"], 82_488_700);
        assert!(json.get("Adj Close").is_none());
    }

    #[test]
    fn test_column_names() {
        let mut row = Row {
            date: date(2024, 1, 2),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            adj_close: None,
            volume: 1,
        };
        assert_eq!(
            Row::column_names(std::slice::from_ref(&row)),
            vec!["Date", "Open", "High", "Low", "Close", "Volume"]
        );
        row.adj_close = Some(1.0);
        assert_eq!(
            Row::column_names(&[row]),
            vec!["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"]
        );
    }

    #[test]
    fn test_fetch_result_invariants() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31));
        let failed = FetchResult::failure(Symbol::new("ZZZZZ"), range, "No data found", 3);
        assert!(!failed.is_success());
        assert!(failed.rows.is_empty());
        assert_eq!(failed.error(), Some("No data found"));
        assert_eq!(failed.metadata.attempts, Some(3));
        assert_eq!(failed.metadata.data_points, 0);

        let ok = FetchResult::success(Symbol::new("AAPL"), range, Vec::new());
        assert!(ok.is_success());
        assert!(ok.error().is_none());
        assert!(!ok.metadata.cached);
        assert!(ok.into_cached().metadata.cached);
    }

    #[test]
    fn test_fetch_result_json_shape() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31));
        let failed = FetchResult::failure(Symbol::new("zzzzz"), range, "No data found", 3);
        let json = serde_json::to_value(&failed).unwrap();

        assert_eq!(json["ticker"], "ZZZZZ");
        assert_eq!(json["data"], serde_json::json!([]));
        assert_eq!(json["metadata"]["start_date"], "2024-01-01");
        assert_eq!(json["metadata"]["success"], false);
        assert_eq!(json["metadata"]["error"], "No data found");
        assert_eq!(json["metadata"]["attempts"], 3);
        assert!(json["metadata"].get("columns").is_none());

        let fetched_at = json["metadata"]["fetched_at"].as_str().unwrap();
        assert!(NaiveDateTime::parse_from_str(fetched_at, FETCHED_AT_FORMAT).is_ok());

        let back: FetchResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.ticker, failed.ticker);
        assert_eq!(back.metadata.error, failed.metadata.error);
    }
}
