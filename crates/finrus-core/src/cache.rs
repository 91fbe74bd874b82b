//! Cache trait and key derivation for fetched results.
//!
//! This module defines the [`ResultCache`] trait that stores complete
//! [`FetchResult`]s under a [`CacheKey`] with a per-entry expiry.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;
use std::time::Duration;

use crate::types::{CacheInfo, DATE_FORMAT, FetchResult, Symbol};

/// Default time-to-live for cached results.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Deterministic fingerprint of `(ticker, start_date, end_date)`.
///
/// The inputs are canonicalized to `TICKER_YYYY-MM-DD_YYYY-MM-DD` and hashed
/// with BLAKE3, so equal normalized requests always share a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for a symbol and an effective date range.
    #[must_use]
    pub fn derive(symbol: &Symbol, start: NaiveDate, end: NaiveDate) -> Self {
        let canonical = format!(
            "{}_{}_{}",
            symbol.as_str(),
            start.format(DATE_FORMAT),
            end.format(DATE_FORMAT)
        );
        Self(blake3::hash(canonical.as_bytes()).to_hex().to_string())
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for caching fetched results.
///
/// Implementations must serialize access to their storage; the retrieval
/// services share one instance across concurrent requests.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Returns a copy of the stored result if present and not yet expired.
    ///
    /// The copy has `metadata.cached` set. Expired entries are never returned.
    async fn get(&self, key: &CacheKey) -> Option<FetchResult>;

    /// Inserts or overwrites an entry that expires `ttl` from now.
    async fn put(&self, key: CacheKey, result: FetchResult, ttl: Duration);

    /// Removes every entry, returning how many were removed.
    async fn clear(&self) -> usize;

    /// Removes expired entries, returning how many were removed.
    async fn purge_expired(&self) -> usize;

    /// Reports occupancy without mutating the cache.
    async fn info(&self) -> CacheInfo;

    /// TTL applied to results stored by the retrieval services.
    fn ttl(&self) -> Duration {
        DEFAULT_CACHE_TTL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_key_is_deterministic() {
        let symbol = Symbol::new("AAPL");
        let a = CacheKey::derive(&symbol, date(2024, 1, 1), date(2024, 1, 31));
        let b = CacheKey::derive(&Symbol::new(" aapl "), date(2024, 1, 1), date(2024, 1, 31));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_key_distinguishes_inputs() {
        let symbol = Symbol::new("AAPL");
        let base = CacheKey::derive(&symbol, date(2024, 1, 1), date(2024, 1, 31));
        assert_ne!(
            base,
            CacheKey::derive(&symbol, date(2024, 1, 1), date(2024, 2, 1))
        );
        assert_ne!(
            base,
            CacheKey::derive(&symbol, date(2024, 1, 2), date(2024, 1, 31))
        );
        assert_ne!(
            base,
            CacheKey::derive(&Symbol::new("MSFT"), date(2024, 1, 1), date(2024, 1, 31))
        );
    }
}
