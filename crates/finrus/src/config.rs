//! Retrieval settings.

use std::time::Duration;

use finrus_core::{DEFAULT_CACHE_TTL, HistoryError, Result};
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Default number of upstream attempts per fetch.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default constant delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Default delay between tickers of a batch.
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(100);

/// Window used when a requested range lies entirely in the future.
pub const DEFAULT_FALLBACK_WINDOW_DAYS: u32 = 30;

/// Largest `days_back` accepted by recent-window retrieval.
pub const MAX_RECENT_DAYS: u32 = 365;

/// Settings for [`HistoryService`](crate::HistoryService).
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```
/// let config = finrus::RetrievalConfig::from_toml_str("max_attempts = 5").unwrap();
/// assert_eq!(config.max_attempts, 5);
/// assert_eq!(config.cache_ttl_secs, 300);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Upstream attempts per fetch, at least one.
    pub max_attempts: u32,
    /// Delay between attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Delay between tickers of a batch, in milliseconds.
    pub pacing_delay_ms: u64,
    /// Lifetime of cached results, in seconds.
    pub cache_ttl_secs: u64,
    /// Days covered when a fully future range is replaced.
    pub fallback_window_days: u32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            pacing_delay_ms: DEFAULT_PACING_DELAY.as_millis() as u64,
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            fallback_window_days: DEFAULT_FALLBACK_WINDOW_DAYS,
        }
    }
}

impl RetrievalConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidInput`] on malformed TOML or invalid values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)
            .map_err(|e| HistoryError::InvalidInput(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidInput`] if `max_attempts` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(HistoryError::InvalidInput(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Sets the number of upstream attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay between attempts.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the delay between tickers of a batch.
    #[must_use]
    pub const fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the lifetime of cached results.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = ttl.as_secs();
        self
    }

    /// Retry behavior derived from these settings.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    /// Delay between tickers of a batch.
    #[must_use]
    pub const fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }

    /// Lifetime of cached results.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
