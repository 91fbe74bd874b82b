//! Single- and multi-ticker retrieval on top of a provider and a cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use finrus_cache::InMemoryCache;
use finrus_core::{
    CacheInfo, CacheKey, DataProvider, DateRange, FetchResult, HistoryError, HistoryProvider,
    HistoryRequest, Result, ResultCache, Symbol, normalize,
};
use tracing::{debug, error, info, warn};

use crate::config::{MAX_RECENT_DAYS, RetrievalConfig};
use crate::retry::fetch_with_retry;

/// Error text of a fetch that exhausted its retries without rows.
pub const NO_DATA_FOUND: &str = "No data found";

/// Cached, retrying history retrieval.
///
/// The service owns nothing process-global: the provider and the cache are
/// handed in by whoever builds it, and one instance is meant to be shared by
/// every concurrent caller.
///
/// Concurrent misses on the same key each fetch independently; the later
/// store overwrites the earlier one.
///
/// # Example
///
/// ```rust,ignore
/// use finrus::{HistoryService, RetrievalConfig};
///
/// let service = HistoryService::yahoo(RetrievalConfig::default());
/// let result = service.retrieve("aapl", "2024-01-01", "2024-02-01", true).await?;
/// println!("{}", serde_json::to_string_pretty(&result)?);
/// ```
pub struct HistoryService {
    provider: Arc<dyn HistoryProvider>,
    cache: Arc<dyn ResultCache>,
    config: RetrievalConfig,
}

impl std::fmt::Debug for HistoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryService")
            .field("provider", &self.provider.name())
            .field("cache_ttl", &self.cache.ttl())
            .field("config", &self.config)
            .finish()
    }
}

impl HistoryService {
    /// Create a service with a fresh in-memory cache using the configured TTL.
    #[must_use]
    pub fn new(provider: Arc<dyn HistoryProvider>, config: RetrievalConfig) -> Self {
        let cache = Arc::new(InMemoryCache::with_ttl(config.cache_ttl()));
        Self::with_cache(provider, cache, config)
    }

    /// Create a service over an existing cache.
    ///
    /// Stored entries use the cache's own TTL.
    #[must_use]
    pub fn with_cache(
        provider: Arc<dyn HistoryProvider>,
        cache: Arc<dyn ResultCache>,
        config: RetrievalConfig,
    ) -> Self {
        debug!(provider = provider.name(), "Creating history service");
        Self {
            provider,
            cache,
            config,
        }
    }

    /// Create a service backed by Yahoo Finance.
    #[cfg(feature = "yahoo")]
    #[must_use]
    pub fn yahoo(config: RetrievalConfig) -> Self {
        Self::new(Arc::new(finrus_yahoo::YahooProvider::new()), config)
    }

    /// Settings in effect.
    #[must_use]
    pub const fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieve history for one ticker.
    ///
    /// `start` and `end` are `YYYY-MM-DD` strings. Future dates are clamped to
    /// today, see [`DateRange::clamp_to`].
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidInput`] for an empty ticker or a
    /// malformed date. Every other failure is reported inside the returned
    /// [`FetchResult`].
    pub async fn retrieve(
        &self,
        ticker: &str,
        start: &str,
        end: &str,
        use_cache: bool,
    ) -> Result<FetchResult> {
        let request = HistoryRequest::parse(ticker, start, end, use_cache)?;
        Ok(self.retrieve_request(&request).await)
    }

    /// Retrieve history for an already validated request.
    pub async fn retrieve_request(&self, request: &HistoryRequest) -> FetchResult {
        let symbol = &request.symbol;
        let range = self.effective_range(symbol, request.range);

        let key = request
            .use_cache
            .then(|| CacheKey::derive(symbol, range.start, range.end));

        if let Some(key) = &key {
            if let Some(cached) = self.cache.get(key).await {
                info!(symbol = %symbol, "Returning cached data");
                return cached;
            }
        }

        info!(symbol = %symbol, "Fetching data from {range}");
        let policy = self.config.retry_policy();

        let Some(bars) = fetch_with_retry(self.provider.as_ref(), symbol, range, &policy).await
        else {
            error!(symbol = %symbol, "No data available");
            return FetchResult::failure(symbol.clone(), range, NO_DATA_FOUND, policy.max_attempts);
        };

        let rows = match normalize(&bars) {
            Ok(rows) => rows,
            Err(e) => {
                error!(symbol = %symbol, error = %e, "Error processing data");
                return FetchResult::failure(
                    symbol.clone(),
                    range,
                    e.to_string(),
                    policy.max_attempts,
                );
            }
        };

        let result = FetchResult::success(symbol.clone(), range, rows);

        if let Some(key) = key {
            self.cache.put(key, result.clone(), self.cache.ttl()).await;
            debug!(symbol = %symbol, "Cached data");
        }

        info!(
            symbol = %symbol,
            data_points = result.metadata.data_points,
            "Successfully fetched data"
        );
        result
    }

    /// Retrieve history for several tickers, one after another.
    ///
    /// Tickers are fetched strictly in order with the configured pacing delay
    /// between them. A failed ticker does not stop the batch; its entry is an
    /// error-shaped result. Repeated tickers collapse into one entry.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidInput`] before fetching anything if a
    /// date is malformed or any ticker is empty.
    pub async fn retrieve_many<S: AsRef<str>>(
        &self,
        tickers: &[S],
        start: &str,
        end: &str,
        use_cache: bool,
    ) -> Result<BTreeMap<Symbol, FetchResult>> {
        let range = DateRange::parse(start, end)?;
        let symbols = tickers
            .iter()
            .map(|ticker| Symbol::parse(ticker.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let total = symbols.len();
        let mut results = BTreeMap::new();

        for (i, symbol) in symbols.into_iter().enumerate() {
            info!("Processing ticker {}/{}: {}", i + 1, total, symbol);
            let request = HistoryRequest {
                symbol,
                range,
                use_cache,
            };
            let result = self.retrieve_request(&request).await;
            results.insert(request.symbol, result);

            if i + 1 < total {
                tokio::time::sleep(self.config.pacing_delay()).await;
            }
        }

        Ok(results)
    }

    /// Retrieve the `days_back` days ending today.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidInput`] for an empty ticker or a
    /// `days_back` outside `1..=365`.
    pub async fn retrieve_recent(
        &self,
        ticker: &str,
        days_back: u32,
        use_cache: bool,
    ) -> Result<FetchResult> {
        if days_back == 0 || days_back > MAX_RECENT_DAYS {
            return Err(HistoryError::InvalidInput(format!(
                "days_back must be between 1 and {MAX_RECENT_DAYS}"
            )));
        }

        let request = HistoryRequest {
            symbol: Symbol::parse(ticker)?,
            range: DateRange::trailing(today(), days_back),
            use_cache,
        };
        Ok(self.retrieve_request(&request).await)
    }

    /// Remove every cached result, returning how many were removed.
    pub async fn clear_cache(&self) -> usize {
        self.cache.clear().await
    }

    /// Drop expired cache entries, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.cache.purge_expired().await
    }

    /// Cache occupancy.
    pub async fn cache_info(&self) -> CacheInfo {
        self.cache.info().await
    }

    fn effective_range(&self, symbol: &Symbol, requested: DateRange) -> DateRange {
        let today = today();
        let range = requested.clamp_to(today, self.config.fallback_window_days);

        if requested.start > today {
            warn!(
                symbol = %symbol,
                "Start date was in future, adjusted to last {} days: {range}",
                self.config.fallback_window_days
            );
        } else if requested.end > today {
            warn!(symbol = %symbol, "End date was in future, adjusted to today: {}", range.end);
        }

        range
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
