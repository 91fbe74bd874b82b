//! In-memory cache implementation.

use async_trait::async_trait;
use finrus_core::{CacheInfo, CacheKey, DEFAULT_CACHE_TTL, FetchResult, ResultCache};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Cache entry with its absolute expiry.
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: FetchResult,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(payload: FetchResult, ttl: Duration) -> Self {
        Self {
            payload,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_valid(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Process-lifetime TTL cache.
///
/// Every read and write goes through one `RwLock` over the whole map.
/// Expiry is lazy: a stale entry stays in the map, invisible to [`get`],
/// until it is overwritten, purged or cleared. Expiry uses the tokio clock,
/// so paused-time tests can advance it.
///
/// [`get`]: ResultCache::get
#[derive(Debug)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl InMemoryCache {
    /// Create a new empty cache with the default five minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    /// Create a new empty cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of entries held, including expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if no entries are held.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultCache for InMemoryCache {
    #[instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &CacheKey) -> Option<FetchResult> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.is_valid(Instant::now()) => {
                debug!(ticker = %entry.payload.ticker, "Cache hit");
                Some(entry.payload.clone().into_cached())
            }
            Some(_) => {
                debug!("Cache entry expired");
                None
            }
            None => {
                debug!("Cache miss");
                None
            }
        }
    }

    #[instrument(skip(self, result), fields(key = %key, ticker = %result.ticker))]
    async fn put(&self, key: CacheKey, result: FetchResult, ttl: Duration) {
        let rows = result.rows.len();
        self.entries
            .write()
            .await
            .insert(key, CacheEntry::new(result, ttl));
        debug!(rows, ttl_secs = ttl.as_secs(), "Cached result");
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        info!(removed, "Cache cleared");
        removed
    }

    #[instrument(skip(self))]
    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    async fn info(&self) -> CacheInfo {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let total_items = entries.len();
        let valid_items = entries.values().filter(|entry| entry.is_valid(now)).count();
        CacheInfo {
            total_items,
            valid_items,
            expired_items: total_items - valid_items,
            cache_duration_seconds: self.ttl.as_secs(),
        }
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
