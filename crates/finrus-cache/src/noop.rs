//! No-op cache implementation.

use async_trait::async_trait;
use finrus_core::{CacheInfo, CacheKey, FetchResult, ResultCache};
use std::time::Duration;
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// `get` always misses and `put` discards its input.
/// Useful for disabling caching or testing code paths without cache hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResultCache for NoopCache {
    async fn get(&self, _key: &CacheKey) -> Option<FetchResult> {
        trace!("NoopCache: get called, returning None");
        None
    }

    async fn put(&self, _key: CacheKey, _result: FetchResult, _ttl: Duration) {
        trace!("NoopCache: put called, doing nothing");
    }

    async fn clear(&self) -> usize {
        trace!("NoopCache: clear called, returning 0");
        0
    }

    async fn purge_expired(&self) -> usize {
        trace!("NoopCache: purge_expired called, returning 0");
        0
    }

    async fn info(&self) -> CacheInfo {
        CacheInfo {
            cache_duration_seconds: self.ttl().as_secs(),
            ..CacheInfo::default()
        }
    }
}
