//! In-memory cache implementation using the moka crate.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tracing::debug;

use aufloes_core::result::AppResult;
use aufloes_core::traits::cache::{CachedResponse, ResponseCache};

/// Expires every entry when its own TTL runs out.
struct ResponseExpiry;

impl Expiry<String, CachedResponse> for ResponseExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedResponse,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl.saturating_sub(value.age()))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedResponse,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl.saturating_sub(value.age()))
    }
}

/// In-memory response cache using moka.
#[derive(Debug, Clone)]
pub struct MemoryResponseCache {
    cache: Cache<String, CachedResponse>,
}

impl MemoryResponseCache {
    /// Create a cache holding at most `max_capacity` responses.
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(ResponseExpiry)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    async fn get(&self, key: &str) -> AppResult<Option<CachedResponse>> {
        Ok(self
            .cache
            .get(key)
            .await
            .filter(|entry| !entry.is_expired()))
    }

    async fn insert(&self, key: &str, response: CachedResponse) -> AppResult<()> {
        debug!(key, ttl_secs = response.ttl.as_secs(), "Caching response");
        self.cache.insert(key.to_string(), response).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.cache.invalidate_all();
        Ok(())
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
