//! Response cache trait for pluggable caching backends.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// A response stored in the cache.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// Response in DNS wire format, as received from upstream.
    pub data: Bytes,
    /// When the response was stored.
    pub stored_at: Instant,
    /// How long the response stays valid after `stored_at`.
    pub ttl: Duration,
}

impl CachedResponse {
    /// Create an entry stored now.
    pub fn new(data: Bytes, ttl: Duration) -> Self {
        Self {
            data,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// Time elapsed since the entry was stored.
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }

    /// Whether the entry outlived its TTL.
    pub fn is_expired(&self) -> bool {
        self.age() >= self.ttl
    }
}

/// Trait for response cache backends.
///
/// Backends are responsible for TTL enforcement; `get` never returns an
/// expired entry.
#[async_trait]
pub trait ResponseCache: Send + Sync + std::fmt::Debug + 'static {
    /// Get a response by key.
    async fn get(&self, key: &str) -> AppResult<Option<CachedResponse>>;

    /// Store a response under `key`.
    async fn insert(&self, key: &str, response: CachedResponse) -> AppResult<()>;

    /// Remove a single entry.
    async fn remove(&self, key: &str) -> AppResult<()>;

    /// Remove every entry.
    async fn clear(&self) -> AppResult<()>;

    /// Approximate number of stored entries.
    fn entry_count(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_not_expired() {
        let entry = CachedResponse::new(Bytes::from_static(b"x"), Duration::from_secs(60));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_zero_ttl_is_expired() {
        let entry = CachedResponse::new(Bytes::from_static(b"x"), Duration::ZERO);
        assert!(entry.is_expired());
    }
}
