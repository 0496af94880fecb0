//! Cache manager that dispatches to the configured provider.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use aufloes_core::config::cache::CacheConfig;
use aufloes_core::error::AppError;
use aufloes_core::result::AppResult;
use aufloes_core::traits::cache::{CachedResponse, ResponseCache};

/// Cache manager that wraps the configured cache provider.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// The inner cache provider.
    inner: Arc<dyn ResponseCache>,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn ResponseCache> = match config.provider.as_str() {
            #[cfg(feature = "memory")]
            "memory" => {
                info!(
                    max_capacity = config.max_capacity,
                    "Initializing in-memory response cache"
                );
                Arc::new(crate::memory::MemoryResponseCache::new(config.max_capacity))
            }
            "disabled" => {
                info!("Response caching disabled");
                Arc::new(crate::disabled::DisabledCache)
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, disabled"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a cache manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn ResponseCache>) -> Self {
        Self { inner: provider }
    }
}

#[async_trait]
impl ResponseCache for CacheManager {
    async fn get(&self, key: &str) -> AppResult<Option<CachedResponse>> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: &str, response: CachedResponse) -> AppResult<()> {
        self.inner.insert(key, response).await
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.inner.remove(key).await
    }

    async fn clear(&self) -> AppResult<()> {
        self.inner.clear().await
    }

    fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use aufloes_core::error::ErrorKind;

    fn config(provider: &str) -> CacheConfig {
        CacheConfig {
            provider: provider.to_string(),
            ..CacheConfig::default()
        }
    }

    #[tokio::test]
    async fn test_memory_provider_stores() {
        let cache = CacheManager::new(&config("memory")).unwrap();
        let entry = CachedResponse::new(Bytes::from_static(b"data"), Duration::from_secs(60));
        cache.insert("key", entry).await.unwrap();
        assert!(cache.get("key").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_disabled_provider_always_misses() {
        let cache = CacheManager::new(&config("disabled")).unwrap();
        let entry = CachedResponse::new(Bytes::from_static(b"data"), Duration::from_secs(60));
        cache.insert("key", entry).await.unwrap();
        assert!(cache.get("key").await.unwrap().is_none());
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn test_unknown_provider() {
        let err = CacheManager::new(&config("redis")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
