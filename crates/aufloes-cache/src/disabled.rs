//! Cache provider that stores nothing.

use async_trait::async_trait;

use aufloes_core::result::AppResult;
use aufloes_core::traits::cache::{CachedResponse, ResponseCache};

/// Cache provider used when caching is turned off.
#[derive(Debug, Clone, Default)]
pub struct DisabledCache;

#[async_trait]
impl ResponseCache for DisabledCache {
    async fn get(&self, _key: &str) -> AppResult<Option<CachedResponse>> {
        Ok(None)
    }

    async fn insert(&self, _key: &str, _response: CachedResponse) -> AppResult<()> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> AppResult<()> {
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        Ok(())
    }

    fn entry_count(&self) -> u64 {
        0
    }
}
