use std::future::Future;
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use crate::cache::store::CacheStore;

/// Read-through cache for idempotent reads.
///
/// A hit returns the stored value without running `compute`. A miss, an
/// undecodable entry or an unreachable store all fall through to `compute`;
/// the cache never turns a successful read into a failure. Entries are never
/// invalidated by writes and live for their full TTL.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn CacheStore> {
        Arc::clone(&self.store)
    }

    pub async fn read<T, E, F, Fut>(&self, key: &str, ttl_secs: u64, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.store.get(key).await {
            Ok(Some(cached)) => match serde_json::from_str::<T>(&cached) {
                Ok(value) => {
                    tracing::debug!("Cache hit: {}", key);
                    return Ok(value);
                }
                Err(e) => tracing::warn!("Discarding undecodable cache entry {}: {}", key, e),
            },
            Ok(None) => tracing::debug!("Cache miss: {}", key),
            Err(e) => tracing::warn!("Cache store unavailable, reading through: {}", e),
        }

        let value = compute().await?;

        match serde_json::to_string(&value) {
            Ok(serialized) => {
                let store = Arc::clone(&self.store);
                let key = key.to_string();
                // The response does not wait on the cache write.
                tokio::spawn(async move {
                    match store.set_ex(&key, serialized, ttl_secs).await {
                        Ok(()) => tracing::debug!("Cached {} for {}s", key, ttl_secs),
                        Err(e) => tracing::warn!("Failed to cache {}: {}", key, e),
                    }
                });
            }
            Err(e) => tracing::warn!("Failed to serialize {} for cache: {}", key, e),
        }

        Ok(value)
    }
}
