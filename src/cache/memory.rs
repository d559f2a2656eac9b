use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::store::{CacheError, CacheStore};

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process cache store. Expiry follows the tokio clock, so paused-time
/// tests can step past a TTL without sleeping.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .lock()
            .await
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        let count = match entries.get(key) {
            Some(entry) if entry.is_live(now) => entry
                .value
                .parse::<u64>()
                .map_err(|e| CacheError::Unavailable(e.to_string()))?
                + 1,
            _ => 1,
        };

        let expires_at = match entries.get(key) {
            Some(entry) if count > 1 => entry.expires_at,
            _ => now + Duration::from_secs(window_secs),
        };
        entries.insert(
            key.to_string(),
            Entry {
                value: count.to_string(),
                expires_at,
            },
        );

        Ok(count)
    }
}
