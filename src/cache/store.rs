use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache store error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

/// Key/value store with per-key expiry. Callers treat every error as a miss.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError>;

    /// Increments the counter at `key`, starting a `window_secs` expiry when
    /// the counter is created. Returns the value after the increment.
    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<u64, CacheError>;
}

#[derive(Clone)]
pub struct RedisCacheStore {
    redis: Arc<RedisClient>,
}

impl RedisCacheStore {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<u64, CacheError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let count: u64 = conn.incr(key, 1).await?;
        if count == 1 {
            let window = i64::try_from(window_secs).unwrap_or(i64::MAX);
            let _: () = conn.expire(key, window).await?;
        }

        Ok(count)
    }
}
