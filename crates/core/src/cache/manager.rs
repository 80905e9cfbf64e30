#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use std::sync::Arc;

use crate::cache::backend::CacheBackend;
use crate::cache::in_memory::InMemoryCache;
use crate::cache::redis::RedisCache;
use crate::config::CacheConfig;
use crate::error::Result;

/// Cache manager composing the in-memory cache with an optional distributed
/// backend. The distributed backend is consulted first on reads so that
/// cross-process invalidations are seen; writes go to both.
pub struct CacheManager {
    config: CacheConfig,
    in_memory: Arc<InMemoryCache>,
    redis: Option<Arc<RedisCache>>,
}

impl CacheManager {
    /// Create a new cache manager with the given configuration
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let max_size = usize::try_from(config.max_size).unwrap_or(10000);
        let in_memory = Arc::new(InMemoryCache::new(config.ttl, max_size));

        Self {
            config,
            in_memory,
            redis: None,
        }
    }

    /// Add a distributed redis backend
    ///
    /// # Errors
    /// Returns an error if the redis connection fails
    pub async fn with_redis(mut self, redis_url: &str) -> Result<Self> {
        if redis_url.is_empty() {
            return Ok(self);
        }

        let redis_cache =
            RedisCache::new(redis_url, self.config.ttl, self.config.operation_timeout).await?;
        self.redis = Some(Arc::new(redis_cache));

        Ok(self)
    }

    /// Whether caching is enabled at all
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Default TTL in seconds
    #[must_use]
    pub const fn default_ttl(&self) -> u64 {
        self.config.ttl
    }

    /// Get a value from the cache
    ///
    /// # Errors
    /// Returns an error if cache retrieval fails
    pub async fn get<T: serde::de::DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>> {
        if !self.config.enabled {
            return Ok(None);
        }

        if let Some(redis) = &self.redis {
            match redis.get::<T>(key).await {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Redis cache error: {e}");
                    // Fall through to the in-memory cache
                }
            }
        }

        self.in_memory.get::<T>(key).await
    }

    /// Set a value in the cache
    ///
    /// # Errors
    /// Returns an error if cache storage fails
    pub async fn set<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<u64>,
    ) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let ttl = ttl.unwrap_or(self.config.ttl);

        if let Some(redis) = &self.redis {
            if let Err(e) = redis.set::<T>(key, value, Some(ttl)).await {
                log::warn!("Redis cache error: {e}");
            }
        }

        self.in_memory.set::<T>(key, value, Some(ttl)).await
    }

    /// Delete a value from the cache
    ///
    /// # Errors
    /// Returns an error if cache deletion fails
    pub async fn delete(&self, key: &str) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        if let Some(redis) = &self.redis {
            if let Err(e) = redis.delete(key).await {
                log::warn!("Redis cache error: {e}");
            }
        }

        self.in_memory.delete(key).await
    }

    /// Clear the entire cache
    ///
    /// # Errors
    /// Returns an error if cache clearing fails
    pub async fn clear(&self) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        if let Some(redis) = &self.redis {
            if let Err(e) = redis.clear().await {
                log::warn!("Redis cache error: {e}");
            }
        }

        self.in_memory.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(enabled: bool) -> CacheManager {
        CacheManager::new(CacheConfig {
            enabled,
            ttl: 3600,
            max_size: 16,
            redis_url: None,
            operation_timeout: 2,
        })
    }

    #[tokio::test]
    async fn test_disabled_cache_is_a_no_op() {
        let cache = manager(false);
        cache.set("fk:k1", &"value", None).await.unwrap();
        let hit: Option<String> = cache.get("fk:k1").await.unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn test_in_memory_round_trip_without_redis() {
        let cache = manager(true);
        cache.set("fk:k1", &"value", None).await.unwrap();
        let hit: Option<String> = cache.get("fk:k1").await.unwrap();
        assert_eq!(hit.as_deref(), Some("value"));

        cache.delete("fk:k1").await.unwrap();
        let miss: Option<String> = cache.get("fk:k1").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_with_redis_empty_url_is_ignored() {
        let cache = manager(true).with_redis("").await.unwrap();
        assert!(cache.redis.is_none());
    }
}
