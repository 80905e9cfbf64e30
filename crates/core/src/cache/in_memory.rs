#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use async_trait::async_trait;
use lru::LruCache;
use serde::{de::DeserializeOwned, Serialize};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::cache::backend::CacheBackend;
use crate::error::{Error, Result};

/// Cache entry with value and expiration time
struct CacheEntry {
    /// The serialized value
    value: Vec<u8>,
    /// When this entry expires
    expires_at: Option<Instant>,
}

/// In-memory cache implementation using LRU eviction
pub struct InMemoryCache {
    /// Cache data with expiration tracking
    data: RwLock<LruCache<String, CacheEntry>>,
    /// Default TTL in seconds
    default_ttl: u64,
}

impl InMemoryCache {
    /// Create a new in-memory cache
    ///
    /// # Arguments
    /// * `default_ttl` - Default time-to-live in seconds
    /// * `max_size` - Maximum number of cache entries
    #[must_use]
    pub fn new(default_ttl: u64, max_size: usize) -> Self {
        let capacity = NonZeroUsize::new(max_size)
            .unwrap_or_else(|| NonZeroUsize::new(1).expect("1 is non-zero"));
        Self {
            data: RwLock::new(LruCache::new(capacity)),
            default_ttl,
        }
    }

    fn is_expired(entry: &CacheEntry) -> bool {
        entry
            .expires_at
            .is_some_and(|expires_at| Instant::now() > expires_at)
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    #[allow(clippy::significant_drop_tightening)]
    async fn get<T: DeserializeOwned + Send + Sync>(&self, key: &str) -> Result<Option<T>> {
        // Hold the lock while checking expiration so an expired entry is
        // dropped rather than served
        let value = {
            let mut cache = self.data.write().await;

            if let Some(entry) = cache.get(key) {
                if Self::is_expired(entry) {
                    cache.pop(key);
                    return Ok(None);
                }
                Some(entry.value.clone())
            } else {
                None
            }
        };

        // Deserialize outside the lock
        value.map_or_else(
            || Ok(None),
            |serialized| {
                serde_json::from_slice::<T>(&serialized)
                    .map(Some)
                    .map_err(Error::Serialization)
            },
        )
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<u64>,
    ) -> Result<()> {
        let serialized = serde_json::to_vec(value).map_err(Error::Serialization)?;

        let ttl = ttl.unwrap_or(self.default_ttl);
        let expires_at = if ttl > 0 {
            Some(Instant::now() + Duration::from_secs(ttl))
        } else {
            None
        };

        let entry = CacheEntry {
            value: serialized,
            expires_at,
        };

        {
            #[allow(clippy::significant_drop_tightening)]
            let mut cache = self.data.write().await;
            cache.put(key.to_string(), entry);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        {
            let mut cache = self.data.write().await;
            cache.pop(key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        {
            let mut cache = self.data.write().await;
            cache.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCache::new(3600, 16);
        cache.set("fk:k1", &"value", None).await.unwrap();

        let hit: Option<String> = cache.get("fk:k1").await.unwrap();
        assert_eq!(hit.as_deref(), Some("value"));

        cache.delete("fk:k1").await.unwrap();
        let miss: Option<String> = cache.get("fk:k1").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let cache = InMemoryCache::new(3600, 16);
        // Zero TTL means no expiration; expire with a 1-second TTL instead
        cache.set("fk:k1", &42_u32, Some(1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let miss: Option<u32> = cache.get("fk:k1").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = InMemoryCache::new(3600, 2);
        cache.set("a", &1_u32, None).await.unwrap();
        cache.set("b", &2_u32, None).await.unwrap();
        cache.set("c", &3_u32, None).await.unwrap();

        let evicted: Option<u32> = cache.get("a").await.unwrap();
        assert!(evicted.is_none());
        let kept: Option<u32> = cache.get("c").await.unwrap();
        assert_eq!(kept, Some(3));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = InMemoryCache::new(3600, 16);
        cache.set("a", &1_u32, None).await.unwrap();
        cache.clear().await.unwrap();
        let miss: Option<u32> = cache.get("a").await.unwrap();
        assert!(miss.is_none());
    }
}
