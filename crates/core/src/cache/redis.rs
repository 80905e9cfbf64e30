#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::time::timeout;

use super::CacheBackend;
use crate::error::{Error, Result};

/// Distributed cache backend over redis. Every operation runs under a short
/// timeout so a slow cache can never stall the request path.
pub struct RedisCache {
    manager: ConnectionManager,
    /// Default TTL in seconds
    default_ttl: u64,
    /// Per-operation timeout
    op_timeout: Duration,
}

impl RedisCache {
    /// Connect to redis and verify the connection with a PING.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established
    pub async fn new(redis_url: &str, default_ttl: u64, op_timeout_secs: u64) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| Error::Cache(format!("Failed to open redis client: {e}")))?;

        let op_timeout = Duration::from_secs(op_timeout_secs);
        let mut manager = timeout(op_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| Error::Cache("Timed out connecting to redis".to_string()))?
            .map_err(|e| Error::Cache(format!("Failed to connect to redis: {e}")))?;

        timeout(
            op_timeout,
            redis::cmd("PING").query_async::<_, String>(&mut manager),
        )
        .await
        .map_err(|_| Error::Cache("Timed out pinging redis".to_string()))?
        .map_err(|e| Error::Cache(format!("Failed to ping redis: {e}")))?;

        Ok(Self {
            manager,
            default_ttl,
            op_timeout,
        })
    }

    async fn bounded<T>(
        &self,
        op: impl std::future::Future<Output = redis::RedisResult<T>> + Send,
    ) -> Result<T> {
        timeout(self.op_timeout, op)
            .await
            .map_err(|_| Error::Cache("Redis operation timed out".to_string()))?
            .map_err(|e| Error::Cache(e.to_string()))
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get<T: DeserializeOwned + Send + Sync>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = self.bounded(async move { conn.get(key).await }).await?;

        raw.map_or_else(
            || Ok(None),
            |data| {
                serde_json::from_str::<T>(&data)
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
        let serialized = serde_json::to_string(value).map_err(Error::Serialization)?;
        let ttl = ttl.unwrap_or(self.default_ttl);
        let mut conn = self.manager.clone();

        if ttl > 0 {
            self.bounded(async move { conn.set_ex::<_, _, ()>(key, serialized, ttl).await })
                .await?;
        } else {
            self.bounded(async move { conn.set::<_, _, ()>(key, serialized).await })
                .await?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        self.bounded(async move { conn.del::<_, ()>(key).await })
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        self.bounded(async move {
            redis::cmd("FLUSHDB").query_async::<_, ()>(&mut conn).await
        })
        .await?;
        Ok(())
    }
}
