#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use serde::{Deserialize, Serialize};

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable caching
    pub enabled: bool,

    /// Cache time-to-live in seconds (default TTL)
    pub ttl: u64,

    /// Maximum cache size (number of items)
    pub max_size: u64,

    /// Optional distributed cache URL (redis); empty means in-memory only
    pub redis_url: Option<String>,

    /// Timeout for distributed cache operations in seconds
    pub operation_timeout: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: 3600,
            max_size: 10000,
            redis_url: None,
            operation_timeout: 2,
        }
    }
}
