#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use serde::{Deserialize, Serialize};

use crate::config::{ApiConfig, CacheConfig, DatabaseConfig, LogConfig, RateLimitConfig, SyncConfig};

/// Top-level application configuration, loaded once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment name (development, staging, production)
    pub environment: String,

    /// Database configuration
    pub database: DatabaseConfig,

    /// HTTP API configuration
    pub api: ApiConfig,

    /// Cache configuration
    pub cache: CacheConfig,

    /// Airtable synchronization configuration
    pub sync: SyncConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    pub log: LogConfig,
}
