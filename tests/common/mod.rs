use knowledge_core::bootstrap::{build_app, AppContext};
use knowledge_core_core::config::{
    ApiConfig, AppConfig, CacheConfig, DatabaseConfig, LogConfig, RateLimitConfig, SyncConfig,
};

/// Configuration for tests: in-memory sqlite, no remote systems, auth off
/// unless a test flips it on.
pub fn test_config() -> AppConfig {
    AppConfig {
        environment: "test".to_string(),
        database: DatabaseConfig {
            connection_string: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        },
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_expiration: 3600,
            admin_api_key: Some("admin-key".to_string()),
            require_auth: false,
            enable_docs: false,
            cors_origins: vec!["*".to_string()],
        },
        cache: CacheConfig::default(),
        sync: SyncConfig {
            auto_sync_enabled: false,
            ..SyncConfig::default()
        },
        rate_limit: RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        },
        log: LogConfig::default(),
    }
}

pub async fn build_test_app() -> AppContext {
    build_app(&test_config())
        .await
        .expect("test app should build against in-memory sqlite")
}
