#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

use dotenvy::dotenv;
use std::env;

use crate::config::{
    ApiConfig, AppConfig, CacheConfig, DatabaseConfig, LogConfig, RateLimitConfig, SyncConfig,
    SyncTableConfig,
};
use crate::error::Result;
use crate::knowledge::KnowledgeClassification;

/// Load application configuration from environment variables
///
/// # Errors
/// Returns an error if required environment variables are missing or invalid
pub fn load_app_config() -> Result<AppConfig> {
    // Load .env file if present
    dotenv().ok();

    let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

    let database = DatabaseConfig {
        connection_string: env::var("DATABASE_URL")
            .map_err(|_| crate::error::Error::Config("DATABASE_URL not set".to_string()))?,
        min_connections: env::var("DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "2".to_string())
            .parse()
            .unwrap_or(2),
        max_connections: env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .unwrap_or(20),
        connection_timeout: env::var("DATABASE_CONNECTION_TIMEOUT")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10),
        max_lifetime: env::var("DATABASE_MAX_LIFETIME")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600),
    };

    let api = ApiConfig {
        host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        port: env::var("API_PORT")
            .unwrap_or_else(|_| "8005".to_string())
            .parse()
            .unwrap_or(8005),
        jwt_secret: env::var("JWT_SECRET")
            .map_err(|_| crate::error::Error::Config("JWT_SECRET not set".to_string()))?,
        jwt_expiration: env::var("JWT_EXPIRATION")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400),
        admin_api_key: env::var("ADMIN_API_KEY").ok().filter(|v| !v.is_empty()),
        require_auth: env::var("REQUIRE_AUTH")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true),
        enable_docs: env::var("API_ENABLE_DOCS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true),
        cors_origins: env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect(),
    };

    let log = LogConfig {
        level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
    };

    Ok(AppConfig {
        environment,
        database,
        api,
        cache: get_cache_config(),
        sync: get_sync_config(),
        rate_limit: get_rate_limit_config(),
        log,
    })
}

fn get_cache_config() -> CacheConfig {
    CacheConfig {
        enabled: env::var("CACHE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true),
        ttl: env::var("CACHE_TTL")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600),
        max_size: env::var("CACHE_MAX_SIZE")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .unwrap_or(10000),
        redis_url: env::var("REDIS_CACHE_URL").ok().filter(|v| !v.is_empty()),
        operation_timeout: env::var("CACHE_OPERATION_TIMEOUT")
            .unwrap_or_else(|_| "2".to_string())
            .parse()
            .unwrap_or(2),
    }
}

fn get_sync_config() -> SyncConfig {
    let defaults = SyncConfig::default();

    // AIRTABLE_PAT is the newer name; AIRTABLE_API_KEY kept for compatibility
    let api_key = env::var("AIRTABLE_PAT")
        .or_else(|_| env::var("AIRTABLE_API_KEY"))
        .ok()
        .filter(|v| !v.is_empty());

    SyncConfig {
        api_key,
        base_id: env::var("AIRTABLE_BASE_ID").unwrap_or(defaults.base_id),
        api_url: env::var("AIRTABLE_API_URL").unwrap_or(defaults.api_url),
        tables: env::var("AIRTABLE_TABLES")
            .ok()
            .map_or(defaults.tables, |raw| parse_table_list(&raw)),
        incremental_interval_minutes: env::var("SYNC_INCREMENTAL_INTERVAL_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60),
        full_sync_cron: env::var("SYNC_FULL_CRON").unwrap_or(defaults.full_sync_cron),
        max_consecutive_failures: env::var("SYNC_MAX_CONSECUTIVE_FAILURES")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .unwrap_or(3),
        auto_sync_enabled: env::var("AUTO_SYNC_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true),
        http_timeout: env::var("SYNC_HTTP_TIMEOUT")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30),
    }
}

/// Parse `"Table A:foundational,Table B:strategic"` into table configs.
/// Entries without a tier default to foundational.
fn parse_table_list(raw: &str) -> Vec<SyncTableConfig> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let (name, tier) = entry
                .rsplit_once(':')
                .map_or((entry, "foundational"), |(n, t)| (n.trim(), t.trim()));
            Some(SyncTableConfig {
                name: name.to_string(),
                classification: tier
                    .parse()
                    .unwrap_or(KnowledgeClassification::Foundational),
            })
        })
        .collect()
}

fn get_rate_limit_config() -> RateLimitConfig {
    let defaults = RateLimitConfig::default();

    RateLimitConfig {
        enabled: env::var("RATE_LIMIT_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true),
        requests_per_minute: env::var("RATE_LIMIT_REQUESTS_PER_MINUTE")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60),
        max_concurrent_requests: env::var("MAX_CONCURRENT_REQUESTS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .unwrap_or(100),
        endpoint_limits: defaults.endpoint_limits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_list() {
        let tables = parse_table_list("Strategic Knowledge:foundational, Metrics:operational");
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "Strategic Knowledge");
        assert_eq!(
            tables[0].classification,
            KnowledgeClassification::Foundational
        );
        assert_eq!(tables[1].name, "Metrics");
        assert_eq!(
            tables[1].classification,
            KnowledgeClassification::Operational
        );
    }

    #[test]
    fn test_parse_table_list_defaults_tier() {
        let tables = parse_table_list("Executive Decisions");
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].classification,
            KnowledgeClassification::Foundational
        );
    }
}
