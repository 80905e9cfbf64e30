#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use serde::{Deserialize, Serialize};

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,

    /// Default per-client per-endpoint requests per minute
    pub requests_per_minute: u32,

    /// Global in-flight request cap (1 second window)
    pub max_concurrent_requests: u32,

    /// Per-endpoint overrides; a request matches when the endpoint key
    /// contains the pattern
    pub endpoint_limits: Vec<(String, u32)>,
}

impl RateLimitConfig {
    /// Resolve the limit for an endpoint key (`METHOD:path`).
    #[must_use]
    pub fn limit_for(&self, endpoint_key: &str) -> u32 {
        for (pattern, limit) in &self.endpoint_limits {
            if endpoint_key.contains(pattern.as_str()) {
                return *limit;
            }
        }
        self.requests_per_minute
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 60,
            max_concurrent_requests: 100,
            endpoint_limits: vec![
                ("/api/knowledge/sync".to_string(), 5),
                ("/api/knowledge/search".to_string(), 30),
                ("/api/knowledge/".to_string(), 60),
                ("/health".to_string(), 120),
            ],
        }
    }
}
