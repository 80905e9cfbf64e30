#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use serde::{Deserialize, Serialize};

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Secret used to sign and validate request bearer tokens (HS256)
    pub jwt_secret: String,

    /// Bearer token lifetime in seconds
    pub jwt_expiration: u64,

    /// Admin API key; requests presenting this bearer get admin access
    pub admin_api_key: Option<String>,

    /// Whether non-admin endpoints require authentication at all
    pub require_auth: bool,

    /// Serve the OpenAPI docs UI
    pub enable_docs: bool,

    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
}
