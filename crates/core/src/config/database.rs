#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use serde::{Deserialize, Serialize};

/// Which storage backend the connection string selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseBackend {
    /// Single-file embedded store (sqlite)
    Embedded,
    /// Networked relational store (postgres)
    Networked,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection string; the URL scheme selects the backend
    pub connection_string: String,

    /// Minimum number of pooled connections (networked backend)
    pub min_connections: u32,

    /// Maximum number of pooled connections (networked backend)
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    pub connection_timeout: u64,

    /// Recycle connections older than this many seconds
    pub max_lifetime: u64,
}

impl DatabaseConfig {
    /// Determine the backend from the connection string scheme.
    #[must_use]
    pub fn backend(&self) -> DatabaseBackend {
        if self.connection_string.starts_with("sqlite") {
            DatabaseBackend::Embedded
        } else {
            DatabaseBackend::Networked
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: "sqlite://knowledge.db".to_string(),
            min_connections: 2,
            max_connections: 20,
            connection_timeout: 10,
            max_lifetime: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_scheme() {
        let mut config = DatabaseConfig::default();
        assert_eq!(config.backend(), DatabaseBackend::Embedded);

        config.connection_string = "postgres://sophia@localhost/knowledge".to_string();
        assert_eq!(config.backend(), DatabaseBackend::Networked);

        config.connection_string = "sqlite::memory:".to_string();
        assert_eq!(config.backend(), DatabaseBackend::Embedded);
    }
}
