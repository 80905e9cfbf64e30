#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use serde::{Deserialize, Serialize};

use crate::knowledge::KnowledgeClassification;

/// One remote table to synchronize, with the default classification tier
/// assigned to records imported from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncTableConfig {
    /// Remote table name
    pub name: String,

    /// Default classification for records from this table
    pub classification: KnowledgeClassification,
}

/// Airtable synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Airtable personal access token; sync is disabled when unset
    pub api_key: Option<String>,

    /// Airtable base id
    pub base_id: String,

    /// Airtable API base URL (overridable for tests)
    pub api_url: String,

    /// Tables to synchronize and their default tiers
    pub tables: Vec<SyncTableConfig>,

    /// Incremental sync interval in minutes
    pub incremental_interval_minutes: u64,

    /// Cron expression for the daily full sync (seconds-resolution, UTC)
    pub full_sync_cron: String,

    /// Consecutive failures before the scheduler pauses itself
    pub max_consecutive_failures: u32,

    /// Whether scheduled syncs run at all
    pub auto_sync_enabled: bool,

    /// Total timeout for remote HTTP calls in seconds
    pub http_timeout: u64,
}

impl SyncConfig {
    /// Default table set for the CEO knowledge base.
    #[must_use]
    pub fn default_tables() -> Vec<SyncTableConfig> {
        vec![
            SyncTableConfig {
                name: "Strategic Knowledge".to_string(),
                classification: KnowledgeClassification::Foundational,
            },
            SyncTableConfig {
                name: "Strategic Initiatives".to_string(),
                classification: KnowledgeClassification::Strategic,
            },
            SyncTableConfig {
                name: "Executive Decisions".to_string(),
                classification: KnowledgeClassification::Strategic,
            },
        ]
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_id: "appBOVJqGE166onrD".to_string(),
            api_url: "https://api.airtable.com/v0".to_string(),
            tables: Self::default_tables(),
            incremental_interval_minutes: 60,
            full_sync_cron: "0 0 2 * * *".to_string(),
            max_consecutive_failures: 3,
            auto_sync_enabled: true,
            http_timeout: 30,
        }
    }
}
