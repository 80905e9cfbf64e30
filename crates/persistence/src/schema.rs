#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

//! Idempotent schema bootstrap. The DDL is written in the dialect subset
//! shared by sqlite and postgres; timestamps are RFC-3339 TEXT and JSON
//! sub-objects serialized TEXT so both backends expose the same contract.

use log::info;
use sqlx::query;

use crate::pool::Store;
use knowledge_core_core::error::Result;

/// Create all tables and indexes if they do not exist yet.
///
/// # Errors
/// Returns an error if any DDL statement fails
pub async fn ensure_schema(store: &Store) -> Result<()> {
    info!("Ensuring knowledge schema...");

    let statements = [
        "CREATE TABLE IF NOT EXISTS foundational_knowledge (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            classification TEXT NOT NULL,
            priority BIGINT NOT NULL,
            content TEXT NOT NULL,
            pay_ready_context TEXT,
            metadata TEXT NOT NULL,
            source TEXT NOT NULL,
            source_id TEXT,
            is_active BOOLEAN NOT NULL,
            is_foundational BOOLEAN NOT NULL,
            version BIGINT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            synced_at TEXT
        )",
        "CREATE INDEX IF NOT EXISTS idx_knowledge_classification
            ON foundational_knowledge(classification)",
        "CREATE INDEX IF NOT EXISTS idx_knowledge_category
            ON foundational_knowledge(category)",
        "CREATE INDEX IF NOT EXISTS idx_knowledge_updated_at
            ON foundational_knowledge(updated_at)",
        "CREATE TABLE IF NOT EXISTS knowledge_versions (
            version_id TEXT PRIMARY KEY,
            knowledge_id TEXT NOT NULL,
            version_number BIGINT NOT NULL,
            content TEXT NOT NULL,
            metadata TEXT,
            change_summary TEXT,
            changed_by TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (knowledge_id, version_number)
        )",
        "CREATE INDEX IF NOT EXISTS idx_versions_knowledge_id
            ON knowledge_versions(knowledge_id)",
        "CREATE TABLE IF NOT EXISTS sync_operations (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            source TEXT NOT NULL,
            status TEXT NOT NULL,
            started_at TEXT NOT NULL,
            completed_at TEXT,
            records_processed BIGINT NOT NULL,
            conflicts_detected BIGINT NOT NULL,
            error_details TEXT
        )",
        "CREATE INDEX IF NOT EXISTS idx_sync_operations_started_at
            ON sync_operations(started_at)",
        "CREATE TABLE IF NOT EXISTS sync_conflicts (
            id TEXT PRIMARY KEY,
            knowledge_id TEXT NOT NULL,
            sync_operation_id TEXT NOT NULL,
            local_snapshot TEXT NOT NULL,
            remote_snapshot TEXT NOT NULL,
            conflict_type TEXT NOT NULL,
            resolution_status TEXT NOT NULL,
            resolved_by TEXT,
            resolved_at TEXT,
            created_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_sync_conflicts_knowledge_id
            ON sync_conflicts(knowledge_id)",
    ];

    for statement in statements {
        store
            .run(statement, move |pool| async move {
                query(statement).execute(&pool).await.map(|_| ())
            })
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_core_core::config::DatabaseConfig;

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let store = Store::connect(&DatabaseConfig {
            connection_string: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        })
        .await
        .unwrap();

        ensure_schema(&store).await.unwrap();
        ensure_schema(&store).await.unwrap();
    }
}
