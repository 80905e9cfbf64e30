#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use async_trait::async_trait;
use sqlx::Row;
use time::OffsetDateTime;

use crate::mapper::{
    format_timestamp, map_conflict_row, map_sync_operation_row, parse_timestamp,
};
use crate::pool::Store;
use crate::sync_repository_trait::SyncRepositoryTrait;
use knowledge_core_core::error::Result;
use knowledge_core_core::knowledge::{SyncConflict, SyncOperation};

/// Repository for `sync_operations` and `sync_conflicts` rows
pub struct SyncRepository {
    store: Store,
}

#[derive(Clone)]
struct OperationRowValues {
    id: String,
    kind: String,
    source: String,
    status: String,
    started_at: String,
    completed_at: Option<String>,
    records_processed: i64,
    conflicts_detected: i64,
    error_details: Option<String>,
}

impl OperationRowValues {
    fn from_operation(operation: &SyncOperation) -> Result<Self> {
        Ok(Self {
            id: operation.id.clone(),
            kind: operation.kind.to_string(),
            source: operation.source.clone(),
            status: operation.status.to_string(),
            started_at: format_timestamp(operation.started_at)?,
            completed_at: operation.completed_at.map(format_timestamp).transpose()?,
            records_processed: operation.records_processed,
            conflicts_detected: operation.conflicts_detected,
            error_details: operation
                .error_details
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        })
    }
}

#[derive(Clone)]
struct ConflictRowValues {
    id: String,
    knowledge_id: String,
    sync_operation_id: String,
    local_snapshot: String,
    remote_snapshot: String,
    conflict_type: String,
    resolution_status: String,
    resolved_by: Option<String>,
    resolved_at: Option<String>,
    created_at: String,
}

impl ConflictRowValues {
    fn from_conflict(conflict: &SyncConflict) -> Result<Self> {
        Ok(Self {
            id: conflict.id.clone(),
            knowledge_id: conflict.knowledge_id.clone(),
            sync_operation_id: conflict.sync_operation_id.clone(),
            local_snapshot: serde_json::to_string(&conflict.local_snapshot)?,
            remote_snapshot: serde_json::to_string(&conflict.remote_snapshot)?,
            conflict_type: conflict.conflict_type.to_string(),
            resolution_status: conflict.resolution_status.to_string(),
            resolved_by: conflict.resolved_by.clone(),
            resolved_at: conflict.resolved_at.map(format_timestamp).transpose()?,
            created_at: format_timestamp(conflict.created_at)?,
        })
    }
}

impl SyncRepository {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SyncRepositoryTrait for SyncRepository {
    async fn create_operation(&self, operation: &SyncOperation) -> Result<()> {
        let row = OperationRowValues::from_operation(operation)?;
        let sql = "INSERT INTO sync_operations (
                id, kind, source, status, started_at, completed_at,
                records_processed, conflicts_detected, error_details
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)";

        self.store
            .run(sql, move |pool| {
                let row = row.clone();
                async move {
                    sqlx::query(sql)
                        .bind(row.id)
                        .bind(row.kind)
                        .bind(row.source)
                        .bind(row.status)
                        .bind(row.started_at)
                        .bind(row.completed_at)
                        .bind(row.records_processed)
                        .bind(row.conflicts_detected)
                        .bind(row.error_details)
                        .execute(&pool)
                        .await
                        .map(|_| ())
                }
            })
            .await
    }

    async fn update_operation(&self, operation: &SyncOperation) -> Result<()> {
        let row = OperationRowValues::from_operation(operation)?;
        let sql = "UPDATE sync_operations SET
                status = $1, completed_at = $2, records_processed = $3,
                conflicts_detected = $4, error_details = $5
            WHERE id = $6";

        self.store
            .run(sql, move |pool| {
                let row = row.clone();
                async move {
                    sqlx::query(sql)
                        .bind(row.status)
                        .bind(row.completed_at)
                        .bind(row.records_processed)
                        .bind(row.conflicts_detected)
                        .bind(row.error_details)
                        .bind(row.id)
                        .execute(&pool)
                        .await
                        .map(|_| ())
                }
            })
            .await
    }

    async fn list_operations(&self, limit: i64) -> Result<Vec<SyncOperation>> {
        let sql = "SELECT * FROM sync_operations ORDER BY started_at DESC LIMIT $1";
        let rows = self
            .store
            .run(sql, move |pool| async move {
                sqlx::query(sql).bind(limit).fetch_all(&pool).await
            })
            .await?;

        rows.iter().map(map_sync_operation_row).collect()
    }

    async fn last_successful_sync(&self) -> Result<Option<OffsetDateTime>> {
        let sql = "SELECT completed_at FROM sync_operations
             WHERE status = 'completed' AND completed_at IS NOT NULL
             ORDER BY completed_at DESC LIMIT 1";
        let row = self
            .store
            .run(sql, move |pool| async move {
                sqlx::query(sql).fetch_optional(&pool).await
            })
            .await?;

        row.map(|r| -> Result<OffsetDateTime> {
            let raw: String = r.try_get("completed_at")?;
            parse_timestamp(&raw)
        })
        .transpose()
    }

    async fn delete_operations_before(&self, cutoff: OffsetDateTime) -> Result<u64> {
        let sql = "DELETE FROM sync_operations WHERE started_at < $1";
        let cutoff = format_timestamp(cutoff)?;

        self.store
            .run(sql, move |pool| {
                let cutoff = cutoff.clone();
                async move {
                    sqlx::query(sql)
                        .bind(cutoff)
                        .execute(&pool)
                        .await
                        .map(|r| r.rows_affected())
                }
            })
            .await
    }

    async fn create_conflict(&self, conflict: &SyncConflict) -> Result<()> {
        let row = ConflictRowValues::from_conflict(conflict)?;
        let sql = "INSERT INTO sync_conflicts (
                id, knowledge_id, sync_operation_id, local_snapshot,
                remote_snapshot, conflict_type, resolution_status, resolved_by,
                resolved_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)";

        self.store
            .run(sql, move |pool| {
                let row = row.clone();
                async move {
                    sqlx::query(sql)
                        .bind(row.id)
                        .bind(row.knowledge_id)
                        .bind(row.sync_operation_id)
                        .bind(row.local_snapshot)
                        .bind(row.remote_snapshot)
                        .bind(row.conflict_type)
                        .bind(row.resolution_status)
                        .bind(row.resolved_by)
                        .bind(row.resolved_at)
                        .bind(row.created_at)
                        .execute(&pool)
                        .await
                        .map(|_| ())
                }
            })
            .await
    }

    async fn update_conflict(&self, conflict: &SyncConflict) -> Result<()> {
        let row = ConflictRowValues::from_conflict(conflict)?;
        let sql = "UPDATE sync_conflicts SET
                resolution_status = $1, resolved_by = $2, resolved_at = $3
            WHERE id = $4";

        self.store
            .run(sql, move |pool| {
                let row = row.clone();
                async move {
                    sqlx::query(sql)
                        .bind(row.resolution_status)
                        .bind(row.resolved_by)
                        .bind(row.resolved_at)
                        .bind(row.id)
                        .execute(&pool)
                        .await
                        .map(|_| ())
                }
            })
            .await
    }

    async fn list_pending_conflicts(&self, limit: i64) -> Result<Vec<SyncConflict>> {
        let sql = "SELECT * FROM sync_conflicts
             WHERE resolution_status = 'pending'
             ORDER BY created_at ASC LIMIT $1";
        let rows = self
            .store
            .run(sql, move |pool| async move {
                sqlx::query(sql).bind(limit).fetch_all(&pool).await
            })
            .await?;

        rows.iter().map(map_conflict_row).collect()
    }
}
