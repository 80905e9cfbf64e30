#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use async_trait::async_trait;
use sqlx::Row;

use crate::mapper::{format_timestamp, map_version_row};
use crate::pool::Store;
use crate::version_repository_trait::VersionRepositoryTrait;
use knowledge_core_core::error::{Error, Result};
use knowledge_core_core::knowledge::KnowledgeVersion;

/// Repository for the append-only `knowledge_versions` log
pub struct VersionRepository {
    store: Store,
}

#[derive(Clone)]
struct VersionRowValues {
    version_id: String,
    knowledge_id: String,
    version_number: i64,
    content: String,
    metadata: Option<String>,
    change_summary: Option<String>,
    changed_by: Option<String>,
    created_at: String,
}

impl VersionRepository {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl VersionRepositoryTrait for VersionRepository {
    async fn append(&self, version: &KnowledgeVersion) -> Result<()> {
        let row = VersionRowValues {
            version_id: version.version_id.clone(),
            knowledge_id: version.knowledge_id.clone(),
            version_number: version.version_number,
            content: serde_json::to_string(&version.content)?,
            metadata: version
                .metadata
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            change_summary: version.change_summary.clone(),
            changed_by: version.changed_by.clone(),
            created_at: format_timestamp(version.created_at)?,
        };

        let sql = "INSERT INTO knowledge_versions (
                version_id, knowledge_id, version_number, content, metadata,
                change_summary, changed_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

        let result = self
            .store
            .run(sql, move |pool| {
                let row = row.clone();
                async move {
                    sqlx::query(sql)
                        .bind(row.version_id)
                        .bind(row.knowledge_id)
                        .bind(row.version_number)
                        .bind(row.content)
                        .bind(row.metadata)
                        .bind(row.change_summary)
                        .bind(row.changed_by)
                        .bind(row.created_at)
                        .execute(&pool)
                        .await
                        .map(|_| ())
                }
            })
            .await;

        match result {
            Err(Error::Database(sqlx::Error::Database(db)))
                if db.kind() == sqlx::error::ErrorKind::UniqueViolation =>
            {
                Err(Error::Conflict(format!(
                    "Version {} already exists for knowledge {}",
                    version.version_number, version.knowledge_id
                )))
            }
            other => other,
        }
    }

    async fn list(&self, knowledge_id: &str) -> Result<Vec<KnowledgeVersion>> {
        let sql = "SELECT * FROM knowledge_versions
             WHERE knowledge_id = $1
             ORDER BY version_number DESC";
        let knowledge_id = knowledge_id.to_string();

        let rows = self
            .store
            .run(sql, move |pool| {
                let knowledge_id = knowledge_id.clone();
                async move {
                    sqlx::query(sql)
                        .bind(knowledge_id)
                        .fetch_all(&pool)
                        .await
                }
            })
            .await?;

        rows.iter().map(map_version_row).collect()
    }

    async fn get(
        &self,
        knowledge_id: &str,
        version_number: i64,
    ) -> Result<Option<KnowledgeVersion>> {
        let sql = "SELECT * FROM knowledge_versions
             WHERE knowledge_id = $1 AND version_number = $2";
        let knowledge_id = knowledge_id.to_string();

        let row = self
            .store
            .run(sql, move |pool| {
                let knowledge_id = knowledge_id.clone();
                async move {
                    sqlx::query(sql)
                        .bind(knowledge_id)
                        .bind(version_number)
                        .fetch_optional(&pool)
                        .await
                }
            })
            .await?;

        row.as_ref().map(map_version_row).transpose()
    }

    async fn count(&self, knowledge_id: &str) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM knowledge_versions WHERE knowledge_id = $1";
        let knowledge_id = knowledge_id.to_string();

        let row = self
            .store
            .run(sql, move |pool| {
                let knowledge_id = knowledge_id.clone();
                async move { sqlx::query(sql).bind(knowledge_id).fetch_one(&pool).await }
            })
            .await?;

        Ok(row.try_get("count")?)
    }
}
