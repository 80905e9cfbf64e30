#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use async_trait::async_trait;
use sqlx::Row;
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::knowledge_repository_trait::{EntityFilter, KnowledgeRepositoryTrait, KnowledgeStats};
use crate::mapper::{format_timestamp, map_entity_row};
use crate::pool::Store;
use knowledge_core_core::error::{Error, Result};
use knowledge_core_core::knowledge::KnowledgeEntity;

/// Search results are capped at this many rows
const SEARCH_LIMIT: i64 = 20;

/// Repository for `foundational_knowledge` rows
pub struct KnowledgeRepository {
    store: Store,
}

/// Column values of one entity row, in insert order
#[derive(Clone)]
struct EntityRowValues {
    id: String,
    name: String,
    category: String,
    classification: String,
    priority: i64,
    content: String,
    pay_ready_context: Option<String>,
    metadata: String,
    source: String,
    source_id: Option<String>,
    is_active: bool,
    is_foundational: bool,
    version: i64,
    created_at: String,
    updated_at: String,
    synced_at: Option<String>,
}

impl EntityRowValues {
    fn from_entity(entity: &KnowledgeEntity) -> Result<Self> {
        Ok(Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            category: entity.category.clone(),
            classification: entity.classification.as_str().to_string(),
            priority: entity.priority.as_i64(),
            content: serde_json::to_string(&entity.content)?,
            pay_ready_context: entity
                .pay_ready_context
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            metadata: serde_json::to_string(&entity.metadata)?,
            source: entity.source.clone(),
            source_id: entity.source_id.clone(),
            is_active: entity.is_active,
            is_foundational: entity.is_foundational,
            version: entity.version,
            created_at: format_timestamp(entity.created_at)?,
            updated_at: format_timestamp(entity.updated_at)?,
            synced_at: entity
                .synced_at
                .map(format_timestamp)
                .transpose()?,
        })
    }
}

impl KnowledgeRepository {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn is_unique_violation(error: &Error) -> bool {
        match error {
            Error::Database(sqlx::Error::Database(db)) => {
                db.kind() == sqlx::error::ErrorKind::UniqueViolation
            }
            _ => false,
        }
    }
}

#[async_trait]
impl KnowledgeRepositoryTrait for KnowledgeRepository {
    async fn create(&self, entity: &KnowledgeEntity) -> Result<KnowledgeEntity> {
        let _guard = self.store.write_guard().await;
        let row = EntityRowValues::from_entity(entity)?;

        let sql = "INSERT INTO foundational_knowledge (
                id, name, category, classification, priority, content,
                pay_ready_context, metadata, source, source_id, is_active,
                is_foundational, version, created_at, updated_at, synced_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)";

        let result = self
            .store
            .run(sql, move |pool| {
                let row = row.clone();
                async move {
                    sqlx::query(sql)
                        .bind(row.id)
                        .bind(row.name)
                        .bind(row.category)
                        .bind(row.classification)
                        .bind(row.priority)
                        .bind(row.content)
                        .bind(row.pay_ready_context)
                        .bind(row.metadata)
                        .bind(row.source)
                        .bind(row.source_id)
                        .bind(row.is_active)
                        .bind(row.is_foundational)
                        .bind(row.version)
                        .bind(row.created_at)
                        .bind(row.updated_at)
                        .bind(row.synced_at)
                        .execute(&pool)
                        .await
                        .map(|_| ())
                }
            })
            .await;

        match result {
            Ok(()) => Ok(entity.clone()),
            Err(e) if Self::is_unique_violation(&e) => Err(Error::Conflict(format!(
                "Knowledge entity {} already exists",
                entity.id
            ))),
            Err(e) => Err(e),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<KnowledgeEntity>> {
        let sql = "SELECT * FROM foundational_knowledge WHERE id = $1";
        let id = id.to_string();

        let row = self
            .store
            .run(sql, move |pool| {
                let id = id.clone();
                async move { sqlx::query(sql).bind(id).fetch_optional(&pool).await }
            })
            .await?;

        row.as_ref().map(map_entity_row).transpose()
    }

    async fn update(&self, entity: &KnowledgeEntity) -> Result<KnowledgeEntity> {
        let _guard = self.store.write_guard().await;

        // The store stamps updated_at on every update
        let mut updated = entity.clone();
        updated.updated_at = OffsetDateTime::now_utc();
        let row = EntityRowValues::from_entity(&updated)?;

        let sql = "UPDATE foundational_knowledge SET
                name = $1, category = $2, classification = $3, priority = $4,
                content = $5, pay_ready_context = $6, metadata = $7, source = $8,
                source_id = $9, is_active = $10, is_foundational = $11,
                version = $12, updated_at = $13, synced_at = $14
            WHERE id = $15";

        let affected = self
            .store
            .run(sql, move |pool| {
                let row = row.clone();
                async move {
                    sqlx::query(sql)
                        .bind(row.name)
                        .bind(row.category)
                        .bind(row.classification)
                        .bind(row.priority)
                        .bind(row.content)
                        .bind(row.pay_ready_context)
                        .bind(row.metadata)
                        .bind(row.source)
                        .bind(row.source_id)
                        .bind(row.is_active)
                        .bind(row.is_foundational)
                        .bind(row.version)
                        .bind(row.updated_at)
                        .bind(row.synced_at)
                        .bind(row.id)
                        .execute(&pool)
                        .await
                        .map(|r| r.rows_affected())
                }
            })
            .await?;

        if affected == 0 {
            return Err(Error::NotFound(format!(
                "Knowledge entity {} not found",
                entity.id
            )));
        }

        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.store.write_guard().await;
        let sql = "DELETE FROM foundational_knowledge WHERE id = $1";
        let id = id.to_string();

        // Version rows go with the entity, atomically
        let affected = self
            .store
            .run(sql, move |pool| {
                let id = id.clone();
                async move {
                    let mut tx = pool.begin().await?;
                    sqlx::query("DELETE FROM knowledge_versions WHERE knowledge_id = $1")
                        .bind(id.clone())
                        .execute(&mut *tx)
                        .await?;
                    let result = sqlx::query(sql).bind(id).execute(&mut *tx).await?;
                    tx.commit().await?;
                    Ok(result.rows_affected())
                }
            })
            .await?;

        Ok(affected > 0)
    }

    async fn list(
        &self,
        filter: &EntityFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KnowledgeEntity>> {
        let mut conditions = Vec::new();
        let mut placeholder = 1;

        if filter.classification.is_some() {
            conditions.push(format!("classification = ${placeholder}"));
            placeholder += 1;
        }
        if filter.category.is_some() {
            conditions.push(format!("category = ${placeholder}"));
            placeholder += 1;
        }
        if filter.is_active.is_some() {
            conditions.push(format!("is_active = ${placeholder}"));
            placeholder += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT * FROM foundational_knowledge{where_clause}
             ORDER BY priority DESC, updated_at DESC
             LIMIT ${placeholder} OFFSET ${}",
            placeholder + 1
        );

        let classification = filter.classification.map(|c| c.as_str().to_string());
        let category = filter.category.clone();
        let is_active = filter.is_active;
        let label = sql.clone();

        let rows = self
            .store
            .run(&label, move |pool| {
                let sql = sql.clone();
                let classification = classification.clone();
                let category = category.clone();
                async move {
                    let mut query = sqlx::query(&sql);
                    if let Some(classification) = classification {
                        query = query.bind(classification);
                    }
                    if let Some(category) = category {
                        query = query.bind(category);
                    }
                    if let Some(is_active) = is_active {
                        query = query.bind(is_active);
                    }
                    query.bind(limit).bind(offset).fetch_all(&pool).await
                }
            })
            .await?;

        rows.iter().map(map_entity_row).collect()
    }

    async fn search(&self, query: &str) -> Result<Vec<KnowledgeEntity>> {
        let sql = "SELECT * FROM foundational_knowledge
             WHERE is_active = TRUE AND (LOWER(name) LIKE $1 OR LOWER(content) LIKE $2)
             ORDER BY priority DESC
             LIMIT $3";
        let pattern = format!("%{}%", query.to_lowercase());

        let rows = self
            .store
            .run(sql, move |pool| {
                let pattern = pattern.clone();
                async move {
                    sqlx::query(sql)
                        .bind(pattern.clone())
                        .bind(pattern)
                        .bind(SEARCH_LIMIT)
                        .fetch_all(&pool)
                        .await
                }
            })
            .await?;

        rows.iter().map(map_entity_row).collect()
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM foundational_knowledge";
        let row = self
            .store
            .run(sql, move |pool| async move {
                sqlx::query(sql).fetch_one(&pool).await
            })
            .await?;

        Ok(row.try_get("count")?)
    }

    async fn statistics(&self) -> Result<KnowledgeStats> {
        let totals_sql = "SELECT COUNT(*) AS total,
                SUM(CASE WHEN is_foundational THEN 1 ELSE 0 END) AS foundational
             FROM foundational_knowledge";
        let totals = self
            .store
            .run(totals_sql, move |pool| async move {
                sqlx::query(totals_sql).fetch_one(&pool).await
            })
            .await?;

        let total_entries: i64 = totals.try_get("total")?;
        let foundational_count: i64 = totals.try_get::<Option<i64>, _>("foundational")?.unwrap_or(0);

        let mut stats = KnowledgeStats {
            total_entries,
            foundational_count,
            operational_count: total_entries - foundational_count,
            by_classification: BTreeMap::new(),
            by_priority: BTreeMap::new(),
            by_category: BTreeMap::new(),
        };

        let classification_sql = "SELECT classification AS k, COUNT(*) AS c
             FROM foundational_knowledge GROUP BY classification";
        for row in self
            .store
            .run(classification_sql, move |pool| async move {
                sqlx::query(classification_sql).fetch_all(&pool).await
            })
            .await?
        {
            stats
                .by_classification
                .insert(row.try_get("k")?, row.try_get("c")?);
        }

        let priority_sql = "SELECT priority AS k, COUNT(*) AS c
             FROM foundational_knowledge GROUP BY priority";
        for row in self
            .store
            .run(priority_sql, move |pool| async move {
                sqlx::query(priority_sql).fetch_all(&pool).await
            })
            .await?
        {
            let priority: i64 = row.try_get("k")?;
            stats
                .by_priority
                .insert(priority.to_string(), row.try_get("c")?);
        }

        let category_sql = "SELECT category AS k, COUNT(*) AS c
             FROM foundational_knowledge GROUP BY category";
        for row in self
            .store
            .run(category_sql, move |pool| async move {
                sqlx::query(category_sql).fetch_all(&pool).await
            })
            .await?
        {
            stats
                .by_category
                .insert(row.try_get("k")?, row.try_get("c")?);
        }

        Ok(stats)
    }
}
