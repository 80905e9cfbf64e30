#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

use knowledge_core_core::error::Result;
use knowledge_core_core::knowledge::{KnowledgeClassification, KnowledgeEntity};

/// Filter for listing knowledge entities
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    pub classification: Option<KnowledgeClassification>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// Aggregate counts over the knowledge base
#[derive(Debug, Clone, Default, Serialize)]
pub struct KnowledgeStats {
    pub total_entries: i64,
    pub foundational_count: i64,
    pub operational_count: i64,
    pub by_classification: BTreeMap<String, i64>,
    pub by_priority: BTreeMap<String, i64>,
    pub by_category: BTreeMap<String, i64>,
}

/// Storage contract for knowledge entities
#[async_trait]
pub trait KnowledgeRepositoryTrait: Send + Sync {
    /// Insert a new entity row
    ///
    /// # Errors
    /// Returns `Conflict` when the id already exists
    async fn create(&self, entity: &KnowledgeEntity) -> Result<KnowledgeEntity>;

    /// Fetch an entity by id
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn get(&self, id: &str) -> Result<Option<KnowledgeEntity>>;

    /// Full-row update keyed by id; `updated_at` is set by the store
    ///
    /// # Errors
    /// Returns `NotFound` when no row matches
    async fn update(&self, entity: &KnowledgeEntity) -> Result<KnowledgeEntity>;

    /// Remove an entity row and its version rows
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn delete(&self, id: &str) -> Result<bool>;

    /// List entities ordered by priority then recency
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn list(
        &self,
        filter: &EntityFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KnowledgeEntity>>;

    /// Case-insensitive substring search over name and content of active rows
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn search(&self, query: &str) -> Result<Vec<KnowledgeEntity>>;

    /// Total number of entity rows, active or not
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn count(&self) -> Result<i64>;

    /// Aggregate statistics for the statistics endpoint
    ///
    /// # Errors
    /// Returns an error if a query fails
    async fn statistics(&self) -> Result<KnowledgeStats>;
}
