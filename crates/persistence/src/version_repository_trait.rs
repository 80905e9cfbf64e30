#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use async_trait::async_trait;

use knowledge_core_core::error::Result;
use knowledge_core_core::knowledge::KnowledgeVersion;

/// Storage contract for the append-only version log
#[async_trait]
pub trait VersionRepositoryTrait: Send + Sync {
    /// Append a version row
    ///
    /// # Errors
    /// Returns `Conflict` when `(knowledge_id, version_number)` already exists
    async fn append(&self, version: &KnowledgeVersion) -> Result<()>;

    /// All versions of an entity, newest first
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn list(&self, knowledge_id: &str) -> Result<Vec<KnowledgeVersion>>;

    /// One specific version
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn get(&self, knowledge_id: &str, version_number: i64)
        -> Result<Option<KnowledgeVersion>>;

    /// Number of versions recorded for an entity
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn count(&self, knowledge_id: &str) -> Result<i64>;
}
