#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use async_trait::async_trait;
use time::OffsetDateTime;

use knowledge_core_core::error::Result;
use knowledge_core_core::knowledge::{SyncConflict, SyncOperation};

/// Storage contract for sync run records and conflict records
#[async_trait]
pub trait SyncRepositoryTrait: Send + Sync {
    /// Record a new sync run
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn create_operation(&self, operation: &SyncOperation) -> Result<()>;

    /// Update a sync run (status, counts, completion)
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn update_operation(&self, operation: &SyncOperation) -> Result<()>;

    /// Most recent sync runs, newest first
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn list_operations(&self, limit: i64) -> Result<Vec<SyncOperation>>;

    /// Completion time of the most recent successfully completed sync
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn last_successful_sync(&self) -> Result<Option<OffsetDateTime>>;

    /// Drop sync runs that started before the cutoff; returns rows removed
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn delete_operations_before(&self, cutoff: OffsetDateTime) -> Result<u64>;

    /// Persist a new conflict record
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn create_conflict(&self, conflict: &SyncConflict) -> Result<()>;

    /// Update a conflict record after resolution
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn update_conflict(&self, conflict: &SyncConflict) -> Result<()>;

    /// Conflicts still pending resolution, oldest first
    ///
    /// # Errors
    /// Returns an error if the query fails
    async fn list_pending_conflicts(&self, limit: i64) -> Result<Vec<SyncConflict>>;
}
