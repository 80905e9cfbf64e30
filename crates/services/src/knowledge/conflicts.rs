#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use log::info;

use super::KnowledgeService;
use knowledge_core_core::error::Result;
use knowledge_core_core::knowledge::{KnowledgeEntity, ResolutionStrategy, SyncConflict};

impl KnowledgeService {
    /// Resolve a sync conflict with the given strategy and persist the
    /// winning snapshot.
    ///
    /// `Auto` is reduced from the foundational flags of both sides: a
    /// foundational local entry is protected from a non-foundational remote
    /// one, and vice versa; equals are merged. A `local_wins` outcome writes
    /// the unchanged local content back, so no version row is appended.
    ///
    /// # Errors
    /// Returns an error if a snapshot fails to deserialize or the write fails
    pub async fn handle_sync_conflict(
        &self,
        conflict: &mut SyncConflict,
        strategy: ResolutionStrategy,
    ) -> Result<KnowledgeEntity> {
        let effective = conflict.effective_strategy(strategy)?;
        let resolved = conflict.resolve(effective)?;

        let updated = self.update(resolved, "sync").await?;

        info!(
            "Resolved conflict for {} using {effective:?}",
            conflict.knowledge_id
        );
        Ok(updated)
    }
}
