#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use log::{info, warn};
use serde_json::json;

use super::KnowledgeService;
use knowledge_core_core::cache::entity_cache_key;
use knowledge_core_core::error::{Error, Result};
use knowledge_core_core::knowledge::{
    KnowledgeClassification, KnowledgeEntity, KnowledgePriority,
};

impl KnowledgeService {
    /// Create a new knowledge entry with automatic classification.
    ///
    /// Entries arriving with the default (operational) tier are classified
    /// from their content; the priority is derived the same way when the
    /// caller left it at the default. Foundational entries get the Pay-Ready
    /// context attached and are cached.
    ///
    /// # Errors
    /// Returns `Conflict` if the id already exists, or any store error
    pub async fn create(
        &self,
        mut entity: KnowledgeEntity,
        changed_by: &str,
    ) -> Result<KnowledgeEntity> {
        if entity.classification == KnowledgeClassification::Operational {
            entity.classification = self.classifier.classify(&entity);
        }
        if entity.priority == KnowledgePriority::Medium {
            entity.priority = self.classifier.determine_priority(&entity);
        }
        entity.normalize();

        // Auto-tagging and the sensitivity assessment ride along in metadata
        entity.set_metadata("auto_tags", json!(self.classifier.suggest_tags(&entity)));
        entity.set_metadata(
            "sensitivity",
            serde_json::to_value(self.classifier.detect_sensitivity(&entity))?,
        );

        if entity.is_foundational && entity.pay_ready_context.is_none() {
            entity.pay_ready_context = Some(self.pay_ready_context.clone());
        }

        let created = self.repository.create(&entity).await?;

        self.versioning
            .create_version(&created, changed_by, Some("Initial version"))
            .await?;

        if created.is_foundational {
            self.cache_entity(&created).await;
        }

        info!(
            "Created foundational knowledge: {} ({})",
            created.id, created.classification
        );
        Ok(created)
    }

    /// Get an entity by id, consulting the cache first.
    ///
    /// # Errors
    /// Returns any store error; cache failures are swallowed
    pub async fn get(&self, knowledge_id: &str) -> Result<Option<KnowledgeEntity>> {
        if let Some(cached) = self.get_cached(knowledge_id).await {
            return Ok(Some(cached));
        }

        let entity = self.repository.get(knowledge_id).await?;

        if let Some(entity) = &entity {
            if entity.is_foundational {
                self.cache_entity(entity).await;
            }
        }

        Ok(entity)
    }

    /// Update an entity, appending a version when the content changed.
    ///
    /// # Errors
    /// Returns `NotFound` if the entity does not exist, or any store error
    pub async fn update(
        &self,
        mut entity: KnowledgeEntity,
        changed_by: &str,
    ) -> Result<KnowledgeEntity> {
        let current = self
            .repository
            .get(&entity.id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Knowledge entity {} not found", entity.id)))?;

        entity.normalize();

        let content_changed = current.content != entity.content;
        if content_changed {
            entity.version = current.version + 1;
            self.versioning
                .create_version(&entity, changed_by, None)
                .await?;
        } else {
            entity.version = current.version;
        }

        let updated = self.repository.update(&entity).await?;

        if updated.is_foundational {
            self.cache_entity(&updated).await;
        } else {
            self.invalidate_cache(&updated.id).await;
        }

        info!("Updated knowledge: {} (version {})", updated.id, updated.version);
        Ok(updated)
    }

    /// Hard-delete an entity and its version history.
    ///
    /// # Errors
    /// Returns any store error
    pub async fn delete(&self, knowledge_id: &str) -> Result<bool> {
        self.invalidate_cache(knowledge_id).await;
        let deleted = self.repository.delete(knowledge_id).await?;
        if deleted {
            info!("Deleted knowledge: {knowledge_id}");
        }
        Ok(deleted)
    }

    /// Soft-delete: clear the active flag, keeping history intact.
    ///
    /// # Errors
    /// Returns `NotFound` if the entity does not exist, or any store error
    pub async fn deactivate(&self, knowledge_id: &str, changed_by: &str) -> Result<KnowledgeEntity> {
        let mut entity = self
            .repository
            .get(knowledge_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Knowledge entity {knowledge_id} not found")))?;
        entity.is_active = false;
        self.update(entity, changed_by).await
    }

    /// Restore an entity to a previous version; the rollback appends a new
    /// version and the cache follows the restored state.
    ///
    /// # Errors
    /// Returns `NotFound` if the entity or the target version is missing
    pub async fn rollback(
        &self,
        knowledge_id: &str,
        version_number: i64,
    ) -> Result<KnowledgeEntity> {
        let entity = self.versioning.rollback(knowledge_id, version_number).await?;
        if entity.is_foundational {
            self.cache_entity(&entity).await;
        }
        Ok(entity)
    }

    /// Total entity rows; used by the scheduler's initial-sync decision.
    ///
    /// # Errors
    /// Returns any store error
    pub async fn count(&self) -> Result<i64> {
        self.repository.count().await
    }

    // ---- cache policy -----------------------------------------------------
    // The cache is a strict optimization: every failure is logged and
    // ignored, never surfaced to callers.

    pub(super) async fn cache_entity(&self, entity: &KnowledgeEntity) {
        let key = entity_cache_key(&entity.id);
        if let Err(e) = self.cache.set(&key, entity, None).await {
            warn!("Failed to cache {key}: {e}");
        }
    }

    pub(super) async fn get_cached(&self, knowledge_id: &str) -> Option<KnowledgeEntity> {
        let key = entity_cache_key(knowledge_id);
        match self.cache.get::<KnowledgeEntity>(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache read failed for {key}: {e}");
                None
            }
        }
    }

    pub(super) async fn invalidate_cache(&self, knowledge_id: &str) {
        let key = entity_cache_key(knowledge_id);
        if let Err(e) = self.cache.delete(&key).await {
            warn!("Failed to invalidate {key}: {e}");
        }
    }
}
