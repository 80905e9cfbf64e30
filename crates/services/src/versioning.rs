#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use log::info;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use knowledge_core_core::error::{Error, Result};
use knowledge_core_core::knowledge::{
    diff_top_level, ContentChanges, KnowledgeEntity, KnowledgeVersion, VersionDiff,
};
use knowledge_core_persistence::{KnowledgeRepositoryTrait, VersionRepositoryTrait};

/// Comparison of two versions of one entity
#[derive(Debug, Clone, Serialize)]
pub struct VersionComparison {
    pub knowledge_id: String,
    pub version_1: i64,
    pub version_2: i64,
    pub timestamp_1: String,
    pub timestamp_2: String,
    pub diff: VersionDiff,
    pub metadata_changes: ContentChanges,
}

/// One entry of the recent-changes view
#[derive(Debug, Clone, Serialize)]
pub struct VersionChange {
    pub version: i64,
    pub timestamp: String,
    pub changed_by: Option<String>,
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<VersionDiff>,
}

/// History and rollback over the append-only version log
pub struct VersioningService {
    versions: Arc<dyn VersionRepositoryTrait>,
    knowledge: Arc<dyn KnowledgeRepositoryTrait>,
}

impl VersioningService {
    #[must_use]
    pub fn new(
        versions: Arc<dyn VersionRepositoryTrait>,
        knowledge: Arc<dyn KnowledgeRepositoryTrait>,
    ) -> Self {
        Self {
            versions,
            knowledge,
        }
    }

    /// Append a version snapshot of the entity's current state.
    ///
    /// The version number is the count of existing versions plus one; when no
    /// summary is given one is generated by comparing against the most recent
    /// version.
    ///
    /// # Errors
    /// Returns an error if the version log cannot be read or written
    pub async fn create_version(
        &self,
        entity: &KnowledgeEntity,
        changed_by: &str,
        change_summary: Option<&str>,
    ) -> Result<KnowledgeVersion> {
        let existing = self.versions.list(&entity.id).await?;
        let version_number = i64::try_from(existing.len()).unwrap_or(i64::MAX - 1) + 1;

        let summary = change_summary.map_or_else(
            || {
                existing.first().map_or_else(
                    || "Initial version".to_string(),
                    |last| Self::generate_change_summary(last, entity),
                )
            },
            ToString::to_string,
        );

        let version = KnowledgeVersion {
            version_id: Uuid::new_v4().to_string(),
            knowledge_id: entity.id.clone(),
            version_number,
            content: entity.content.clone(),
            metadata: Some(json!({
                "name": entity.name,
                "category": entity.category,
                "classification": entity.classification.as_str(),
                "priority": entity.priority.as_i64(),
                "is_foundational": entity.is_foundational,
            })),
            change_summary: Some(summary),
            changed_by: Some(changed_by.to_string()),
            created_at: OffsetDateTime::now_utc(),
        };

        self.versions.append(&version).await?;
        info!(
            "Created version {version_number} for knowledge {}",
            entity.id
        );

        Ok(version)
    }

    /// Complete version history of an entity, newest first.
    ///
    /// # Errors
    /// Returns an error if the version log cannot be read
    pub async fn history(&self, knowledge_id: &str) -> Result<Vec<KnowledgeVersion>> {
        self.versions.list(knowledge_id).await
    }

    /// One specific version.
    ///
    /// # Errors
    /// Returns an error if the version log cannot be read
    pub async fn get_version(
        &self,
        knowledge_id: &str,
        version_number: i64,
    ) -> Result<Option<KnowledgeVersion>> {
        self.versions.get(knowledge_id, version_number).await
    }

    /// Roll an entity back to a previous version. The rollback itself becomes
    /// a new version, so history keeps moving forward.
    ///
    /// # Errors
    /// Returns `NotFound` if the entity or the target version is missing
    pub async fn rollback(
        &self,
        knowledge_id: &str,
        version_number: i64,
    ) -> Result<KnowledgeEntity> {
        let target = self
            .versions
            .get(knowledge_id, version_number)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "Version {version_number} not found for knowledge {knowledge_id}"
                ))
            })?;

        let current = self.knowledge.get(knowledge_id).await?.ok_or_else(|| {
            Error::NotFound(format!("Knowledge entity {knowledge_id} not found"))
        })?;

        let snapshot = target.metadata.clone().unwrap_or_else(|| json!({}));

        let mut rolled_back = current.clone();
        rolled_back.name = snapshot
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or(&current.name)
            .to_string();
        rolled_back.category = snapshot
            .get("category")
            .and_then(|v| v.as_str())
            .unwrap_or(&current.category)
            .to_string();
        rolled_back.classification = snapshot
            .get("classification")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or(current.classification);
        rolled_back.priority = snapshot
            .get("priority")
            .and_then(serde_json::Value::as_i64)
            .map_or(current.priority, |p| {
                knowledge_core_core::knowledge::KnowledgePriority::from_ordinal(p)
            });
        rolled_back.content = target.content.clone();
        rolled_back.set_metadata("rolled_back_from", json!(current.version));
        rolled_back.set_metadata("rolled_back_to", json!(version_number));
        rolled_back.set_metadata(
            "rollback_timestamp",
            json!(OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default()),
        );
        rolled_back.version = current.version + 1;
        rolled_back.normalize();

        let updated = self.knowledge.update(&rolled_back).await?;

        self.create_version(
            &updated,
            "system",
            Some(&format!(
                "Rolled back from version {} to version {version_number}",
                current.version
            )),
        )
        .await?;

        info!("Rolled back knowledge {knowledge_id} to version {version_number}");
        Ok(updated)
    }

    /// Compare two versions of an entity.
    ///
    /// # Errors
    /// Returns `NotFound` if either version is missing
    pub async fn compare(
        &self,
        knowledge_id: &str,
        v1: i64,
        v2: i64,
    ) -> Result<VersionComparison> {
        let version1 = self
            .versions
            .get(knowledge_id, v1)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Version {v1} not found")))?;
        let version2 = self
            .versions
            .get(knowledge_id, v2)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Version {v2} not found")))?;

        Ok(VersionComparison {
            knowledge_id: knowledge_id.to_string(),
            version_1: v1,
            version_2: v2,
            timestamp_1: version1.created_at.format(&Rfc3339).unwrap_or_default(),
            timestamp_2: version2.created_at.format(&Rfc3339).unwrap_or_default(),
            diff: version2.diff_against(&version1),
            metadata_changes: diff_top_level(
                version1.metadata.as_ref().unwrap_or(&json!({})),
                version2.metadata.as_ref().unwrap_or(&json!({})),
            ),
        })
    }

    /// Most recent changes of an entity, each with its diff against the
    /// preceding version.
    ///
    /// # Errors
    /// Returns an error if the version log cannot be read
    pub async fn latest_changes(
        &self,
        knowledge_id: &str,
        limit: usize,
    ) -> Result<Vec<VersionChange>> {
        let versions = self.history(knowledge_id).await?;
        let mut changes = Vec::new();

        for (index, current) in versions.iter().take(limit).enumerate() {
            let previous = versions.get(index + 1);
            changes.push(VersionChange {
                version: current.version_number,
                timestamp: current.created_at.format(&Rfc3339).unwrap_or_default(),
                changed_by: current.changed_by.clone(),
                summary: current.change_summary.clone(),
                diff: previous.map(|p| current.diff_against(p)),
            });
        }

        Ok(changes)
    }

    /// Build a short human summary of what changed since the last version.
    fn generate_change_summary(
        old_version: &KnowledgeVersion,
        new_entity: &KnowledgeEntity,
    ) -> String {
        let mut parts = Vec::new();

        let diff = diff_top_level(&old_version.content, &new_entity.content);
        let added = diff.added_count();
        let removed = diff.removed_count();
        let modified = diff.modified_count();

        if added > 0 {
            parts.push(format!("Added {added} field(s)"));
        }
        if removed > 0 {
            parts.push(format!("Removed {removed} field(s)"));
        }
        if modified > 0 {
            parts.push(format!("Modified {modified} field(s)"));
        }

        if let Some(snapshot) = &old_version.metadata {
            if let Some(old_class) = snapshot.get("classification").and_then(|v| v.as_str()) {
                let new_class = new_entity.classification.as_str();
                if old_class != new_class {
                    parts.push(format!("Classification: {old_class} → {new_class}"));
                }
            }
            if let Some(old_priority) = snapshot.get("priority").and_then(serde_json::Value::as_i64)
            {
                let new_priority = new_entity.priority.as_i64();
                if old_priority != new_priority {
                    parts.push(format!("Priority: {old_priority} → {new_priority}"));
                }
            }
        }

        if parts.is_empty() {
            "Content updated".to_string()
        } else {
            parts.join("; ")
        }
    }
}
