#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use validator::Validate;

use knowledge_core_core::error::{Error, Result};
use knowledge_core_core::knowledge::{KnowledgeEntity, KnowledgePriority};

/// Maximum batch sizes per the batch endpoints' contract
pub const MAX_BATCH_CREATE: usize = 100;
pub const MAX_BATCH_UPDATE: usize = 100;
pub const MAX_BATCH_DELETE: usize = 50;

/// Create payload
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct KnowledgeCreateRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    /// Classification tier; classified automatically when omitted
    pub classification: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub priority: Option<i64>,
    #[schema(value_type = Object)]
    pub content: JsonValue,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonValue>,
}

impl KnowledgeCreateRequest {
    /// Build a fresh entity from the payload.
    ///
    /// # Errors
    /// Returns a validation error for an unknown classification value
    pub fn into_entity(self) -> Result<KnowledgeEntity> {
        let mut entity = KnowledgeEntity::new(&self.name, &self.category, self.content);
        if let Some(classification) = &self.classification {
            entity.classification = classification.parse()?;
        }
        if let Some(priority) = self.priority {
            entity.priority = KnowledgePriority::from_ordinal(priority);
        }
        if let Some(metadata) = self.metadata {
            entity.metadata = metadata;
        }
        entity.normalize();
        Ok(entity)
    }
}

/// Patch payload; absent fields are left untouched
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct KnowledgeUpdateRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub classification: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub priority: Option<i64>,
    #[schema(value_type = Option<Object>)]
    pub content: Option<JsonValue>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonValue>,
    pub is_active: Option<bool>,
}

impl KnowledgeUpdateRequest {
    /// Apply the patch onto an entity loaded from the store.
    ///
    /// # Errors
    /// Returns a validation error for an unknown classification value
    pub fn apply_to(&self, entity: &mut KnowledgeEntity) -> Result<()> {
        if let Some(name) = &self.name {
            entity.name = name.clone();
        }
        if let Some(category) = &self.category {
            entity.category = category.clone();
        }
        if let Some(classification) = &self.classification {
            entity.classification = classification.parse()?;
        }
        if let Some(priority) = self.priority {
            entity.priority = KnowledgePriority::from_ordinal(priority);
        }
        if let Some(content) = &self.content {
            entity.content = content.clone();
        }
        if let Some(metadata) = &self.metadata {
            entity.metadata = metadata.clone();
        }
        if let Some(is_active) = self.is_active {
            entity.is_active = is_active;
        }
        entity.normalize();
        Ok(())
    }
}

/// List filters
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    pub classification: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    /// Clamp paging to contract bounds: limit 1..=1000, offset >= 0.
    #[must_use]
    pub fn paging(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(100).clamp(1, 1000);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Search query
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SearchQuery {
    #[validate(length(min = 1))]
    pub query: String,
    #[serde(default)]
    pub include_operational: bool,
}

/// Restore payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct RestoreRequest {
    pub version_number: i64,
}

/// Version comparison query
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompareQuery {
    pub v1: i64,
    pub v2: i64,
}

/// Manual sync trigger payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncTriggerRequest {
    /// `full` or `incremental`
    pub sync_type: String,
}

/// Sync history query
#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncHistoryQuery {
    pub limit: Option<usize>,
}

/// Batch delete payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchDeleteRequest {
    pub ids: Vec<String>,
}

/// Per-item outcome of a batch operation
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchResult {
    pub index: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResult {
    #[must_use]
    pub const fn ok(index: usize, id: String) -> Self {
        Self {
            index,
            success: true,
            id: Some(id),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(index: usize, id: Option<String>, error: &Error) -> Self {
        Self {
            index,
            success: false,
            id,
            error: Some(error.to_string()),
        }
    }
}

/// One batch update item: an id plus the patch fields
#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchUpdateItem {
    pub id: String,
    #[serde(flatten)]
    pub patch: KnowledgeUpdateRequest,
}

/// Entity payload returned by the API; identical to the storage shape
#[derive(Debug, Serialize, ToSchema)]
pub struct StatisticsResponse {
    #[schema(value_type = Object)]
    pub knowledge: JsonValue,
    #[schema(value_type = Object)]
    pub queries: JsonValue,
}

impl StatisticsResponse {
    /// Bundle knowledge-base aggregates with store query statistics.
    ///
    /// # Errors
    /// Returns a serialization error if either payload fails to render
    pub fn build<K: Serialize, Q: Serialize>(knowledge: &K, queries: &Q) -> Result<Self> {
        Ok(Self {
            knowledge: serde_json::to_value(knowledge)?,
            queries: serde_json::to_value(queries)?,
        })
    }
}

/// Validation errors rendered as a 400 detail string.
#[must_use]
pub fn validation_detail(errors: &validator::ValidationErrors) -> String {
    errors.to_string().replace('\n', "; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_core_core::knowledge::KnowledgeClassification;
    use serde_json::json;

    #[test]
    fn test_create_request_into_entity() {
        let request = KnowledgeCreateRequest {
            name: "Pay Ready Mission".to_string(),
            category: "company_overview".to_string(),
            classification: Some("foundational".to_string()),
            priority: Some(5),
            content: json!({"mission": "resident engagement"}),
            metadata: None,
        };

        let entity = request.into_entity().unwrap();
        assert_eq!(entity.classification, KnowledgeClassification::Foundational);
        assert_eq!(entity.priority, KnowledgePriority::Critical);
        assert!(entity.is_foundational);
    }

    #[test]
    fn test_create_request_rejects_unknown_tier() {
        let request = KnowledgeCreateRequest {
            name: "X".to_string(),
            category: "general".to_string(),
            classification: Some("ultrasecret".to_string()),
            priority: None,
            content: json!({}),
            metadata: None,
        };
        assert!(request.into_entity().is_err());
    }

    #[test]
    fn test_update_request_patch_semantics() {
        let mut entity =
            KnowledgeEntity::new("Old name", "general", json!({"a": 1}));
        let patch = KnowledgeUpdateRequest {
            name: Some("New name".to_string()),
            category: None,
            classification: Some("strategic".to_string()),
            priority: None,
            content: None,
            metadata: None,
            is_active: None,
        };

        patch.apply_to(&mut entity).unwrap();
        assert_eq!(entity.name, "New name");
        assert_eq!(entity.category, "general");
        assert_eq!(entity.classification, KnowledgeClassification::Strategic);
        // Foundational floor applies after the patch
        assert!(entity.is_foundational);
        assert!(entity.priority >= KnowledgePriority::High);
        assert_eq!(entity.content, json!({"a": 1}));
    }

    #[test]
    fn test_list_query_clamps_paging() {
        let query = ListQuery {
            classification: None,
            category: None,
            is_active: None,
            limit: Some(5000),
            offset: Some(-3),
        };
        assert_eq!(query.paging(), (1000, 0));

        let default = ListQuery {
            classification: None,
            category: None,
            is_active: None,
            limit: None,
            offset: None,
        };
        assert_eq!(default.paging(), (100, 0));
    }

    #[test]
    fn test_create_request_validation_bounds() {
        let request = KnowledgeCreateRequest {
            name: String::new(),
            category: "x".repeat(200),
            classification: None,
            priority: Some(9),
            content: json!({}),
            metadata: None,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("category"));
        assert!(errors.field_errors().contains_key("priority"));
    }
}
