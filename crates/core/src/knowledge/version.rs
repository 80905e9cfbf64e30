#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::knowledge::content::{diff_top_level, ContentChanges};

/// Append-only version snapshot of a knowledge entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KnowledgeVersion {
    pub version_id: String,
    pub knowledge_id: String,
    pub version_number: i64,
    #[schema(value_type = Object)]
    pub content: JsonValue,
    /// Snapshot of name, category, classification, priority and the
    /// foundational flag at the time of the version
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonValue>,
    pub change_summary: Option<String>,
    pub changed_by: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

impl KnowledgeVersion {
    #[must_use]
    pub fn new(knowledge_id: &str, version_number: i64, content: JsonValue) -> Self {
        Self {
            version_id: Uuid::new_v4().to_string(),
            knowledge_id: knowledge_id.to_string(),
            version_number,
            content,
            metadata: None,
            change_summary: None,
            changed_by: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Generate a diff of this version against an older one.
    #[must_use]
    pub fn diff_against(&self, previous: &Self) -> VersionDiff {
        VersionDiff {
            version_from: previous.version_number,
            version_to: self.version_number,
            content: diff_top_level(&previous.content, &self.content),
        }
    }
}

/// Content difference between two versions
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VersionDiff {
    pub version_from: i64,
    pub version_to: i64,
    #[schema(value_type = Object)]
    pub content: ContentChanges,
}
