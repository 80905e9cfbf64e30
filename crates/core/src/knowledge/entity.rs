#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Classification tiers for knowledge entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeClassification {
    /// Core business truths
    Foundational,
    /// Strategic decisions and plans
    Strategic,
    /// Day-to-day operational data
    Operational,
    /// Reference materials
    Reference,
}

impl KnowledgeClassification {
    /// Whether entities at this tier are treated as foundational knowledge.
    #[must_use]
    pub const fn is_foundational_tier(self) -> bool {
        matches!(self, Self::Foundational | Self::Strategic)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Foundational => "foundational",
            Self::Strategic => "strategic",
            Self::Operational => "operational",
            Self::Reference => "reference",
        }
    }
}

impl fmt::Display for KnowledgeClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnowledgeClassification {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "foundational" => Ok(Self::Foundational),
            "strategic" => Ok(Self::Strategic),
            "operational" => Ok(Self::Operational),
            "reference" => Ok(Self::Reference),
            other => Err(crate::error::Error::Validation(format!(
                "Unknown classification: {other}"
            ))),
        }
    }
}

/// Priority levels for knowledge entries, ordered ascending so that
/// `Critical > High > Medium > Low > Archive` compares naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KnowledgePriority {
    /// Archived/historical
    Archive,
    /// Low importance
    Low,
    /// Standard importance
    Medium,
    /// High importance
    High,
    /// Mission-critical information
    Critical,
}

impl KnowledgePriority {
    /// Ordinal value used on the wire and in storage (1..=5).
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Archive => 1,
            Self::Low => 2,
            Self::Medium => 3,
            Self::High => 4,
            Self::Critical => 5,
        }
    }

    /// Build from an ordinal, clamping out-of-range values to the edges.
    #[must_use]
    pub const fn from_ordinal(value: i64) -> Self {
        match value {
            i64::MIN..=1 => Self::Archive,
            2 => Self::Low,
            3 => Self::Medium,
            4 => Self::High,
            _ => Self::Critical,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl Serialize for KnowledgePriority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_i64())
    }
}

impl<'de> Deserialize<'de> for KnowledgePriority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        if !(1..=5).contains(&value) {
            return Err(serde::de::Error::custom(format!(
                "priority out of range: {value}"
            )));
        }
        Ok(Self::from_ordinal(value))
    }
}

/// Pay-Ready specific business context attached to foundational entities
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayReadyContext {
    pub company: String,
    pub mission: String,
    pub industry: String,
    pub stage: String,
    #[schema(value_type = Object)]
    pub metrics: JsonValue,
    pub key_differentiators: Vec<String>,
    pub foundational_categories: Vec<String>,
}

impl Default for PayReadyContext {
    fn default() -> Self {
        Self {
            company: "Pay Ready".to_string(),
            mission: "AI-first resident engagement, payments, and recovery platform for U.S. multifamily housing".to_string(),
            industry: "PropTech / Real Estate Technology".to_string(),
            stage: "High-growth, bootstrapped and profitable".to_string(),
            metrics: json!({
                "annual_rent_processed": "$20B+",
                "employee_count": 100,
                "customer_type": "Property Management Companies",
                "market": "U.S. Multifamily Housing",
            }),
            key_differentiators: vec![
                "AI-first approach to resident engagement".to_string(),
                "Comprehensive financial operating system".to_string(),
                "Evolution from collections to full-service platform".to_string(),
                "Bootstrapped and profitable growth model".to_string(),
            ],
            foundational_categories: vec![
                "company_overview".to_string(),
                "strategic_initiatives".to_string(),
                "executive_decisions".to_string(),
                "market_intelligence".to_string(),
                "product_roadmap".to_string(),
            ],
        }
    }
}

/// Core knowledge entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KnowledgeEntity {
    pub id: String,
    pub name: String,
    pub category: String,
    pub classification: KnowledgeClassification,
    #[schema(value_type = u8, minimum = 1, maximum = 5)]
    pub priority: KnowledgePriority,
    #[schema(value_type = Object)]
    pub content: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_ready_context: Option<PayReadyContext>,
    #[schema(value_type = Object)]
    pub metadata: JsonValue,
    pub source: String,
    pub source_id: Option<String>,
    pub is_active: bool,
    pub is_foundational: bool,
    pub version: i64,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub synced_at: Option<OffsetDateTime>,
}

impl KnowledgeEntity {
    /// Create a new entity with a generated id and default flags. Invariants
    /// are applied by `normalize`, which this calls.
    #[must_use]
    pub fn new(name: &str, category: &str, content: JsonValue) -> Self {
        let now = OffsetDateTime::now_utc();
        let mut entity = Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category: category.to_string(),
            classification: KnowledgeClassification::Operational,
            priority: KnowledgePriority::Medium,
            content,
            pay_ready_context: None,
            metadata: json!({}),
            source: "manual".to_string(),
            source_id: None,
            is_active: true,
            is_foundational: false,
            version: 1,
            created_at: now,
            updated_at: now,
            synced_at: None,
        };
        entity.normalize();
        entity
    }

    /// Enforce the write-time invariants: the foundational flag follows the
    /// classification, and foundational entities carry at least High priority.
    pub fn normalize(&mut self) {
        self.is_foundational = self.classification.is_foundational_tier();
        if self.is_foundational && self.priority < KnowledgePriority::High {
            self.priority = KnowledgePriority::High;
        }
    }

    /// Insert a key into the entity metadata, promoting non-object metadata
    /// to an object first.
    pub fn set_metadata(&mut self, key: &str, value: JsonValue) {
        if !self.metadata.is_object() {
            self.metadata = json!({});
        }
        if let Some(map) = self.metadata.as_object_mut() {
            map.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering_and_ordinals() {
        assert!(KnowledgePriority::Critical > KnowledgePriority::High);
        assert!(KnowledgePriority::High > KnowledgePriority::Medium);
        assert!(KnowledgePriority::Low > KnowledgePriority::Archive);
        assert_eq!(KnowledgePriority::Critical.as_i64(), 5);
        assert_eq!(KnowledgePriority::Archive.as_i64(), 1);
        assert_eq!(
            KnowledgePriority::from_ordinal(4),
            KnowledgePriority::High
        );
    }

    #[test]
    fn test_priority_serde_roundtrip() {
        let serialized = serde_json::to_string(&KnowledgePriority::High).unwrap();
        assert_eq!(serialized, "4");
        let parsed: KnowledgePriority = serde_json::from_str("5").unwrap();
        assert_eq!(parsed, KnowledgePriority::Critical);
        assert!(serde_json::from_str::<KnowledgePriority>("9").is_err());
    }

    #[test]
    fn test_classification_serde() {
        let serialized = serde_json::to_string(&KnowledgeClassification::Foundational).unwrap();
        assert_eq!(serialized, "\"foundational\"");
        assert_eq!(
            "strategic".parse::<KnowledgeClassification>().unwrap(),
            KnowledgeClassification::Strategic
        );
        assert!("fundamental".parse::<KnowledgeClassification>().is_err());
    }

    #[test]
    fn test_normalize_sets_foundational_flag() {
        let mut entity = KnowledgeEntity::new("Mission", "company_overview", json!({}));
        entity.classification = KnowledgeClassification::Strategic;
        entity.priority = KnowledgePriority::Low;
        entity.normalize();
        assert!(entity.is_foundational);
        // Priority floor for foundational entities
        assert_eq!(entity.priority, KnowledgePriority::High);

        entity.classification = KnowledgeClassification::Reference;
        entity.normalize();
        assert!(!entity.is_foundational);
        // Downgrading the tier does not touch the priority
        assert_eq!(entity.priority, KnowledgePriority::High);
    }

    #[test]
    fn test_new_entity_defaults() {
        let entity = KnowledgeEntity::new("Weekly report", "reports", json!({"week": 31}));
        assert_eq!(entity.version, 1);
        assert!(entity.is_active);
        assert!(!entity.is_foundational);
        assert_eq!(entity.source, "manual");
        assert_eq!(entity.classification, KnowledgeClassification::Operational);
        assert!(entity.updated_at >= entity.created_at);
    }

    #[test]
    fn test_set_metadata_promotes_object() {
        let mut entity = KnowledgeEntity::new("X", "general", json!({}));
        entity.metadata = JsonValue::Null;
        entity.set_metadata("conflict_merged", json!(true));
        assert_eq!(entity.metadata["conflict_merged"], json!(true));
    }
}
