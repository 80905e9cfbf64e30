#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

//! Translation between the remote record shape and the internal entity shape.

use serde_json::{json, Value as JsonValue};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::sync::client::AirtableRecord;
use knowledge_core_core::knowledge::{
    KnowledgeClassification, KnowledgeEntity, KnowledgePriority,
};

/// The remote system name recorded as the entity source
pub const REMOTE_SOURCE: &str = "airtable";

fn field_str<'a>(fields: &'a JsonValue, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

/// The remote modification timestamp of a record, used for incremental
/// filtering: "Last Modified" with "Last Reviewed" as fallback.
#[must_use]
pub fn remote_modified(record: &AirtableRecord) -> Option<OffsetDateTime> {
    field_str(&record.fields, "Last Modified")
        .or_else(|| field_str(&record.fields, "Last Reviewed"))
        .and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
}

/// Map the remote 1-5 priority rating onto the priority enum.
#[must_use]
pub fn map_priority(raw: Option<&JsonValue>) -> KnowledgePriority {
    raw.and_then(JsonValue::as_f64).map_or(
        KnowledgePriority::Medium,
        |rating| {
            if rating >= 5.0 {
                KnowledgePriority::Critical
            } else if rating >= 4.0 {
                KnowledgePriority::High
            } else if rating >= 3.0 {
                KnowledgePriority::Medium
            } else if rating >= 2.0 {
                KnowledgePriority::Low
            } else {
                KnowledgePriority::Archive
            }
        },
    )
}

/// The remote table an entity belongs in, chosen by classification.
#[must_use]
pub const fn table_for_classification(classification: KnowledgeClassification) -> &'static str {
    match classification {
        KnowledgeClassification::Foundational | KnowledgeClassification::Reference => {
            "Strategic Knowledge"
        }
        KnowledgeClassification::Strategic => "Strategic Initiatives",
        KnowledgeClassification::Operational => "Metrics",
    }
}

/// Build an internal entity from a remote record. The remote row id becomes
/// both the entity id and `source_id`, so later syncs find the same row.
#[must_use]
pub fn record_to_entity(
    record: &AirtableRecord,
    classification: KnowledgeClassification,
) -> KnowledgeEntity {
    let fields = &record.fields;
    let now = OffsetDateTime::now_utc();

    let name = field_str(fields, "Name")
        .or_else(|| field_str(fields, "Document Name"))
        .unwrap_or("Untitled")
        .to_string();

    let last_modified = field_str(fields, "Last Modified")
        .or_else(|| field_str(fields, "Last Reviewed"))
        .map(ToString::to_string);

    let mut entity = KnowledgeEntity {
        id: record.id.clone(),
        name,
        category: field_str(fields, "Category").unwrap_or("general").to_string(),
        classification,
        priority: map_priority(fields.get("Priority")),
        content: json!({
            "summary": field_str(fields, "Summary").unwrap_or(""),
            "key_insights": field_str(fields, "Key Insights").unwrap_or(""),
            "strategic_implications": field_str(fields, "Strategic Implications").unwrap_or(""),
            "ceo_notes": field_str(fields, "CEO Notes").unwrap_or(""),
            "raw_data": fields,
        }),
        pay_ready_context: None,
        metadata: json!({
            "airtable_id": record.id,
            "created_time": record.created_time,
            "last_modified": last_modified,
        }),
        source: REMOTE_SOURCE.to_string(),
        source_id: Some(record.id.clone()),
        is_active: true,
        is_foundational: false,
        version: 1,
        created_at: record
            .created_time
            .as_deref()
            .and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
            .unwrap_or(now),
        updated_at: remote_modified(record).unwrap_or(now),
        synced_at: Some(now),
    };
    entity.normalize();
    entity
}

/// Build the outbound remote field shape from an entity.
///
/// # Errors
/// Returns a serialization error if the entity metadata cannot be rendered
pub fn entity_to_fields(
    entity: &KnowledgeEntity,
) -> knowledge_core_core::error::Result<JsonValue> {
    let content = &entity.content;
    let confidence = if entity.is_foundational { 0.95 } else { 0.75 };

    Ok(json!({
        "Name": entity.name,
        "Category": entity.category,
        "Classification": entity.classification.as_str(),
        "Priority": entity.priority.as_i64(),
        "Summary": content.get("summary").and_then(|v| v.as_str()).unwrap_or(""),
        "Key Insights": content.get("key_insights").and_then(|v| v.as_str()).unwrap_or(""),
        "Strategic Implications": content
            .get("strategic_implications")
            .and_then(|v| v.as_str())
            .unwrap_or(""),
        "AI Analysis": serde_json::to_string(&entity.metadata)?,
        "Confidence": confidence,
        "Last Updated": OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: JsonValue) -> AirtableRecord {
        AirtableRecord {
            id: "recAb12Cd34Ef56Gh".to_string(),
            created_time: Some("2025-01-15T08:00:00Z".to_string()),
            fields,
        }
    }

    #[test]
    fn test_priority_mapping_is_non_linear() {
        assert_eq!(map_priority(Some(&json!(5))), KnowledgePriority::Critical);
        assert_eq!(map_priority(Some(&json!(4.5))), KnowledgePriority::High);
        assert_eq!(map_priority(Some(&json!(3))), KnowledgePriority::Medium);
        assert_eq!(map_priority(Some(&json!(2))), KnowledgePriority::Low);
        assert_eq!(map_priority(Some(&json!(1))), KnowledgePriority::Archive);
        assert_eq!(map_priority(Some(&json!("high"))), KnowledgePriority::Medium);
        assert_eq!(map_priority(None), KnowledgePriority::Medium);
    }

    #[test]
    fn test_record_to_entity_field_mapping() {
        let rec = record(json!({
            "Name": "Q3 board priorities",
            "Category": "executive_decisions",
            "Priority": 4,
            "Summary": "Board-approved priorities for Q3",
            "Key Insights": "Focus on recovery platform growth",
            "Last Modified": "2025-06-01T12:00:00Z",
        }));

        let entity = record_to_entity(&rec, KnowledgeClassification::Strategic);

        assert_eq!(entity.id, "recAb12Cd34Ef56Gh");
        assert_eq!(entity.source_id.as_deref(), Some("recAb12Cd34Ef56Gh"));
        assert_eq!(entity.source, REMOTE_SOURCE);
        assert_eq!(entity.name, "Q3 board priorities");
        assert_eq!(entity.category, "executive_decisions");
        assert_eq!(entity.priority, KnowledgePriority::High);
        assert!(entity.is_foundational);
        assert_eq!(
            entity.content["summary"],
            json!("Board-approved priorities for Q3")
        );
        assert_eq!(entity.content["raw_data"]["Priority"], json!(4));
        assert_eq!(
            entity.metadata["last_modified"],
            json!("2025-06-01T12:00:00Z")
        );
        assert_eq!(
            entity.updated_at,
            OffsetDateTime::parse("2025-06-01T12:00:00Z", &Rfc3339).unwrap()
        );
    }

    #[test]
    fn test_record_to_entity_name_fallbacks() {
        let rec = record(json!({"Document Name": "Mission statement"}));
        let entity = record_to_entity(&rec, KnowledgeClassification::Foundational);
        assert_eq!(entity.name, "Mission statement");
        assert_eq!(entity.category, "general");

        let unnamed = record(json!({}));
        let entity = record_to_entity(&unnamed, KnowledgeClassification::Foundational);
        assert_eq!(entity.name, "Untitled");
    }

    #[test]
    fn test_remote_modified_fallback_to_last_reviewed() {
        let rec = record(json!({"Last Reviewed": "2025-05-01T00:00:00Z"}));
        assert_eq!(
            remote_modified(&rec),
            Some(OffsetDateTime::parse("2025-05-01T00:00:00Z", &Rfc3339).unwrap())
        );
        assert!(remote_modified(&record(json!({}))).is_none());
    }

    #[test]
    fn test_table_selection() {
        assert_eq!(
            table_for_classification(KnowledgeClassification::Foundational),
            "Strategic Knowledge"
        );
        assert_eq!(
            table_for_classification(KnowledgeClassification::Strategic),
            "Strategic Initiatives"
        );
        assert_eq!(
            table_for_classification(KnowledgeClassification::Operational),
            "Metrics"
        );
        assert_eq!(
            table_for_classification(KnowledgeClassification::Reference),
            "Strategic Knowledge"
        );
    }

    #[test]
    fn test_entity_to_fields_round_trip_shape() {
        let rec = record(json!({
            "Name": "Mission",
            "Summary": "The mission",
            "Priority": 5,
        }));
        let entity = record_to_entity(&rec, KnowledgeClassification::Foundational);
        let fields = entity_to_fields(&entity).unwrap();

        assert_eq!(fields["Name"], json!("Mission"));
        assert_eq!(fields["Classification"], json!("foundational"));
        assert_eq!(fields["Priority"], json!(5));
        assert_eq!(fields["Summary"], json!("The mission"));
        assert_eq!(fields["Confidence"], json!(0.95));
    }
}
