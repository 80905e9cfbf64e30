#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

//! Row mapping between `AnyRow` and the domain structs. Timestamps travel as
//! RFC-3339 TEXT, JSON sub-objects as serialized TEXT, enums as their string
//! forms and the priority as its ordinal.

use serde_json::Value as JsonValue;
use sqlx::any::AnyRow;
use sqlx::Row;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use knowledge_core_core::error::{Error, Result};
use knowledge_core_core::knowledge::{
    ConflictType, KnowledgeClassification, KnowledgeEntity, KnowledgePriority, KnowledgeVersion,
    ResolutionStatus, SyncConflict, SyncKind, SyncOperation, SyncStatus,
};

/// Format a timestamp for storage.
///
/// # Errors
/// Returns an error if formatting fails (cannot happen for valid instants)
pub fn format_timestamp(value: OffsetDateTime) -> Result<String> {
    value
        .format(&Rfc3339)
        .map_err(|e| Error::Unknown(format!("Failed to format timestamp: {e}")))
}

/// Parse a stored timestamp.
///
/// # Errors
/// Returns an error if the stored value is not RFC-3339
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .map_err(|e| Error::Unknown(format!("Invalid stored timestamp '{raw}': {e}")))
}

fn parse_optional_timestamp(raw: Option<String>) -> Result<Option<OffsetDateTime>> {
    raw.map(|s| parse_timestamp(&s)).transpose()
}

fn parse_json(raw: &str) -> Result<JsonValue> {
    serde_json::from_str(raw).map_err(Error::Serialization)
}

fn parse_optional_json(raw: Option<String>) -> Result<Option<JsonValue>> {
    raw.map(|s| parse_json(&s)).transpose()
}

/// Map a `foundational_knowledge` row.
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_entity_row(row: &AnyRow) -> Result<KnowledgeEntity> {
    let classification: String = row.try_get("classification")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let synced_at: Option<String> = row.try_get("synced_at")?;
    let content: String = row.try_get("content")?;
    let metadata: String = row.try_get("metadata")?;
    let pay_ready_context: Option<String> = row.try_get("pay_ready_context")?;

    Ok(KnowledgeEntity {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        classification: KnowledgeClassification::from_str(&classification)?,
        priority: KnowledgePriority::from_ordinal(row.try_get::<i64, _>("priority")?),
        content: parse_json(&content)?,
        pay_ready_context: parse_optional_json(pay_ready_context)?
            .map(serde_json::from_value)
            .transpose()?,
        metadata: parse_json(&metadata)?,
        source: row.try_get("source")?,
        source_id: row.try_get("source_id")?,
        is_active: row.try_get("is_active")?,
        is_foundational: row.try_get("is_foundational")?,
        version: row.try_get("version")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        synced_at: parse_optional_timestamp(synced_at)?,
    })
}

/// Map a `knowledge_versions` row.
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_version_row(row: &AnyRow) -> Result<KnowledgeVersion> {
    let content: String = row.try_get("content")?;
    let metadata: Option<String> = row.try_get("metadata")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(KnowledgeVersion {
        version_id: row.try_get("version_id")?,
        knowledge_id: row.try_get("knowledge_id")?,
        version_number: row.try_get("version_number")?,
        content: parse_json(&content)?,
        metadata: parse_optional_json(metadata)?,
        change_summary: row.try_get("change_summary")?,
        changed_by: row.try_get("changed_by")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Map a `sync_operations` row.
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_sync_operation_row(row: &AnyRow) -> Result<SyncOperation> {
    let kind: String = row.try_get("kind")?;
    let status: String = row.try_get("status")?;
    let started_at: String = row.try_get("started_at")?;
    let completed_at: Option<String> = row.try_get("completed_at")?;
    let error_details: Option<String> = row.try_get("error_details")?;

    Ok(SyncOperation {
        id: row.try_get("id")?,
        kind: SyncKind::from_str(&kind)?,
        source: row.try_get("source")?,
        status: SyncStatus::from_str(&status)?,
        started_at: parse_timestamp(&started_at)?,
        completed_at: parse_optional_timestamp(completed_at)?,
        records_processed: row.try_get("records_processed")?,
        conflicts_detected: row.try_get("conflicts_detected")?,
        error_details: parse_optional_json(error_details)?,
    })
}

/// Map a `sync_conflicts` row.
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_conflict_row(row: &AnyRow) -> Result<SyncConflict> {
    let local_snapshot: String = row.try_get("local_snapshot")?;
    let remote_snapshot: String = row.try_get("remote_snapshot")?;
    let conflict_type: String = row.try_get("conflict_type")?;
    let resolution_status: String = row.try_get("resolution_status")?;
    let resolved_at: Option<String> = row.try_get("resolved_at")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(SyncConflict {
        id: row.try_get("id")?,
        knowledge_id: row.try_get("knowledge_id")?,
        sync_operation_id: row.try_get("sync_operation_id")?,
        local_snapshot: parse_json(&local_snapshot)?,
        remote_snapshot: parse_json(&remote_snapshot)?,
        conflict_type: ConflictType::from_str(&conflict_type)?,
        resolution_status: ResolutionStatus::from_str(&resolution_status)?,
        resolved_by: row.try_get("resolved_by")?,
        resolved_at: parse_optional_timestamp(resolved_at)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_timestamp_round_trip() {
        let instant = datetime!(2025-07-01 14:30:00 UTC);
        let formatted = format_timestamp(instant).unwrap();
        assert_eq!(formatted, "2025-07-01T14:30:00Z");
        assert_eq!(parse_timestamp(&formatted).unwrap(), instant);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }
}
