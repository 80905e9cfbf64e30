#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::knowledge::content::shallow_merge;
use crate::knowledge::entity::KnowledgeEntity;

/// Kinds of synchronization runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    FullSync,
    IncrementalSync,
    ManualSync,
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FullSync => "full_sync",
            Self::IncrementalSync => "incremental_sync",
            Self::ManualSync => "manual_sync",
        };
        f.write_str(s)
    }
}

impl FromStr for SyncKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full_sync" | "full" => Ok(Self::FullSync),
            "incremental_sync" | "incremental" => Ok(Self::IncrementalSync),
            "manual_sync" | "manual" => Ok(Self::ManualSync),
            other => Err(Error::Validation(format!("Unknown sync kind: {other}"))),
        }
    }
}

/// Lifecycle of a synchronization run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Partial,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Partial => "partial",
        };
        f.write_str(s)
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "partial" => Ok(Self::Partial),
            other => Err(Error::Validation(format!("Unknown sync status: {other}"))),
        }
    }
}

/// One full, incremental or manual synchronization run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncOperation {
    pub id: String,
    pub kind: SyncKind,
    pub source: String,
    pub status: SyncStatus,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub completed_at: Option<OffsetDateTime>,
    pub records_processed: i64,
    pub conflicts_detected: i64,
    #[schema(value_type = Option<Object>)]
    pub error_details: Option<JsonValue>,
}

impl SyncOperation {
    #[must_use]
    pub fn new(kind: SyncKind, source: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            source: source.to_string(),
            status: SyncStatus::InProgress,
            started_at: OffsetDateTime::now_utc(),
            completed_at: None,
            records_processed: 0,
            conflicts_detected: 0,
            error_details: None,
        }
    }

    /// Mark the run finished; any per-record errors downgrade it to partial.
    pub fn complete(&mut self, records: i64, conflicts: i64, errors: &[String]) {
        self.status = if errors.is_empty() {
            SyncStatus::Completed
        } else {
            self.error_details = Some(serde_json::json!({ "errors": errors }));
            SyncStatus::Partial
        };
        self.completed_at = Some(OffsetDateTime::now_utc());
        self.records_processed = records;
        self.conflicts_detected = conflicts;
    }

    /// Mark the run failed.
    pub fn fail(&mut self, error: &str) {
        self.status = SyncStatus::Failed;
        self.completed_at = Some(OffsetDateTime::now_utc());
        self.error_details = Some(serde_json::json!({ "error": error }));
    }
}

/// What diverged between the local and remote snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Content,
    Metadata,
    Classification,
    Deletion,
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Content => "content",
            Self::Metadata => "metadata",
            Self::Classification => "classification",
            Self::Deletion => "deletion",
        };
        f.write_str(s)
    }
}

impl FromStr for ConflictType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "content" => Ok(Self::Content),
            "metadata" => Ok(Self::Metadata),
            "classification" => Ok(Self::Classification),
            "deletion" => Ok(Self::Deletion),
            other => Err(Error::Validation(format!("Unknown conflict type: {other}"))),
        }
    }
}

/// Resolution lifecycle of a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Pending,
    AutoResolved,
    ManualResolved,
    Ignored,
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::AutoResolved => "auto_resolved",
            Self::ManualResolved => "manual_resolved",
            Self::Ignored => "ignored",
        };
        f.write_str(s)
    }
}

impl FromStr for ResolutionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "auto_resolved" => Ok(Self::AutoResolved),
            "manual_resolved" => Ok(Self::ManualResolved),
            "ignored" => Ok(Self::Ignored),
            other => Err(Error::Validation(format!(
                "Unknown resolution status: {other}"
            ))),
        }
    }
}

/// How a conflict should be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    RemoteWins,
    LocalWins,
    Merge,
    /// Pick a concrete strategy from the foundational flags of both sides
    Auto,
}

impl FromStr for ResolutionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "remote_wins" => Ok(Self::RemoteWins),
            "local_wins" => Ok(Self::LocalWins),
            "merge" => Ok(Self::Merge),
            "auto" => Ok(Self::Auto),
            other => Err(Error::Validation(format!(
                "Unknown resolution strategy: {other}"
            ))),
        }
    }
}

/// A divergence between local and remote snapshots of one entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncConflict {
    pub id: String,
    pub knowledge_id: String,
    pub sync_operation_id: String,
    #[schema(value_type = Object)]
    pub local_snapshot: JsonValue,
    #[schema(value_type = Object)]
    pub remote_snapshot: JsonValue,
    pub conflict_type: ConflictType,
    pub resolution_status: ResolutionStatus,
    pub resolved_by: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub resolved_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

impl SyncConflict {
    /// Build a pending conflict from the two entity snapshots.
    ///
    /// # Errors
    /// Returns an error if either entity fails to serialize.
    pub fn detect(
        sync_operation_id: &str,
        local: &KnowledgeEntity,
        remote: &KnowledgeEntity,
    ) -> Result<Self> {
        let conflict_type = if local.is_active != remote.is_active {
            ConflictType::Deletion
        } else if local.content != remote.content {
            ConflictType::Content
        } else if local.classification != remote.classification {
            ConflictType::Classification
        } else {
            ConflictType::Metadata
        };

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            knowledge_id: local.id.clone(),
            sync_operation_id: sync_operation_id.to_string(),
            local_snapshot: serde_json::to_value(local)?,
            remote_snapshot: serde_json::to_value(remote)?,
            conflict_type,
            resolution_status: ResolutionStatus::Pending,
            resolved_by: None,
            resolved_at: None,
            created_at: OffsetDateTime::now_utc(),
        })
    }

    fn local_entity(&self) -> Result<KnowledgeEntity> {
        Ok(serde_json::from_value(self.local_snapshot.clone())?)
    }

    fn remote_entity(&self) -> Result<KnowledgeEntity> {
        Ok(serde_json::from_value(self.remote_snapshot.clone())?)
    }

    /// Reduce `Auto` to a concrete strategy: a foundational side always wins
    /// over a non-foundational one, equals merge.
    ///
    /// # Errors
    /// Returns an error if a snapshot cannot be deserialized.
    pub fn effective_strategy(&self, strategy: ResolutionStrategy) -> Result<ResolutionStrategy> {
        if strategy != ResolutionStrategy::Auto {
            return Ok(strategy);
        }
        let local = self.local_entity()?;
        let remote = self.remote_entity()?;
        Ok(if local.is_foundational && !remote.is_foundational {
            ResolutionStrategy::LocalWins
        } else if remote.is_foundational && !local.is_foundational {
            ResolutionStrategy::RemoteWins
        } else {
            ResolutionStrategy::Merge
        })
    }

    /// Resolve the conflict, returning the entity that should be persisted.
    /// The record is stamped auto-resolved; callers doing a manual resolution
    /// use `mark_manual` afterwards.
    ///
    /// # Errors
    /// Returns an error if a snapshot cannot be deserialized or the strategy
    /// is still `Auto` after reduction (cannot happen via
    /// `effective_strategy`).
    pub fn resolve(&mut self, strategy: ResolutionStrategy) -> Result<KnowledgeEntity> {
        let resolved = match self.effective_strategy(strategy)? {
            ResolutionStrategy::RemoteWins => self.remote_entity()?,
            ResolutionStrategy::LocalWins => self.local_entity()?,
            ResolutionStrategy::Merge => {
                let local = self.local_entity()?;
                let remote = self.remote_entity()?;
                let mut merged = remote;
                merged.content = shallow_merge(&local.content, &merged.content);
                merged.metadata = shallow_merge(&local.metadata, &merged.metadata);
                merged.set_metadata("conflict_merged", serde_json::json!(true));
                merged
            }
            ResolutionStrategy::Auto => {
                return Err(Error::Validation(
                    "Auto strategy did not reduce to a concrete one".to_string(),
                ))
            }
        };

        self.resolution_status = ResolutionStatus::AutoResolved;
        self.resolved_at = Some(OffsetDateTime::now_utc());
        Ok(resolved)
    }

    /// Stamp a manual resolution.
    pub fn mark_manual(&mut self, resolver: &str) {
        self.resolution_status = ResolutionStatus::ManualResolved;
        self.resolved_by = Some(resolver.to_string());
        self.resolved_at = Some(OffsetDateTime::now_utc());
    }
}
