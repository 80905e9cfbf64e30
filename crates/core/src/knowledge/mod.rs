#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod content;
pub mod entity;
pub mod sync;
pub mod version;

pub use content::{diff_top_level, shallow_merge, ContentChange, ContentChanges};
pub use entity::{KnowledgeClassification, KnowledgeEntity, KnowledgePriority, PayReadyContext};
pub use sync::{
    ConflictType, ResolutionStatus, ResolutionStrategy, SyncConflict, SyncKind, SyncOperation,
    SyncStatus,
};
pub use version::{KnowledgeVersion, VersionDiff};
