#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub use crate::cache::{CacheBackend, CacheManager};
pub use crate::classifier::ClassificationEngine;
pub use crate::config::AppConfig;
pub use crate::error::{Error, Result};
pub use crate::knowledge::{
    ConflictType, KnowledgeClassification, KnowledgeEntity, KnowledgePriority, KnowledgeVersion,
    PayReadyContext, ResolutionStatus, ResolutionStrategy, SyncConflict, SyncKind, SyncOperation,
    SyncStatus,
};
