#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod prelude;
pub mod utils;

pub use classifier::ClassificationEngine;
pub use error::{Error, Result};
pub use knowledge::{
    KnowledgeClassification, KnowledgeEntity, KnowledgePriority, KnowledgeVersion, PayReadyContext,
    SyncConflict, SyncOperation,
};
