#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod knowledge_repository;
pub mod knowledge_repository_trait;
pub mod mapper;
pub mod pool;
pub mod schema;
pub mod sync_repository;
pub mod sync_repository_trait;
pub mod version_repository;
pub mod version_repository_trait;

pub use knowledge_repository::KnowledgeRepository;
pub use knowledge_repository_trait::{EntityFilter, KnowledgeRepositoryTrait, KnowledgeStats};
pub use pool::{QueryStatsSnapshot, SlowQuery, Store};
pub use sync_repository::SyncRepository;
pub use sync_repository_trait::SyncRepositoryTrait;
pub use version_repository::VersionRepository;
pub use version_repository_trait::VersionRepositoryTrait;
