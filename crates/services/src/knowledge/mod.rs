#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

mod conflicts;
mod crud;
mod search;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::versioning::VersioningService;
use knowledge_core_core::cache::CacheManager;
use knowledge_core_core::classifier::ClassificationEngine;
use knowledge_core_core::knowledge::PayReadyContext;
use knowledge_core_persistence::KnowledgeRepositoryTrait;

/// The single facade over store, versioning, cache and classification. The
/// HTTP edge and the sync engine go through this service, never through the
/// repositories directly.
pub struct KnowledgeService {
    repository: Arc<dyn KnowledgeRepositoryTrait>,
    versioning: Arc<VersioningService>,
    classifier: ClassificationEngine,
    cache: Arc<CacheManager>,
    pay_ready_context: PayReadyContext,
}

impl KnowledgeService {
    #[must_use]
    pub fn new(
        repository: Arc<dyn KnowledgeRepositoryTrait>,
        versioning: Arc<VersioningService>,
        cache: Arc<CacheManager>,
    ) -> Self {
        Self {
            repository,
            versioning,
            classifier: ClassificationEngine::new(),
            cache,
            pay_ready_context: PayReadyContext::default(),
        }
    }

    /// The versioning service, for history and compare endpoints.
    #[must_use]
    pub fn versioning(&self) -> Arc<VersioningService> {
        self.versioning.clone()
    }

    /// The classification engine (pure, shared).
    #[must_use]
    pub const fn classifier(&self) -> &ClassificationEngine {
        &self.classifier
    }
}
