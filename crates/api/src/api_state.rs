#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use std::sync::Arc;

use knowledge_core_core::config::{ApiConfig, RateLimitConfig};
use knowledge_core_persistence::Store;
use knowledge_core_services::{AirtableSyncService, KnowledgeService, SyncScheduler};

use crate::middleware::rate_limit::SlidingWindowLimiter;

/// Shared application state handed to every handler
pub struct ApiState {
    pub store: Store,
    pub knowledge: Arc<KnowledgeService>,
    pub sync: Arc<AirtableSyncService>,
    pub scheduler: Arc<SyncScheduler>,
    pub rate_limiter: Arc<SlidingWindowLimiter>,
    pub api_config: ApiConfig,
    pub rate_limit_config: RateLimitConfig,
}

impl ApiState {
    #[must_use]
    pub fn new(
        store: Store,
        knowledge: Arc<KnowledgeService>,
        sync: Arc<AirtableSyncService>,
        scheduler: Arc<SyncScheduler>,
        api_config: ApiConfig,
        rate_limit_config: RateLimitConfig,
    ) -> Self {
        Self {
            store,
            knowledge,
            sync,
            scheduler,
            rate_limiter: Arc::new(SlidingWindowLimiter::default()),
            api_config,
            rate_limit_config,
        }
    }
}
