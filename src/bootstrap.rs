//! Bootstrap module wiring the application together: database pool, cache,
//! services and scheduler, built in dependency order and shut down in
//! reverse.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use log::{info, warn};
use std::sync::Arc;

use knowledge_core_core::cache::CacheManager;
use knowledge_core_core::config::AppConfig;
use knowledge_core_core::error::Result;
use knowledge_core_persistence::{
    schema::ensure_schema, KnowledgeRepository, KnowledgeRepositoryTrait, Store, SyncRepository,
    SyncRepositoryTrait, VersionRepository, VersionRepositoryTrait,
};
use knowledge_core_services::{
    AirtableSyncService, KnowledgeService, SyncScheduler, VersioningService,
};

/// The application root: every long-lived component, owned in one place
/// instead of module-level globals.
pub struct AppContext {
    pub store: Store,
    pub knowledge: Arc<KnowledgeService>,
    pub sync: Arc<AirtableSyncService>,
    pub scheduler: Arc<SyncScheduler>,
}

/// Initialize the environment logger with the given log level
pub fn init_logger(log_level: &str) {
    let env = env_logger::Env::new().default_filter_or(log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Millis))
        .format_module_path(true)
        .format_target(true)
        .init();
}

/// Build the full application context from configuration.
///
/// # Errors
/// Returns an error if the database or the distributed cache cannot be
/// reached
pub async fn build_app(config: &AppConfig) -> Result<AppContext> {
    info!("Connecting to database...");
    let store = Store::connect(&config.database).await?;
    ensure_schema(&store).await?;

    let mut cache = CacheManager::new(config.cache.clone());
    if let Some(redis_url) = &config.cache.redis_url {
        cache = cache.with_redis(redis_url).await?;
        info!("Cache manager initialized with redis backend");
    }
    let cache = Arc::new(cache);

    let knowledge_repository: Arc<dyn KnowledgeRepositoryTrait> =
        Arc::new(KnowledgeRepository::new(store.clone()));
    let version_repository: Arc<dyn VersionRepositoryTrait> =
        Arc::new(VersionRepository::new(store.clone()));
    let sync_repository: Arc<dyn SyncRepositoryTrait> =
        Arc::new(SyncRepository::new(store.clone()));

    let versioning = Arc::new(VersioningService::new(
        version_repository,
        knowledge_repository.clone(),
    ));

    let knowledge = Arc::new(KnowledgeService::new(
        knowledge_repository,
        versioning,
        cache,
    ));

    // Warm the cache with the foundational set
    if let Err(e) = knowledge.refresh_cache().await {
        warn!("Startup cache refresh failed: {e}");
    }

    let sync = Arc::new(AirtableSyncService::new(
        config.sync.clone(),
        knowledge.clone(),
        sync_repository,
    ));

    let scheduler = Arc::new(SyncScheduler::new(sync.clone(), config.sync.clone()));

    Ok(AppContext {
        store,
        knowledge,
        sync,
        scheduler,
    })
}

/// Shut down in reverse dependency order: scheduler (waits for an in-flight
/// sync), then the store pool.
pub async fn shutdown(context: &AppContext) {
    context.scheduler.shutdown().await;
    context.store.close().await;
    info!("Shutdown complete");
}
