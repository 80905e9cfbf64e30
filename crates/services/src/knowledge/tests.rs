#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;

use super::KnowledgeService;
use crate::versioning::VersioningService;
use knowledge_core_core::cache::CacheManager;
use knowledge_core_core::config::CacheConfig;
use knowledge_core_core::error::Result;
use knowledge_core_core::knowledge::{
    KnowledgeClassification, KnowledgeEntity, KnowledgePriority, KnowledgeVersion,
    ResolutionStatus, ResolutionStrategy, SyncConflict,
};
use knowledge_core_persistence::{
    EntityFilter, KnowledgeRepositoryTrait, KnowledgeStats, VersionRepositoryTrait,
};

mock! {
    pub KnowledgeRepo {}

    #[async_trait]
    impl KnowledgeRepositoryTrait for KnowledgeRepo {
        async fn create(&self, entity: &KnowledgeEntity) -> Result<KnowledgeEntity>;
        async fn get(&self, id: &str) -> Result<Option<KnowledgeEntity>>;
        async fn update(&self, entity: &KnowledgeEntity) -> Result<KnowledgeEntity>;
        async fn delete(&self, id: &str) -> Result<bool>;
        async fn list(&self, filter: &EntityFilter, limit: i64, offset: i64) -> Result<Vec<KnowledgeEntity>>;
        async fn search(&self, query: &str) -> Result<Vec<KnowledgeEntity>>;
        async fn count(&self) -> Result<i64>;
        async fn statistics(&self) -> Result<KnowledgeStats>;
    }
}

mock! {
    pub VersionRepo {}

    #[async_trait]
    impl VersionRepositoryTrait for VersionRepo {
        async fn append(&self, version: &KnowledgeVersion) -> Result<()>;
        async fn list(&self, knowledge_id: &str) -> Result<Vec<KnowledgeVersion>>;
        async fn get(&self, knowledge_id: &str, version_number: i64) -> Result<Option<KnowledgeVersion>>;
        async fn count(&self, knowledge_id: &str) -> Result<i64>;
    }
}

fn build_service(
    knowledge_repo: MockKnowledgeRepo,
    version_repo: MockVersionRepo,
) -> KnowledgeService {
    let knowledge_repo: Arc<dyn KnowledgeRepositoryTrait> = Arc::new(knowledge_repo);
    let version_repo: Arc<dyn VersionRepositoryTrait> = Arc::new(version_repo);
    let versioning = Arc::new(VersioningService::new(
        version_repo,
        knowledge_repo.clone(),
    ));
    let cache = Arc::new(CacheManager::new(CacheConfig::default()));
    KnowledgeService::new(knowledge_repo, versioning, cache)
}

fn mission_entity() -> KnowledgeEntity {
    KnowledgeEntity::new(
        "Pay Ready Mission",
        "company_overview",
        json!({"mission": "AI-first resident engagement platform", "scale": "$20B+"}),
    )
}

#[tokio::test]
async fn test_create_classifies_and_writes_initial_version() {
    let mut knowledge_repo = MockKnowledgeRepo::new();
    knowledge_repo
        .expect_create()
        .times(1)
        .returning(|entity| Ok(entity.clone()));

    let mut version_repo = MockVersionRepo::new();
    version_repo.expect_list().returning(|_| Ok(Vec::new()));
    version_repo
        .expect_append()
        .withf(|version| {
            version.version_number == 1
                && version.change_summary.as_deref() == Some("Initial version")
        })
        .times(1)
        .returning(|_| Ok(()));

    let service = build_service(knowledge_repo, version_repo);
    let created = service.create(mission_entity(), "tester").await.unwrap();

    assert_eq!(created.classification, KnowledgeClassification::Foundational);
    assert!(created.is_foundational);
    assert!(created.priority >= KnowledgePriority::High);
    assert_eq!(created.version, 1);
    assert!(created.pay_ready_context.is_some());
    assert!(created.metadata.get("auto_tags").is_some());
    assert!(created.metadata.get("sensitivity").is_some());
}

#[tokio::test]
async fn test_get_is_cache_transparent() {
    let mut entity = mission_entity();
    entity.classification = KnowledgeClassification::Foundational;
    entity.normalize();
    let stored = entity.clone();

    let mut knowledge_repo = MockKnowledgeRepo::new();
    // The store is hit exactly once; the second read must come from cache
    knowledge_repo
        .expect_get()
        .times(1)
        .returning(move |_| Ok(Some(stored.clone())));

    let service = build_service(knowledge_repo, MockVersionRepo::new());

    let first = service.get(&entity.id).await.unwrap().unwrap();
    let second = service.get(&entity.id).await.unwrap().unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.content, second.content);
    assert_eq!(first.version, second.version);
}

#[tokio::test]
async fn test_update_with_changed_content_appends_version() {
    let current = mission_entity();
    let current_clone = current.clone();

    let mut knowledge_repo = MockKnowledgeRepo::new();
    knowledge_repo
        .expect_get()
        .returning(move |_| Ok(Some(current_clone.clone())));
    knowledge_repo
        .expect_update()
        .times(1)
        .returning(|entity| Ok(entity.clone()));

    let previous = KnowledgeVersion::new(&current.id, 1, current.content.clone());
    let mut version_repo = MockVersionRepo::new();
    version_repo
        .expect_list()
        .returning(move |_| Ok(vec![previous.clone()]));
    version_repo
        .expect_append()
        .withf(|version| version.version_number == 2)
        .times(1)
        .returning(|_| Ok(()));

    let service = build_service(knowledge_repo, version_repo);

    let mut changed = current.clone();
    changed.content = json!({
        "mission": "AI-first resident engagement platform",
        "scale": "$20B+",
        "employees": 100,
    });

    let updated = service.update(changed, "tester").await.unwrap();
    assert_eq!(updated.version, 2);
}

#[tokio::test]
async fn test_update_with_unchanged_content_appends_nothing() {
    let current = mission_entity();
    let current_clone = current.clone();

    let mut knowledge_repo = MockKnowledgeRepo::new();
    knowledge_repo
        .expect_get()
        .returning(move |_| Ok(Some(current_clone.clone())));
    knowledge_repo
        .expect_update()
        .times(1)
        .returning(|entity| Ok(entity.clone()));

    let mut version_repo = MockVersionRepo::new();
    version_repo.expect_append().times(0);
    version_repo.expect_list().times(0);

    let service = build_service(knowledge_repo, version_repo);

    let updated = service.update(current.clone(), "tester").await.unwrap();
    assert_eq!(updated.version, current.version);
}

#[tokio::test]
async fn test_auto_conflict_resolution_protects_foundational_local() {
    let mut local = mission_entity();
    local.classification = KnowledgeClassification::Foundational;
    local.normalize();
    local.updated_at = OffsetDateTime::now_utc();

    let mut remote = local.clone();
    remote.classification = KnowledgeClassification::Operational;
    remote.is_foundational = false;
    remote.priority = KnowledgePriority::Medium;
    remote.content = json!({"mission": "stale remote copy"});
    remote.updated_at = local.updated_at - time::Duration::hours(2);

    let mut conflict = SyncConflict::detect("op1", &local, &remote).unwrap();

    let local_clone = local.clone();
    let mut knowledge_repo = MockKnowledgeRepo::new();
    knowledge_repo
        .expect_get()
        .returning(move |_| Ok(Some(local_clone.clone())));
    knowledge_repo
        .expect_update()
        .times(1)
        .returning(|entity| Ok(entity.clone()));

    // local_wins leaves the content unchanged, so no version is appended
    let mut version_repo = MockVersionRepo::new();
    version_repo.expect_append().times(0);
    version_repo.expect_list().times(0);

    let service = build_service(knowledge_repo, version_repo);
    let resolved = service
        .handle_sync_conflict(&mut conflict, ResolutionStrategy::Auto)
        .await
        .unwrap();

    assert_eq!(resolved.content, local.content);
    assert_eq!(conflict.resolution_status, ResolutionStatus::AutoResolved);
    assert_eq!(resolved.version, local.version);
}

#[tokio::test]
async fn test_search_filters_operational_by_default() {
    let mut foundational = mission_entity();
    foundational.classification = KnowledgeClassification::Foundational;
    foundational.normalize();
    let mut operational = KnowledgeEntity::new("Weekly report", "reports", json!({"week": 31}));
    operational.classification = KnowledgeClassification::Operational;
    operational.normalize();

    let results = vec![foundational.clone(), operational];
    let mut knowledge_repo = MockKnowledgeRepo::new();
    knowledge_repo
        .expect_search()
        .returning(move |_| Ok(results.clone()));

    let service = build_service(knowledge_repo, MockVersionRepo::new());

    let filtered = service.search("report", false).await.unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, foundational.id);

    let all = service.search("report", true).await.unwrap();
    assert_eq!(all.len(), 2);
}
