//! End-to-end flows over the real store (in-memory sqlite): classification
//! on create, version log growth, rollback, cache transparency and search.

mod common;

use serde_json::json;

use knowledge_core_core::knowledge::{
    KnowledgeClassification, KnowledgeEntity, KnowledgePriority,
};
use knowledge_core_persistence::EntityFilter;

fn mission_entity() -> KnowledgeEntity {
    KnowledgeEntity::new(
        "Pay Ready Mission",
        "company_overview",
        json!({
            "mission": "AI-first resident engagement platform",
            "scale": "$20B+",
        }),
    )
}

#[tokio::test]
async fn test_create_classifies_foundational_with_initial_version() {
    let app = common::build_test_app().await;

    let created = app
        .knowledge
        .create(mission_entity(), "tester")
        .await
        .unwrap();

    assert_eq!(created.classification, KnowledgeClassification::Foundational);
    assert!(created.is_foundational);
    assert!(created.priority >= KnowledgePriority::High);
    assert_eq!(created.version, 1);
    assert!(created.pay_ready_context.is_some());

    // A later read returns the same entity
    let fetched = app.knowledge.get(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.content, created.content);

    // Exactly one version, numbered 1
    let versions = app.knowledge.versioning().history(&created.id).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version_number, 1);
    assert_eq!(versions[0].content, created.content);
    assert_eq!(versions[0].change_summary.as_deref(), Some("Initial version"));
}

#[tokio::test]
async fn test_update_appends_exactly_one_version() {
    let app = common::build_test_app().await;
    let created = app
        .knowledge
        .create(mission_entity(), "tester")
        .await
        .unwrap();

    let mut changed = created.clone();
    changed.content = json!({
        "mission": "AI-first resident engagement platform",
        "scale": "$20B+",
        "employees": 100,
    });

    let updated = app.knowledge.update(changed, "tester").await.unwrap();
    assert_eq!(updated.version, 2);

    let versions = app.knowledge.versioning().history(&created.id).await.unwrap();
    let numbers: Vec<i64> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![2, 1]);

    // Version 1 lacks the new field, version 2 has it
    assert!(versions[1].content.get("employees").is_none());
    assert_eq!(versions[0].content["employees"], json!(100));

    // The newest version row mirrors the entity row
    let current = app.knowledge.get(&created.id).await.unwrap().unwrap();
    assert_eq!(versions[0].content, current.content);
}

#[tokio::test]
async fn test_update_without_content_change_keeps_version() {
    let app = common::build_test_app().await;
    let created = app
        .knowledge
        .create(mission_entity(), "tester")
        .await
        .unwrap();

    let mut renamed = created.clone();
    renamed.name = "Pay Ready Mission Statement".to_string();

    let updated = app.knowledge.update(renamed, "tester").await.unwrap();
    assert_eq!(updated.version, 1);

    let versions = app.knowledge.versioning().history(&created.id).await.unwrap();
    assert_eq!(versions.len(), 1);
}

#[tokio::test]
async fn test_rollback_restores_content_as_new_version() {
    let app = common::build_test_app().await;
    let created = app
        .knowledge
        .create(mission_entity(), "tester")
        .await
        .unwrap();

    let mut changed = created.clone();
    changed.content = json!({
        "mission": "AI-first resident engagement platform",
        "scale": "$20B+",
        "employees": 100,
    });
    app.knowledge.update(changed, "tester").await.unwrap();

    let restored = app.knowledge.rollback(&created.id, 1).await.unwrap();

    assert_eq!(restored.version, 3);
    assert_eq!(restored.content, created.content);
    assert_eq!(restored.metadata["rolled_back_from"], json!(2));
    assert_eq!(restored.metadata["rolled_back_to"], json!(1));

    let versions = app.knowledge.versioning().history(&created.id).await.unwrap();
    assert_eq!(versions.len(), 3);
    assert!(versions[0]
        .change_summary
        .as_deref()
        .unwrap()
        .contains("Rolled back from version 2 to version 1"));

    // Round trip: the restored state diffs empty against version 1
    let comparison = app
        .knowledge
        .versioning()
        .compare(&created.id, 1, 3)
        .await
        .unwrap();
    assert!(comparison.diff.content.is_empty());
}

#[tokio::test]
async fn test_get_served_from_cache_matches_store() {
    let app = common::build_test_app().await;
    let created = app
        .knowledge
        .create(mission_entity(), "tester")
        .await
        .unwrap();

    // First read may populate, second read hits the cache; both agree
    let first = app.knowledge.get(&created.id).await.unwrap().unwrap();
    let second = app.knowledge.get(&created.id).await.unwrap().unwrap();
    assert_eq!(first.content, second.content);
    assert_eq!(first.version, second.version);
    assert_eq!(first.updated_at, second.updated_at);
}

#[tokio::test]
async fn test_duplicate_id_conflicts() {
    let app = common::build_test_app().await;
    let entity = mission_entity();
    app.knowledge.create(entity.clone(), "tester").await.unwrap();

    let result = app.knowledge.create(entity, "tester").await;
    assert!(matches!(
        result,
        Err(knowledge_core_core::error::Error::Conflict(_))
    ));
}

#[tokio::test]
async fn test_search_and_filters() {
    let app = common::build_test_app().await;
    app.knowledge
        .create(mission_entity(), "tester")
        .await
        .unwrap();

    let mut report = KnowledgeEntity::new(
        "Weekly ops report",
        "reports",
        json!({"summary": "routine operational metrics for the week"}),
    );
    report.classification = KnowledgeClassification::Operational;
    report.priority = KnowledgePriority::Low;
    app.knowledge.create(report, "tester").await.unwrap();

    // Search hides operational rows unless asked
    let foundational_only = app.knowledge.search("report", false).await.unwrap();
    assert!(foundational_only.is_empty());
    let with_operational = app.knowledge.search("report", true).await.unwrap();
    assert_eq!(with_operational.len(), 1);

    // Case-insensitive match over content
    let mission_hits = app.knowledge.search("RESIDENT", true).await.unwrap();
    assert_eq!(mission_hits.len(), 1);

    let foundational = app.knowledge.list_foundational(10).await.unwrap();
    assert_eq!(foundational.len(), 1);

    let by_category = app
        .knowledge
        .list(
            &EntityFilter {
                classification: None,
                category: Some("reports".to_string()),
                is_active: Some(true),
            },
            10,
            0,
        )
        .await
        .unwrap();
    assert_eq!(by_category.len(), 1);

    let stats = app.knowledge.statistics().await.unwrap();
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.foundational_count, 1);
    assert_eq!(stats.by_classification.get("foundational"), Some(&1));
    assert_eq!(stats.by_category.get("reports"), Some(&1));
}

#[tokio::test]
async fn test_soft_delete_hides_from_active_listing() {
    let app = common::build_test_app().await;
    let created = app
        .knowledge
        .create(mission_entity(), "tester")
        .await
        .unwrap();

    let deactivated = app
        .knowledge
        .deactivate(&created.id, "tester")
        .await
        .unwrap();
    assert!(!deactivated.is_active);

    let foundational = app.knowledge.list_foundational(10).await.unwrap();
    assert!(foundational.is_empty());

    // History survives a soft delete
    let versions = app.knowledge.versioning().history(&created.id).await.unwrap();
    assert!(!versions.is_empty());
}

#[tokio::test]
async fn test_hard_delete_cascades_to_versions() {
    let app = common::build_test_app().await;
    let created = app
        .knowledge
        .create(mission_entity(), "tester")
        .await
        .unwrap();

    assert!(app.knowledge.delete(&created.id).await.unwrap());
    assert!(app.knowledge.get(&created.id).await.unwrap().is_none());

    let versions = app.knowledge.versioning().history(&created.id).await.unwrap();
    assert!(versions.is_empty());

    // Deleting again reports absence
    assert!(!app.knowledge.delete(&created.id).await.unwrap());
}
