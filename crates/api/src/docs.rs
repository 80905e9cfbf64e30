#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::{
    BatchDeleteRequest, BatchResult, BatchUpdateItem, KnowledgeCreateRequest,
    KnowledgeUpdateRequest, RestoreRequest, StatisticsResponse, SyncTriggerRequest,
};
use crate::routes;
use knowledge_core_core::knowledge::{KnowledgeEntity, KnowledgeVersion, PayReadyContext};

/// OpenAPI document for the knowledge API
#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health_check,
        routes::health::readiness_check,
        routes::knowledge::create_knowledge,
        routes::knowledge::get_knowledge,
        routes::knowledge::update_knowledge,
        routes::knowledge::delete_knowledge,
        routes::knowledge::list_knowledge,
        routes::knowledge::search_knowledge,
        routes::knowledge::list_foundational,
        routes::knowledge::get_statistics,
        routes::knowledge::get_context,
        routes::knowledge::batch_create,
        routes::knowledge::batch_update,
        routes::knowledge::batch_delete,
        routes::versions::list_versions,
        routes::versions::restore_version,
        routes::versions::compare_versions,
        routes::versions::latest_changes,
        routes::sync::trigger_sync,
        routes::sync::sync_status,
        routes::sync::sync_history,
        routes::sync::resume_sync,
    ),
    components(schemas(
        KnowledgeEntity,
        KnowledgeVersion,
        PayReadyContext,
        KnowledgeCreateRequest,
        KnowledgeUpdateRequest,
        BatchUpdateItem,
        BatchDeleteRequest,
        BatchResult,
        RestoreRequest,
        SyncTriggerRequest,
        StatisticsResponse,
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "knowledge", description = "Foundational knowledge CRUD and search"),
        (name = "versions", description = "Version history and rollback"),
        (name = "sync", description = "Airtable synchronization"),
        (name = "health", description = "Liveness and readiness"),
    )
)]
pub struct ApiDoc;

/// Registers the bearer scheme referenced by the route annotations
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
