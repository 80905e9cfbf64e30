#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod health;
pub mod knowledge;
pub mod sync;
pub mod versions;

use actix_web::web;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;

/// Register every route. Literal paths are registered before the `/{id}`
/// family so they are matched first.
pub fn configure_app(cfg: &mut web::ServiceConfig, enable_docs: bool) {
    cfg.service(health::health_check)
        .service(health::readiness_check);

    cfg.service(
        web::scope("/api/knowledge")
            .service(knowledge::search_knowledge)
            .service(knowledge::list_foundational)
            .service(knowledge::get_statistics)
            .service(knowledge::get_context)
            .service(knowledge::batch_create)
            .service(knowledge::batch_update)
            .service(knowledge::batch_delete)
            .service(sync::trigger_sync)
            .service(sync::sync_status)
            .service(sync::sync_history)
            .service(sync::resume_sync)
            .service(knowledge::create_knowledge)
            .service(knowledge::list_knowledge)
            .service(versions::list_versions)
            .service(versions::latest_changes)
            .service(versions::restore_version)
            .service(versions::compare_versions)
            .service(knowledge::get_knowledge)
            .service(knowledge::update_knowledge)
            .service(knowledge::delete_knowledge),
    );

    if enable_docs {
        use utoipa::OpenApi;
        cfg.service(
            SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
    }
}
