#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use actix_web::http::StatusCode;
use actix_web::{get, post, web, Responder};
use serde::Deserialize;

use crate::api_state::ApiState;
use crate::auth::{AdminAuth, OptionalAuth};
use crate::models::{CompareQuery, RestoreRequest};
use crate::response::{error_detail, from_error, ApiResponse};
use knowledge_core_core::knowledge::KnowledgeVersion;

#[derive(Debug, Deserialize)]
pub struct ChangesQuery {
    pub limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/knowledge/{id}/versions",
    tag = "versions",
    responses(
        (status = 200, description = "Version history, newest first", body = [KnowledgeVersion]),
        (status = 404, description = "Entity not found")
    )
)]
#[get("/{id}/versions")]
pub async fn list_versions(
    data: web::Data<ApiState>,
    path: web::Path<String>,
    _auth: OptionalAuth,
) -> impl Responder {
    let id = path.into_inner();

    match data.knowledge.get(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_detail(
                StatusCode::NOT_FOUND,
                &format!("Knowledge entity {id} not found"),
            )
        }
        Err(e) => return from_error(&e),
    }

    match data.knowledge.versioning().history(&id).await {
        Ok(versions) => ApiResponse::ok(versions),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    post,
    path = "/api/knowledge/{id}/restore",
    tag = "versions",
    request_body = RestoreRequest,
    responses(
        (status = 200, description = "Restored entity"),
        (status = 404, description = "Entity or version not found")
    ),
    security(("bearer" = []))
)]
#[post("/{id}/restore")]
pub async fn restore_version(
    data: web::Data<ApiState>,
    path: web::Path<String>,
    body: web::Json<RestoreRequest>,
    _admin: AdminAuth,
) -> impl Responder {
    let id = path.into_inner();

    match data.knowledge.rollback(&id, body.version_number).await {
        Ok(entity) => ApiResponse::ok_with_message(
            entity,
            &format!("Restored to version {}", body.version_number),
        ),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/knowledge/{id}/compare",
    tag = "versions",
    responses(
        (status = 200, description = "Diff between two versions"),
        (status = 404, description = "Version not found")
    )
)]
#[get("/{id}/compare")]
pub async fn compare_versions(
    data: web::Data<ApiState>,
    path: web::Path<String>,
    query: web::Query<CompareQuery>,
    _auth: OptionalAuth,
) -> impl Responder {
    let id = path.into_inner();

    match data
        .knowledge
        .versioning()
        .compare(&id, query.v1, query.v2)
        .await
    {
        Ok(comparison) => ApiResponse::ok(comparison),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/knowledge/{id}/changes",
    tag = "versions",
    responses((status = 200, description = "Recent changes with diffs"))
)]
#[get("/{id}/changes")]
pub async fn latest_changes(
    data: web::Data<ApiState>,
    path: web::Path<String>,
    query: web::Query<ChangesQuery>,
    _auth: OptionalAuth,
) -> impl Responder {
    let id = path.into_inner();
    let limit = query.limit.unwrap_or(5).min(50);

    match data.knowledge.versioning().latest_changes(&id, limit).await {
        Ok(changes) => ApiResponse::ok(changes),
        Err(e) => from_error(&e),
    }
}
