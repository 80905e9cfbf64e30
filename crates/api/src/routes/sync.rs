#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use actix_web::http::StatusCode;
use actix_web::{get, post, web, Responder};
use serde_json::json;

use crate::api_state::ApiState;
use crate::auth::{AdminAuth, RequiredAuth};
use crate::models::{SyncHistoryQuery, SyncTriggerRequest};
use crate::response::{error_detail, from_error, ApiResponse};
use knowledge_core_core::knowledge::SyncKind;

#[utoipa::path(
    post,
    path = "/api/knowledge/sync/trigger",
    tag = "sync",
    request_body = SyncTriggerRequest,
    responses(
        (status = 200, description = "Sync result"),
        (status = 400, description = "Unknown sync type"),
        (status = 409, description = "Sync already in progress")
    ),
    security(("bearer" = []))
)]
#[post("/sync/trigger")]
pub async fn trigger_sync(
    data: web::Data<ApiState>,
    body: web::Json<SyncTriggerRequest>,
    _admin: AdminAuth,
) -> impl Responder {
    let kind = match body.sync_type.as_str() {
        "full" => SyncKind::FullSync,
        "incremental" => SyncKind::IncrementalSync,
        other => {
            return error_detail(
                StatusCode::BAD_REQUEST,
                &format!("Unknown sync type '{other}'; expected 'full' or 'incremental'"),
            )
        }
    };

    match data.scheduler.trigger_manual(kind).await {
        Ok(summary) => ApiResponse::ok_with_message(
            json!({ "message": format!("{} triggered", body.sync_type), "result": summary }),
            "Sync completed",
        ),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/knowledge/sync/status",
    tag = "sync",
    responses((status = 200, description = "Scheduler status")),
    security(("bearer" = []))
)]
#[get("/sync/status")]
pub async fn sync_status(data: web::Data<ApiState>, _auth: RequiredAuth) -> impl Responder {
    ApiResponse::ok(data.scheduler.status())
}

#[utoipa::path(
    get,
    path = "/api/knowledge/sync/history",
    tag = "sync",
    responses((status = 200, description = "Recent sync runs, newest first")),
    security(("bearer" = []))
)]
#[get("/sync/history")]
pub async fn sync_history(
    data: web::Data<ApiState>,
    query: web::Query<SyncHistoryQuery>,
    _auth: RequiredAuth,
) -> impl Responder {
    let limit = query.limit.unwrap_or(10).min(100);
    ApiResponse::ok(data.scheduler.history(limit))
}

#[utoipa::path(
    post,
    path = "/api/knowledge/sync/resume",
    tag = "sync",
    responses((status = 200, description = "Scheduler resumed")),
    security(("bearer" = []))
)]
#[post("/sync/resume")]
pub async fn resume_sync(data: web::Data<ApiState>, _admin: AdminAuth) -> impl Responder {
    data.scheduler.resume();

    // Foundational entries are re-cached after a resumption
    if let Err(e) = data.knowledge.refresh_cache().await {
        log::warn!("Cache refresh after resume failed: {e}");
    }

    ApiResponse::ok(json!({ "message": "Sync scheduler resumed" }))
}
