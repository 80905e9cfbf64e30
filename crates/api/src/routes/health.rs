#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

use crate::api_state::ApiState;

/// Liveness: the process is up.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is alive"))
)]
#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Readiness: the store answers a ping.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Store reachable"),
        (status = 503, description = "Store unreachable")
    )
)]
#[get("/health/ready")]
pub async fn readiness_check(data: web::Data<ApiState>) -> impl Responder {
    match data.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({ "ready": true })),
        Err(e) => {
            log::warn!("Readiness probe failed: {e}");
            HttpResponse::ServiceUnavailable().json(json!({ "ready": false }))
        }
    }
}
