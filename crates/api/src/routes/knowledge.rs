#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use actix_web::http::StatusCode;
use actix_web::{delete, get, post, put, web, Responder};
use serde_json::json;
use validator::Validate;

use crate::api_state::ApiState;
use crate::auth::{AdminAuth, OptionalAuth, RequiredAuth};
use crate::models::{
    validation_detail, BatchDeleteRequest, BatchResult, BatchUpdateItem, KnowledgeCreateRequest,
    KnowledgeUpdateRequest, ListQuery, SearchQuery, StatisticsResponse, MAX_BATCH_CREATE,
    MAX_BATCH_DELETE, MAX_BATCH_UPDATE,
};
use crate::response::{error_detail, from_error, ApiResponse};
use knowledge_core_core::knowledge::KnowledgeEntity;
use knowledge_core_persistence::EntityFilter;

#[utoipa::path(
    post,
    path = "/api/knowledge/",
    tag = "knowledge",
    request_body = KnowledgeCreateRequest,
    responses(
        (status = 201, description = "Created entity", body = KnowledgeEntity),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Id already exists")
    ),
    security(("bearer" = []))
)]
#[post("/")]
pub async fn create_knowledge(
    data: web::Data<ApiState>,
    body: web::Json<KnowledgeCreateRequest>,
    auth: RequiredAuth,
) -> impl Responder {
    if let Err(errors) = body.validate() {
        return error_detail(StatusCode::BAD_REQUEST, &validation_detail(&errors));
    }

    let entity = match body.into_inner().into_entity() {
        Ok(entity) => entity,
        Err(e) => return from_error(&e),
    };

    match data.knowledge.create(entity, &auth.0.subject).await {
        Ok(created) => ApiResponse::created(created),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/knowledge/{id}",
    tag = "knowledge",
    responses(
        (status = 200, description = "Entity", body = KnowledgeEntity),
        (status = 404, description = "Not found")
    )
)]
#[get("/{id}")]
pub async fn get_knowledge(
    data: web::Data<ApiState>,
    path: web::Path<String>,
    _auth: OptionalAuth,
) -> impl Responder {
    let id = path.into_inner();
    match data.knowledge.get(&id).await {
        Ok(Some(entity)) => ApiResponse::ok(entity),
        Ok(None) => error_detail(
            StatusCode::NOT_FOUND,
            &format!("Knowledge entity {id} not found"),
        ),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    put,
    path = "/api/knowledge/{id}",
    tag = "knowledge",
    request_body = KnowledgeUpdateRequest,
    responses(
        (status = 200, description = "Updated entity", body = KnowledgeEntity),
        (status = 404, description = "Not found")
    ),
    security(("bearer" = []))
)]
#[put("/{id}")]
pub async fn update_knowledge(
    data: web::Data<ApiState>,
    path: web::Path<String>,
    body: web::Json<KnowledgeUpdateRequest>,
    auth: RequiredAuth,
) -> impl Responder {
    if let Err(errors) = body.validate() {
        return error_detail(StatusCode::BAD_REQUEST, &validation_detail(&errors));
    }

    let id = path.into_inner();
    let mut entity = match data.knowledge.get(&id).await {
        Ok(Some(entity)) => entity,
        Ok(None) => {
            return error_detail(
                StatusCode::NOT_FOUND,
                &format!("Knowledge entity {id} not found"),
            )
        }
        Err(e) => return from_error(&e),
    };

    if let Err(e) = body.apply_to(&mut entity) {
        return from_error(&e);
    }

    match data.knowledge.update(entity, &auth.0.subject).await {
        Ok(updated) => ApiResponse::ok(updated),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/knowledge/{id}",
    tag = "knowledge",
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found")
    ),
    security(("bearer" = []))
)]
#[delete("/{id}")]
pub async fn delete_knowledge(
    data: web::Data<ApiState>,
    path: web::Path<String>,
    _admin: AdminAuth,
) -> impl Responder {
    let id = path.into_inner();
    match data.knowledge.delete(&id).await {
        Ok(true) => ApiResponse::ok(json!({ "message": format!("Knowledge {id} deleted") })),
        Ok(false) => error_detail(
            StatusCode::NOT_FOUND,
            &format!("Knowledge entity {id} not found"),
        ),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/knowledge/",
    tag = "knowledge",
    responses((status = 200, description = "Entity list", body = [KnowledgeEntity]))
)]
#[get("/")]
pub async fn list_knowledge(
    data: web::Data<ApiState>,
    query: web::Query<ListQuery>,
    _auth: OptionalAuth,
) -> impl Responder {
    let classification = match query
        .classification
        .as_deref()
        .map(str::parse)
        .transpose()
    {
        Ok(classification) => classification,
        Err(e) => return from_error(&e),
    };

    let filter = EntityFilter {
        classification,
        category: query.category.clone(),
        is_active: query.is_active,
    };
    let (limit, offset) = query.paging();

    match data.knowledge.list(&filter, limit, offset).await {
        Ok(entities) => ApiResponse::ok(entities),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/knowledge/search",
    tag = "knowledge",
    responses(
        (status = 200, description = "Matching entities", body = [KnowledgeEntity]),
        (status = 400, description = "Empty query")
    )
)]
#[get("/search")]
pub async fn search_knowledge(
    data: web::Data<ApiState>,
    query: web::Query<SearchQuery>,
    _auth: OptionalAuth,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return error_detail(StatusCode::BAD_REQUEST, &validation_detail(&errors));
    }

    match data
        .knowledge
        .search(&query.query, query.include_operational)
        .await
    {
        Ok(entities) => ApiResponse::ok(entities),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/knowledge/foundational",
    tag = "knowledge",
    responses((status = 200, description = "Active foundational entities", body = [KnowledgeEntity]))
)]
#[get("/foundational")]
pub async fn list_foundational(data: web::Data<ApiState>, _auth: OptionalAuth) -> impl Responder {
    match data.knowledge.list_foundational(100).await {
        Ok(entities) => ApiResponse::ok(entities),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/knowledge/statistics",
    tag = "knowledge",
    responses((status = 200, description = "Aggregate counts", body = StatisticsResponse))
)]
#[get("/statistics")]
pub async fn get_statistics(data: web::Data<ApiState>, _auth: OptionalAuth) -> impl Responder {
    let knowledge_stats = match data.knowledge.statistics().await {
        Ok(stats) => stats,
        Err(e) => return from_error(&e),
    };

    match StatisticsResponse::build(&knowledge_stats, &data.store.query_stats()) {
        Ok(response) => ApiResponse::ok(response),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    get,
    path = "/api/knowledge/context",
    tag = "knowledge",
    responses((status = 200, description = "Pay-Ready business context"))
)]
#[get("/context")]
pub async fn get_context(data: web::Data<ApiState>, _auth: OptionalAuth) -> impl Responder {
    match data.knowledge.get_pay_ready_context().await {
        Ok(context) => ApiResponse::ok(context),
        Err(e) => from_error(&e),
    }
}

#[utoipa::path(
    post,
    path = "/api/knowledge/batch/create",
    tag = "knowledge",
    responses(
        (status = 200, description = "Per-index results", body = [BatchResult]),
        (status = 400, description = "Batch too large")
    ),
    security(("bearer" = []))
)]
#[post("/batch/create")]
pub async fn batch_create(
    data: web::Data<ApiState>,
    body: web::Json<Vec<KnowledgeCreateRequest>>,
    auth: RequiredAuth,
) -> impl Responder {
    let items = body.into_inner();
    if items.len() > MAX_BATCH_CREATE {
        return error_detail(
            StatusCode::BAD_REQUEST,
            &format!("Batch create is limited to {MAX_BATCH_CREATE} items"),
        );
    }

    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if let Err(errors) = item.validate() {
            results.push(BatchResult {
                index,
                success: false,
                id: None,
                error: Some(validation_detail(&errors)),
            });
            continue;
        }

        let outcome = match item.into_entity() {
            Ok(entity) => data.knowledge.create(entity, &auth.0.subject).await,
            Err(e) => Err(e),
        };

        results.push(match outcome {
            Ok(created) => BatchResult::ok(index, created.id),
            Err(e) => BatchResult::failed(index, None, &e),
        });
    }

    ApiResponse::ok(results)
}

#[utoipa::path(
    put,
    path = "/api/knowledge/batch/update",
    tag = "knowledge",
    responses(
        (status = 200, description = "Per-index results", body = [BatchResult]),
        (status = 400, description = "Batch too large")
    ),
    security(("bearer" = []))
)]
#[put("/batch/update")]
pub async fn batch_update(
    data: web::Data<ApiState>,
    body: web::Json<Vec<BatchUpdateItem>>,
    auth: RequiredAuth,
) -> impl Responder {
    let items = body.into_inner();
    if items.len() > MAX_BATCH_UPDATE {
        return error_detail(
            StatusCode::BAD_REQUEST,
            &format!("Batch update is limited to {MAX_BATCH_UPDATE} items"),
        );
    }

    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let outcome = apply_single_update(&data, &item, &auth.0.subject).await;
        results.push(match outcome {
            Ok(updated) => BatchResult::ok(index, updated.id),
            Err(e) => BatchResult::failed(index, Some(item.id), &e),
        });
    }

    ApiResponse::ok(results)
}

async fn apply_single_update(
    data: &web::Data<ApiState>,
    item: &BatchUpdateItem,
    changed_by: &str,
) -> knowledge_core_core::error::Result<KnowledgeEntity> {
    item.patch
        .validate()
        .map_err(|e| knowledge_core_core::error::Error::Validation(validation_detail(&e)))?;

    let mut entity = data.knowledge.get(&item.id).await?.ok_or_else(|| {
        knowledge_core_core::error::Error::NotFound(format!(
            "Knowledge entity {} not found",
            item.id
        ))
    })?;

    item.patch.apply_to(&mut entity)?;
    data.knowledge.update(entity, changed_by).await
}

#[utoipa::path(
    post,
    path = "/api/knowledge/batch/delete",
    tag = "knowledge",
    responses(
        (status = 200, description = "Per-id results", body = [BatchResult]),
        (status = 400, description = "Batch too large")
    ),
    security(("bearer" = []))
)]
#[post("/batch/delete")]
pub async fn batch_delete(
    data: web::Data<ApiState>,
    body: web::Json<BatchDeleteRequest>,
    _admin: AdminAuth,
) -> impl Responder {
    let ids = body.into_inner().ids;
    if ids.len() > MAX_BATCH_DELETE {
        return error_detail(
            StatusCode::BAD_REQUEST,
            &format!("Batch delete is limited to {MAX_BATCH_DELETE} ids"),
        );
    }

    let mut results = Vec::with_capacity(ids.len());
    for (index, id) in ids.into_iter().enumerate() {
        let outcome = data.knowledge.delete(&id).await;
        results.push(match outcome {
            Ok(true) => BatchResult::ok(index, id),
            Ok(false) => BatchResult {
                index,
                success: false,
                id: Some(id),
                error: Some("Not found".to_string()),
            },
            Err(e) => BatchResult::failed(index, Some(id), &e),
        });
    }

    ApiResponse::ok(results)
}
