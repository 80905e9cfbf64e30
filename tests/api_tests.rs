//! HTTP-level tests: route wiring, auth tiers, rate limit headers and the
//! response envelope, served by the real stack over in-memory sqlite.

mod common;

use actix_web::{test, web, App};
use serde_json::{json, Value as JsonValue};

use knowledge_core::bootstrap::AppContext;
use knowledge_core_api::{configure_app, ApiState, RateLimit};
use knowledge_core_core::config::{ApiConfig, RateLimitConfig};

async fn api_state(
    context: &AppContext,
    require_auth: bool,
    rate_limit: RateLimitConfig,
) -> web::Data<ApiState> {
    let config = common::test_config();
    let api_config = ApiConfig {
        require_auth,
        ..config.api
    };

    web::Data::new(ApiState::new(
        context.store.clone(),
        context.knowledge.clone(),
        context.sync.clone(),
        context.scheduler.clone(),
        api_config,
        rate_limit,
    ))
}

fn disabled_rate_limit() -> RateLimitConfig {
    RateLimitConfig {
        enabled: false,
        ..RateLimitConfig::default()
    }
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(RateLimit)
                .configure(|cfg| configure_app(cfg, false)),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_endpoints() {
    let context = common::build_test_app().await;
    let state = api_state(&context, false, disabled_rate_limit()).await;
    let app = test_app!(state);

    let response = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert!(response.status().is_success());
    let body: JsonValue = test::read_body_json(response).await;
    assert_eq!(body["status"], json!("ok"));

    let response = test::call_service(
        &app,
        test::TestRequest::get().uri("/health/ready").to_request(),
    )
    .await;
    assert!(response.status().is_success());
    let body: JsonValue = test::read_body_json(response).await;
    assert_eq!(body["ready"], json!(true));
}

#[actix_web::test]
async fn test_create_and_get_round_trip() {
    let context = common::build_test_app().await;
    let state = api_state(&context, false, disabled_rate_limit()).await;
    let app = test_app!(state);

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/knowledge/")
            .set_json(json!({
                "name": "Pay Ready Mission",
                "category": "company_overview",
                "content": {
                    "mission": "AI-first resident engagement platform",
                    "scale": "$20B+",
                }
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: JsonValue = test::read_body_json(response).await;
    assert_eq!(body["status"], json!("success"));
    assert_eq!(body["data"]["classification"], json!("foundational"));
    assert!(body["data"]["priority"].as_i64().unwrap() >= 4);
    assert_eq!(body["data"]["is_foundational"], json!(true));
    assert_eq!(body["data"]["version"], json!(1));
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/knowledge/{id}"))
            .to_request(),
    )
    .await;
    assert!(response.status().is_success());
    let body: JsonValue = test::read_body_json(response).await;
    assert_eq!(body["data"]["id"], json!(id));

    // Version log over HTTP
    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/knowledge/{id}/versions"))
            .to_request(),
    )
    .await;
    assert!(response.status().is_success());
    let body: JsonValue = test::read_body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["version_number"], json!(1));

    // Unknown ids surface as a detail body
    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/knowledge/missing-id")
            .to_request(),
    )
    .await;
    assert_eq!(response.status().as_u16(), 404);
    let body: JsonValue = test::read_body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("missing-id"));
}

#[actix_web::test]
async fn test_validation_rejects_bad_payload() {
    let context = common::build_test_app().await;
    let state = api_state(&context, false, disabled_rate_limit()).await;
    let app = test_app!(state);

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/knowledge/")
            .set_json(json!({
                "name": "",
                "category": "general",
                "content": {}
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: JsonValue = test::read_body_json(response).await;
    assert!(body["detail"].is_string());
}

#[actix_web::test]
async fn test_admin_tier_enforced() {
    let context = common::build_test_app().await;
    let state = api_state(&context, true, disabled_rate_limit()).await;
    let app = test_app!(state);

    // No credentials at all
    let response = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/knowledge/some-id")
            .to_request(),
    )
    .await;
    assert_eq!(response.status().as_u16(), 401);

    // A valid request bearer is not an admin bearer
    let token = knowledge_core_api::jwt::create_token("user1", "test-secret", 3600).unwrap();
    let response = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/knowledge/some-id")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request(),
    )
    .await;
    assert_eq!(response.status().as_u16(), 403);

    // The admin key reaches the handler (404: nothing to delete)
    let response = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/knowledge/some-id")
            .insert_header(("Authorization", "Bearer admin-key"))
            .to_request(),
    )
    .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[actix_web::test]
async fn test_rate_limit_returns_429_with_headers() {
    let context = common::build_test_app().await;
    let rate_limit = RateLimitConfig {
        enabled: true,
        requests_per_minute: 2,
        max_concurrent_requests: 1000,
        endpoint_limits: Vec::new(),
    };
    let state = api_state(&context, false, rate_limit).await;
    let app = test_app!(state);

    for expected_remaining in [1, 0] {
        let response =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert!(response.status().is_success());
        assert_eq!(
            response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok()),
            Some(expected_remaining.to_string().as_str())
        );
        assert_eq!(
            response
                .headers()
                .get("x-ratelimit-window")
                .and_then(|v| v.to_str().ok()),
            Some("60")
        );
    }

    let response =
        test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(response.status().as_u16(), 429);
    assert_eq!(
        response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok()),
        Some("0")
    );
    let retry_after: i64 = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap();
    assert!(retry_after >= 1);

    let body: JsonValue = test::read_body_json(response).await;
    assert_eq!(body["detail"], json!("Rate limit exceeded"));
    assert_eq!(body["limit"], json!(2));
}

#[actix_web::test]
async fn test_batch_create_reports_per_index_results() {
    let context = common::build_test_app().await;
    let state = api_state(&context, false, disabled_rate_limit()).await;
    let app = test_app!(state);

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/knowledge/batch/create")
            .set_json(json!([
                {
                    "name": "Entry one",
                    "category": "reports",
                    "content": {"a": 1}
                },
                {
                    "name": "",
                    "category": "reports",
                    "content": {}
                }
            ]))
            .to_request(),
    )
    .await;
    assert!(response.status().is_success());
    let body: JsonValue = test::read_body_json(response).await;
    let results = body["data"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["success"], json!(true));
    assert!(results[0]["id"].is_string());
    assert_eq!(results[1]["success"], json!(false));
}

#[actix_web::test]
async fn test_sync_status_endpoint() {
    let context = common::build_test_app().await;
    let state = api_state(&context, false, disabled_rate_limit()).await;
    let app = test_app!(state);

    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/knowledge/sync/status")
            .to_request(),
    )
    .await;
    assert!(response.status().is_success());
    let body: JsonValue = test::read_body_json(response).await;
    assert_eq!(body["data"]["sync_health"], json!("healthy"));
    assert_eq!(body["data"]["consecutive_failures"], json!(0));
}
