#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use log::{debug, info};

use knowledge_core::bootstrap::{build_app, init_logger, shutdown};
use knowledge_core_api::{configure_app, ApiState, RateLimit};
use knowledge_core_core::config::load_app_config;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = load_app_config()
        .map_err(|e| anyhow::anyhow!("Failed to load application configuration: {e}"))?;

    init_logger(&config.log.level);
    debug!("Loaded conf: {config:?}");

    info!("Starting foundational knowledge server...");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log.level);

    let context = build_app(&config)
        .await
        .context("Failed to initialize application")?;

    context
        .scheduler
        .start()
        .await
        .context("Failed to start sync scheduler")?;

    let api_state = web::Data::new(ApiState::new(
        context.store.clone(),
        context.knowledge.clone(),
        context.sync.clone(),
        context.scheduler.clone(),
        config.api.clone(),
        config.rate_limit.clone(),
    ));

    let bind_address = format!("{}:{}", config.api.host, config.api.port);
    info!("Starting HTTP server at http://{bind_address}");

    let enable_docs = config.api.enable_docs;
    let cors_origins = config.api.cors_origins.clone();

    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);
        if cors_origins.iter().any(|origin| origin == "*") {
            cors = cors.allow_any_origin();
        } else {
            for origin in &cors_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        App::new()
            .app_data(api_state.clone())
            .wrap(RateLimit)
            .wrap(Logger::new("%a %{User-Agent}i %r %s %D"))
            .wrap(cors)
            .configure(|cfg| configure_app(cfg, enable_docs))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind to address {bind_address}"))?
    .run();

    let outcome = server.await;

    // The scheduler waits for an in-flight sync; the pool closes last
    shutdown(&context).await;

    outcome.map_err(|e| anyhow::anyhow!("HTTP server error: {e}"))
}
