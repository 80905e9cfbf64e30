#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod api;
pub mod app;
pub mod cache;
pub mod database;
pub mod loader;
pub mod log;
pub mod rate_limit;
pub mod sync;

pub use api::ApiConfig;
pub use app::AppConfig;
pub use cache::CacheConfig;
pub use database::{DatabaseBackend, DatabaseConfig};
pub use loader::load_app_config;
pub use log::LogConfig;
pub use rate_limit::RateLimitConfig;
pub use sync::{SyncConfig, SyncTableConfig};
