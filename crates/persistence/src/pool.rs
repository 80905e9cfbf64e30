#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use log::{info, warn};
use serde::Serialize;
use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::Mutex as AsyncMutex;

use knowledge_core_core::config::{DatabaseBackend, DatabaseConfig};
use knowledge_core_core::error::{Error, Result};

/// How many recent slow queries to retain
const SLOW_QUERY_CAPACITY: usize = 100;

/// A query slower than this is recorded
const SLOW_QUERY_THRESHOLD: Duration = Duration::from_secs(1);

/// Retry schedule for transient failures on the networked backend: the
/// initial attempt plus three retries at 1s, 2s and 4s
const RETRY_BACKOFF_SECS: [u64; 3] = [1, 2, 4];
const MAX_ATTEMPTS: usize = 4;

/// One recorded slow query
#[derive(Debug, Clone, Serialize)]
pub struct SlowQuery {
    /// First 100 chars of the statement
    pub query: String,
    pub duration_ms: u128,
    pub recorded_at: String,
}

#[derive(Debug, Default)]
struct QueryStats {
    total_queries: u64,
    total_time: Duration,
    slow_queries: VecDeque<SlowQuery>,
}

/// Point-in-time view of the query statistics
#[derive(Debug, Clone, Serialize)]
pub struct QueryStatsSnapshot {
    pub total_queries: u64,
    pub total_time_ms: u128,
    pub slow_queries: Vec<SlowQuery>,
}

/// Shared database handle: the connection pool, the backend kind, query
/// statistics and the process-wide write lock that serializes entity
/// mutations.
#[derive(Clone)]
pub struct Store {
    pool: AnyPool,
    backend: DatabaseBackend,
    stats: Arc<Mutex<QueryStats>>,
    write_lock: Arc<AsyncMutex<()>>,
}

impl Store {
    /// Connect to the configured backend.
    ///
    /// The embedded backend runs on a single pooled connection; the networked
    /// backend gets the full bounded pool with pre-acquire health checks and
    /// hourly connection recycling.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be established
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        install_default_drivers();

        let backend = config.backend();
        let (min, max) = match backend {
            DatabaseBackend::Embedded => (1, 1),
            DatabaseBackend::Networked => (config.min_connections, config.max_connections),
        };

        info!("Connecting to database ({backend:?}, pool {min}-{max})...");

        let pool = AnyPoolOptions::new()
            .min_connections(min)
            .max_connections(max)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .max_lifetime(Duration::from_secs(config.max_lifetime))
            .test_before_acquire(true)
            .connect(&config.connection_string)
            .await
            .map_err(Error::Database)?;

        Ok(Self {
            pool,
            backend,
            stats: Arc::new(Mutex::new(QueryStats::default())),
            write_lock: Arc::new(AsyncMutex::new(())),
        })
    }

    #[must_use]
    pub const fn pool(&self) -> &AnyPool {
        &self.pool
    }

    #[must_use]
    pub const fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    /// Acquire the process-wide write lock. Held for the duration of every
    /// entity mutation so writers to a single id are serialized.
    pub async fn write_guard(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Liveness probe used by the readiness endpoint.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable
    pub async fn ping(&self) -> Result<()> {
        self.run("SELECT 1", |pool| async move {
            sqlx::query("SELECT 1").execute(&pool).await.map(|_| ())
        })
        .await
    }

    /// Close the pool. Called last during shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Execute a database operation with query accounting and, on the
    /// networked backend, retry with exponential backoff for transient
    /// failures. Constraint violations and other non-transient errors are
    /// returned immediately.
    ///
    /// # Errors
    /// Returns the final database error once retries are exhausted
    pub async fn run<T, F, Fut>(&self, sql: &str, op: F) -> Result<T>
    where
        F: Fn(AnyPool) -> Fut + Send + Sync,
        Fut: Future<Output = std::result::Result<T, sqlx::Error>> + Send,
        T: Send,
    {
        let max_attempts = match self.backend {
            DatabaseBackend::Networked => MAX_ATTEMPTS,
            DatabaseBackend::Embedded => 1,
        };

        let mut attempt = 1_usize;
        loop {
            let started = Instant::now();
            let outcome = op(self.pool.clone()).await;
            self.record(sql, started.elapsed());

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) && attempt < max_attempts => {
                    let backoff = RETRY_BACKOFF_SECS
                        .get(attempt - 1)
                        .copied()
                        .unwrap_or(4);
                    warn!(
                        "Query failed (attempt {attempt}/{max_attempts}), retrying in {backoff}s: {e}"
                    );
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    attempt += 1;
                }
                Err(e) => return Err(Error::Database(e)),
            }
        }
    }

    fn record(&self, sql: &str, elapsed: Duration) {
        let Ok(mut stats) = self.stats.lock() else {
            return;
        };
        stats.total_queries += 1;
        stats.total_time += elapsed;

        if elapsed > SLOW_QUERY_THRESHOLD {
            if stats.slow_queries.len() == SLOW_QUERY_CAPACITY {
                stats.slow_queries.pop_front();
            }
            stats.slow_queries.push_back(SlowQuery {
                query: sql.chars().take(100).collect(),
                duration_ms: elapsed.as_millis(),
                recorded_at: OffsetDateTime::now_utc()
                    .format(&Rfc3339)
                    .unwrap_or_default(),
            });
        }
    }

    /// Current query statistics.
    #[must_use]
    pub fn query_stats(&self) -> QueryStatsSnapshot {
        self.stats.lock().map_or(
            QueryStatsSnapshot {
                total_queries: 0,
                total_time_ms: 0,
                slow_queries: Vec::new(),
            },
            |stats| QueryStatsSnapshot {
                total_queries: stats.total_queries,
                total_time_ms: stats.total_time.as_millis(),
                slow_queries: stats.slow_queries.iter().cloned().collect(),
            },
        )
    }
}

const fn is_transient(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
    )
}
