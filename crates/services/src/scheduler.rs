#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

//! Background scheduler for remote synchronization: incremental syncs on an
//! interval, full syncs on a cron expression, daily history cleanup. One
//! dedicated task computes the earliest next fire time and sleeps until it;
//! single-flight and pausing are internal state, not external locks.

use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::sync::SyncRunner;
use knowledge_core_core::config::SyncConfig;
use knowledge_core_core::error::{Error, Result};
use knowledge_core_core::knowledge::{SyncKind, SyncOperation, SyncStatus};
use knowledge_core_core::utils::{next_cron_fire, validate_cron};

/// Misfire grace for the incremental job
const INCREMENTAL_GRACE: time::Duration = time::Duration::seconds(300);
/// Misfire grace for the full job
const FULL_GRACE: time::Duration = time::Duration::seconds(3600);
/// How often history cleanup runs
const CLEANUP_INTERVAL: time::Duration = time::Duration::hours(24);
/// Persisted and in-memory history retention
const HISTORY_RETENTION: time::Duration = time::Duration::days(7);
/// In-memory history cap
const MAX_HISTORY_ENTRIES: usize = 100;

/// Derived scheduler health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncHealth {
    Healthy,
    Degraded,
    Critical,
}

/// Scheduler-level view of one sync run
#[derive(Debug, Clone, Serialize)]
pub struct SyncRunSummary {
    pub kind: SyncKind,
    pub status: SyncStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub completed_at: OffsetDateTime,
    pub duration_seconds: f64,
    pub records_synced: i64,
    pub conflicts_detected: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status payload for the sync status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub current_status: SyncStatus,
    pub sync_health: SyncHealth,
    pub consecutive_failures: u32,
    pub last_sync_time: Option<String>,
    pub last_sync_result: Option<SyncRunSummary>,
    pub auto_sync_enabled: bool,
    pub incremental_interval_minutes: u64,
    pub full_sync_schedule: String,
    pub history_count: usize,
    pub paused: bool,
}

struct SchedulerState {
    current_status: SyncStatus,
    last_sync_time: Option<OffsetDateTime>,
    sync_history: VecDeque<SyncRunSummary>,
    consecutive_failures: u32,
    paused: bool,
    running: bool,
}

impl SchedulerState {
    const fn new() -> Self {
        Self {
            current_status: SyncStatus::Pending,
            last_sync_time: None,
            sync_history: VecDeque::new(),
            consecutive_failures: 0,
            paused: false,
            running: false,
        }
    }
}

/// Scheduled synchronization with failure tracking and a circuit breaker:
/// after `max_consecutive_failures` failed runs the scheduled jobs pause
/// until `resume` is called.
pub struct SyncScheduler {
    runner: Arc<dyn SyncRunner>,
    config: SyncConfig,
    state: Mutex<SchedulerState>,
    shutdown: Notify,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyncScheduler {
    #[must_use]
    pub fn new(runner: Arc<dyn SyncRunner>, config: SyncConfig) -> Self {
        Self {
            runner,
            config,
            state: Mutex::new(SchedulerState::new()),
            shutdown: Notify::new(),
            handle: Mutex::new(None),
        }
    }

    /// Run the initial sync and start the task loop.
    ///
    /// # Errors
    /// Returns a validation error when the full-sync cron expression is
    /// invalid; a failing initial sync is recorded but does not abort startup
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        if !self.config.auto_sync_enabled {
            info!("Auto-sync is disabled. Scheduler will not start.");
            return Ok(());
        }

        validate_cron(&self.config.full_sync_cron)?;

        self.run_initial_sync().await;

        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move { scheduler.task_loop().await });
        if let Ok(mut slot) = self.handle.lock() {
            *slot = Some(handle);
        }

        info!(
            "Sync scheduler started. Incremental: every {} minutes, Full: {}",
            self.config.incremental_interval_minutes, self.config.full_sync_cron
        );
        Ok(())
    }

    /// Stop the loop, waiting for an in-flight sync to finish.
    pub async fn shutdown(&self) {
        self.shutdown.notify_waiters();
        let handle = self.handle.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Scheduler task ended abnormally: {e}");
            }
        }
        info!("Sync scheduler shut down");
    }

    async fn task_loop(&self) {
        let interval = time::Duration::minutes(
            i64::try_from(self.config.incremental_interval_minutes).unwrap_or(60),
        );

        let now = OffsetDateTime::now_utc();
        let mut next_incremental = now + interval;
        let mut next_full = next_cron_fire(&self.config.full_sync_cron, now)
            .ok()
            .flatten();
        let mut next_cleanup = now + CLEANUP_INTERVAL;

        loop {
            let now = OffsetDateTime::now_utc();
            let mut next_event = next_incremental.min(next_cleanup);
            if let Some(full) = next_full {
                next_event = next_event.min(full);
            }

            let sleep_for = (next_event - now).max(time::Duration::ZERO);
            let sleep_for =
                Duration::try_from(sleep_for).unwrap_or_else(|_| Duration::from_secs(1));

            tokio::select! {
                () = self.shutdown.notified() => break,
                () = tokio::time::sleep(sleep_for) => {}
            }

            let now = OffsetDateTime::now_utc();

            if next_incremental <= now {
                if within_grace(next_incremental, now, INCREMENTAL_GRACE) {
                    self.run_scheduled(SyncKind::IncrementalSync).await;
                } else {
                    warn!("Missed incremental sync past its grace window; skipping");
                }
                next_incremental = OffsetDateTime::now_utc() + interval;
            }

            if let Some(full) = next_full {
                if full <= now {
                    if within_grace(full, now, FULL_GRACE) {
                        self.run_scheduled(SyncKind::FullSync).await;
                    } else {
                        warn!("Missed full sync past its grace window; skipping");
                    }
                    next_full = next_cron_fire(&self.config.full_sync_cron, OffsetDateTime::now_utc())
                        .ok()
                        .flatten();
                }
            }

            if next_cleanup <= now {
                self.run_cleanup().await;
                next_cleanup = OffsetDateTime::now_utc() + CLEANUP_INTERVAL;
            }
        }
    }

    /// On startup: full sync into an empty store, incremental otherwise.
    async fn run_initial_sync(&self) {
        match self.runner.local_entry_count().await {
            Ok(0) => {
                info!("Empty knowledge base detected, running full sync");
                let _ = self.run_sync(SyncKind::FullSync).await;
            }
            Ok(_) => {
                info!("Existing data found, running incremental sync");
                let _ = self.run_sync(SyncKind::IncrementalSync).await;
            }
            Err(e) => warn!("Could not determine entry count for initial sync: {e}"),
        }
    }

    async fn run_scheduled(&self, kind: SyncKind) {
        let paused = self.state.lock().map(|s| s.paused).unwrap_or(false);
        if paused {
            debug!("Scheduler paused; skipping {kind}");
            return;
        }
        let _ = self.run_sync(kind).await;
    }

    /// Execute one sync run under single-flight, recording the outcome and
    /// driving the failure counter / circuit breaker.
    ///
    /// # Errors
    /// Returns `Conflict` when a sync is already in progress
    pub async fn run_sync(&self, kind: SyncKind) -> Result<SyncRunSummary> {
        let last_sync_time = {
            let Ok(mut state) = self.state.lock() else {
                return Err(Error::Scheduler("Scheduler state poisoned".to_string()));
            };
            if state.running {
                info!("Sync already in progress, skipping {kind}");
                return Err(Error::Conflict("Sync already in progress".to_string()));
            }
            state.running = true;
            state.current_status = SyncStatus::InProgress;
            state.last_sync_time
        };

        let started = OffsetDateTime::now_utc();
        info!("Starting {kind}");

        let result = match kind {
            SyncKind::FullSync => self.runner.run_full().await,
            SyncKind::IncrementalSync | SyncKind::ManualSync => {
                let since = match self.runner.last_sync_time().await {
                    Ok(Some(t)) => Some(t),
                    _ => Some(last_sync_time.unwrap_or(started - time::Duration::hours(1))),
                };
                self.runner.run_incremental(since).await
            }
        };

        let completed = OffsetDateTime::now_utc();
        let summary = match result {
            Ok(operation) => summarize(kind, started, completed, &operation),
            Err(e) => SyncRunSummary {
                kind,
                status: SyncStatus::Failed,
                started_at: started,
                completed_at: completed,
                duration_seconds: (completed - started).as_seconds_f64(),
                records_synced: 0,
                conflicts_detected: 0,
                error: Some(e.to_string()),
            },
        };

        self.record_outcome(&summary);
        Ok(summary)
    }

    fn record_outcome(&self, summary: &SyncRunSummary) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        state.running = false;
        state.current_status = summary.status;

        if matches!(summary.status, SyncStatus::Failed | SyncStatus::Partial) {
            state.consecutive_failures += 1;
            if state.consecutive_failures >= self.config.max_consecutive_failures {
                state.paused = true;
                error!(
                    "Critical sync failure: {} consecutive failures. Scheduled syncs paused; manual resume required.",
                    state.consecutive_failures
                );
            }
        } else {
            state.consecutive_failures = 0;
            state.last_sync_time = Some(summary.completed_at);
        }

        if state.sync_history.len() == MAX_HISTORY_ENTRIES {
            state.sync_history.pop_front();
        }
        state.sync_history.push_back(summary.clone());
    }

    async fn run_cleanup(&self) {
        let cutoff = OffsetDateTime::now_utc() - HISTORY_RETENTION;

        match self.runner.cleanup_history(cutoff).await {
            Ok(removed) => debug!("Sync history cleanup removed {removed} persisted entries"),
            Err(e) => warn!("Sync history cleanup failed: {e}"),
        }

        if let Ok(mut state) = self.state.lock() {
            state.sync_history.retain(|entry| entry.started_at > cutoff);
            debug!(
                "Cleaned up sync history, {} entries remaining",
                state.sync_history.len()
            );
        }
    }

    /// Manually trigger a sync; fails with `Conflict` while one is running.
    ///
    /// # Errors
    /// Returns `Conflict` when a sync is already in progress
    pub async fn trigger_manual(&self, kind: SyncKind) -> Result<SyncRunSummary> {
        self.run_sync(kind).await
    }

    /// Re-enable the paused jobs and clear the failure counter.
    pub fn resume(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.paused = false;
            state.consecutive_failures = 0;
        }
        info!("Sync scheduler resumed");
    }

    /// Current status including derived health.
    #[must_use]
    pub fn status(&self) -> SchedulerStatus {
        let Ok(state) = self.state.lock() else {
            return SchedulerStatus {
                current_status: SyncStatus::Failed,
                sync_health: SyncHealth::Critical,
                consecutive_failures: 0,
                last_sync_time: None,
                last_sync_result: None,
                auto_sync_enabled: self.config.auto_sync_enabled,
                incremental_interval_minutes: self.config.incremental_interval_minutes,
                full_sync_schedule: self.config.full_sync_cron.clone(),
                history_count: 0,
                paused: false,
            };
        };

        let sync_health = if state.consecutive_failures == 0 {
            SyncHealth::Healthy
        } else if state.consecutive_failures < self.config.max_consecutive_failures {
            SyncHealth::Degraded
        } else {
            SyncHealth::Critical
        };

        SchedulerStatus {
            current_status: state.current_status,
            sync_health,
            consecutive_failures: state.consecutive_failures,
            last_sync_time: state.last_sync_time.map(|t| {
                t.format(&time::format_description::well_known::Rfc3339)
                    .unwrap_or_default()
            }),
            last_sync_result: state.sync_history.back().cloned(),
            auto_sync_enabled: self.config.auto_sync_enabled,
            incremental_interval_minutes: self.config.incremental_interval_minutes,
            full_sync_schedule: self.config.full_sync_cron.clone(),
            history_count: state.sync_history.len(),
            paused: state.paused,
        }
    }

    /// Most recent runs, newest first.
    #[must_use]
    pub fn history(&self, limit: usize) -> Vec<SyncRunSummary> {
        self.state.lock().map_or_else(
            |_| Vec::new(),
            |state| state.sync_history.iter().rev().take(limit).cloned().collect(),
        )
    }
}

fn summarize(
    kind: SyncKind,
    started: OffsetDateTime,
    completed: OffsetDateTime,
    operation: &SyncOperation,
) -> SyncRunSummary {
    SyncRunSummary {
        kind,
        status: operation.status,
        started_at: started,
        completed_at: completed,
        duration_seconds: (completed - started).as_seconds_f64(),
        records_synced: operation.records_processed,
        conflicts_detected: operation.conflicts_detected,
        error: operation.error_details.as_ref().map(ToString::to_string),
    }
}

/// A missed trigger still runs when it is within its grace window.
fn within_grace(scheduled: OffsetDateTime, now: OffsetDateTime, grace: time::Duration) -> bool {
    now - scheduled <= grace
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Hand-rolled stub: scripted outcomes, optional artificial latency
    struct StubRunner {
        outcomes: Mutex<VecDeque<SyncOperation>>,
        delay: Option<Duration>,
        full_calls: AtomicU32,
        incremental_calls: AtomicU32,
        entry_count: i64,
    }

    impl StubRunner {
        fn new(outcomes: Vec<SyncOperation>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                delay: None,
                full_calls: AtomicU32::new(0),
                incremental_calls: AtomicU32::new(0),
                entry_count: 1,
            }
        }

        fn next_outcome(&self, kind: SyncKind) -> SyncOperation {
            self.outcomes
                .lock()
                .ok()
                .and_then(|mut q| q.pop_front())
                .unwrap_or_else(|| {
                    let mut op = SyncOperation::new(kind, "airtable");
                    op.complete(0, 0, &[]);
                    op
                })
        }
    }

    #[async_trait]
    impl SyncRunner for StubRunner {
        async fn run_full(&self) -> Result<SyncOperation> {
            self.full_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.next_outcome(SyncKind::FullSync))
        }

        async fn run_incremental(&self, _since: Option<OffsetDateTime>) -> Result<SyncOperation> {
            self.incremental_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.next_outcome(SyncKind::IncrementalSync))
        }

        async fn last_sync_time(&self) -> Result<Option<OffsetDateTime>> {
            Ok(None)
        }

        async fn local_entry_count(&self) -> Result<i64> {
            Ok(self.entry_count)
        }

        async fn cleanup_history(&self, _cutoff: OffsetDateTime) -> Result<u64> {
            Ok(0)
        }
    }

    fn failed_op() -> SyncOperation {
        let mut op = SyncOperation::new(SyncKind::IncrementalSync, "airtable");
        op.fail("remote returned 503");
        op
    }

    fn completed_op(records: i64) -> SyncOperation {
        let mut op = SyncOperation::new(SyncKind::IncrementalSync, "airtable");
        op.complete(records, 0, &[]);
        op
    }

    fn scheduler_with(runner: StubRunner) -> Arc<SyncScheduler> {
        Arc::new(SyncScheduler::new(Arc::new(runner), SyncConfig::default()))
    }

    #[tokio::test]
    async fn test_success_resets_failure_counter() {
        let scheduler = scheduler_with(StubRunner::new(vec![failed_op(), completed_op(4)]));

        scheduler.run_sync(SyncKind::IncrementalSync).await.unwrap();
        assert_eq!(scheduler.status().sync_health, SyncHealth::Degraded);
        assert_eq!(scheduler.status().consecutive_failures, 1);

        scheduler.run_sync(SyncKind::IncrementalSync).await.unwrap();
        let status = scheduler.status();
        assert_eq!(status.sync_health, SyncHealth::Healthy);
        assert_eq!(status.consecutive_failures, 0);
        assert!(status.last_sync_time.is_some());
    }

    #[tokio::test]
    async fn test_circuit_break_after_three_failures_and_resume() {
        let scheduler = scheduler_with(StubRunner::new(vec![
            failed_op(),
            failed_op(),
            failed_op(),
        ]));

        for _ in 0..3 {
            scheduler.run_sync(SyncKind::IncrementalSync).await.unwrap();
        }

        let status = scheduler.status();
        assert_eq!(status.sync_health, SyncHealth::Critical);
        assert!(status.paused);

        // Paused scheduler skips scheduled runs entirely
        scheduler.run_scheduled(SyncKind::IncrementalSync).await;
        assert_eq!(scheduler.status().consecutive_failures, 3);

        scheduler.resume();
        let status = scheduler.status();
        assert_eq!(status.sync_health, SyncHealth::Healthy);
        assert!(!status.paused);
        assert_eq!(status.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_single_flight_rejects_concurrent_runs() {
        let mut runner = StubRunner::new(vec![completed_op(1)]);
        runner.delay = Some(Duration::from_millis(300));
        let scheduler = scheduler_with(runner);

        let first = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run_sync(SyncKind::FullSync).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = scheduler.run_sync(SyncKind::IncrementalSync).await;
        assert!(matches!(second, Err(Error::Conflict(_))));

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.status, SyncStatus::Completed);
    }

    #[tokio::test]
    async fn test_partial_counts_as_failure() {
        let mut op = SyncOperation::new(SyncKind::FullSync, "airtable");
        op.complete(5, 0, &["row rec1 failed".to_string()]);
        let scheduler = scheduler_with(StubRunner::new(vec![op]));

        scheduler.run_sync(SyncKind::FullSync).await.unwrap();
        assert_eq!(scheduler.status().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_initial_sync_chooses_by_entry_count() {
        let mut empty = StubRunner::new(vec![completed_op(0)]);
        empty.entry_count = 0;
        let scheduler = scheduler_with(empty);
        scheduler.run_initial_sync().await;
        let history = scheduler.history(10);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, SyncKind::FullSync);

        let populated = StubRunner::new(vec![completed_op(2)]);
        let scheduler = scheduler_with(populated);
        scheduler.run_initial_sync().await;
        let history = scheduler.history(10);
        assert_eq!(history[0].kind, SyncKind::IncrementalSync);
    }

    #[tokio::test]
    async fn test_history_is_bounded_and_newest_first() {
        let scheduler = scheduler_with(StubRunner::new(Vec::new()));
        for _ in 0..105 {
            scheduler.run_sync(SyncKind::IncrementalSync).await.unwrap();
        }
        assert_eq!(scheduler.status().history_count, 100);
        let recent = scheduler.history(5);
        assert_eq!(recent.len(), 5);
    }

    #[test]
    fn test_within_grace() {
        let scheduled = OffsetDateTime::now_utc();
        assert!(within_grace(
            scheduled,
            scheduled + time::Duration::seconds(200),
            INCREMENTAL_GRACE
        ));
        assert!(!within_grace(
            scheduled,
            scheduled + time::Duration::seconds(400),
            INCREMENTAL_GRACE
        ));
    }
}
