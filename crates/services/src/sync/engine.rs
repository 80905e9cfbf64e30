#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::Arc;
use time::OffsetDateTime;

use crate::knowledge::KnowledgeService;
use crate::sync::client::{AirtableClient, AirtableRecord};
use crate::sync::translate::{
    entity_to_fields, record_to_entity, remote_modified, table_for_classification, REMOTE_SOURCE,
};
use knowledge_core_core::config::SyncConfig;
use knowledge_core_core::error::{Error, Result};
use knowledge_core_core::knowledge::{
    KnowledgeClassification, KnowledgeEntity, ResolutionStrategy, SyncConflict, SyncKind,
    SyncOperation,
};
use knowledge_core_persistence::SyncRepositoryTrait;

/// What happened to one remote record during a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Conflicted,
}

/// The scheduler's view of the sync engine. Behind a trait so scheduler
/// behavior is testable without a remote system.
#[async_trait]
pub trait SyncRunner: Send + Sync {
    /// Run a full sync of every configured table
    ///
    /// # Errors
    /// Returns an error only for infrastructure failures; per-record and
    /// per-table errors are recorded on the returned operation
    async fn run_full(&self) -> Result<SyncOperation>;

    /// Run an incremental sync of rows modified after `since`
    ///
    /// # Errors
    /// As `run_full`
    async fn run_incremental(&self, since: Option<OffsetDateTime>) -> Result<SyncOperation>;

    /// Completion time of the last successful sync
    ///
    /// # Errors
    /// Returns an error if the sync history cannot be read
    async fn last_sync_time(&self) -> Result<Option<OffsetDateTime>>;

    /// How many entities exist locally (drives the initial-sync decision)
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    async fn local_entry_count(&self) -> Result<i64>;

    /// Drop persisted sync history older than the cutoff
    ///
    /// # Errors
    /// Returns an error if the store cannot be written
    async fn cleanup_history(&self, cutoff: OffsetDateTime) -> Result<u64>;
}

/// Synchronizes the local knowledge base with the Airtable CEO knowledge
/// base. Reads and writes go through the knowledge service so cache and
/// versioning stay consistent.
pub struct AirtableSyncService {
    client: Option<AirtableClient>,
    config: SyncConfig,
    manager: Arc<KnowledgeService>,
    sync_repository: Arc<dyn SyncRepositoryTrait>,
    strategy: ResolutionStrategy,
}

impl AirtableSyncService {
    #[must_use]
    pub fn new(
        config: SyncConfig,
        manager: Arc<KnowledgeService>,
        sync_repository: Arc<dyn SyncRepositoryTrait>,
    ) -> Self {
        let client = if config.api_key.is_some() {
            match AirtableClient::new(&config) {
                Ok(client) => {
                    info!("Airtable sync service initialized");
                    Some(client)
                }
                Err(e) => {
                    warn!("Airtable client unavailable: {e}");
                    None
                }
            }
        } else {
            warn!("Airtable API key not set; remote sync disabled");
            None
        };

        Self {
            client,
            config,
            manager,
            sync_repository,
            strategy: ResolutionStrategy::Auto,
        }
    }

    /// Override the conflict resolution strategy (default `auto`).
    #[must_use]
    pub const fn with_strategy(mut self, strategy: ResolutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    async fn run(&self, kind: SyncKind, since: Option<OffsetDateTime>) -> Result<SyncOperation> {
        let mut operation = SyncOperation::new(kind, REMOTE_SOURCE);
        self.sync_repository.create_operation(&operation).await?;

        let Some(client) = &self.client else {
            operation.fail("Airtable client not configured");
            self.sync_repository.update_operation(&operation).await?;
            return Ok(operation);
        };

        let mut records_processed = 0_i64;
        let mut conflicts_detected = 0_i64;
        let mut errors: Vec<String> = Vec::new();

        for table in &self.config.tables {
            match client.list_records(&table.name).await {
                Ok(records) => {
                    let mut synced = 0_usize;
                    for record in records {
                        if let Some(since) = since {
                            if remote_modified(&record).is_some_and(|modified| modified <= since) {
                                continue;
                            }
                        }

                        match self
                            .sync_record(&record, table.classification, &operation.id)
                            .await
                        {
                            Ok(outcome) => {
                                records_processed += 1;
                                synced += 1;
                                if outcome == SyncOutcome::Conflicted {
                                    conflicts_detected += 1;
                                }
                            }
                            Err(e) => {
                                error!("Error syncing record {} from {}: {e}", record.id, table.name);
                                errors.push(format!("{} ({}): {e}", record.id, table.name));
                            }
                        }
                    }
                    info!("Synced {synced} records from {}", table.name);
                }
                Err(e) => {
                    error!("Error syncing table {}: {e}", table.name);
                    errors.push(format!("table {}: {e}", table.name));
                }
            }
        }

        operation.complete(records_processed, conflicts_detected, &errors);
        self.sync_repository.update_operation(&operation).await?;

        info!(
            "{kind} completed: {records_processed} records, {conflicts_detected} conflicts, {} errors",
            errors.len()
        );
        Ok(operation)
    }

    /// Sync one remote record: create it locally, update the local copy, or
    /// detect and resolve a conflict when local is newer.
    async fn sync_record(
        &self,
        record: &AirtableRecord,
        classification: KnowledgeClassification,
        operation_id: &str,
    ) -> Result<SyncOutcome> {
        let remote_entity = record_to_entity(record, classification);

        let Some(local) = self.manager.get(&remote_entity.id).await? else {
            self.manager.create(remote_entity, "sync").await?;
            return Ok(SyncOutcome::Created);
        };

        if local.updated_at > remote_entity.updated_at {
            // Local is newer; record the divergence and resolve by policy
            let mut conflict = SyncConflict::detect(operation_id, &local, &remote_entity)?;
            self.sync_repository.create_conflict(&conflict).await?;

            self.manager
                .handle_sync_conflict(&mut conflict, self.strategy)
                .await?;
            self.sync_repository.update_conflict(&conflict).await?;
            return Ok(SyncOutcome::Conflicted);
        }

        let mut entity = remote_entity;
        entity.synced_at = Some(OffsetDateTime::now_utc());
        entity.version = local.version;
        self.manager.update(entity, "sync").await?;
        Ok(SyncOutcome::Updated)
    }

    /// Push a local entity to its remote table, capturing the remote id of a
    /// newly created row into `source_id`.
    ///
    /// # Errors
    /// Returns an error if the remote call or the follow-up persist fails
    pub async fn push_to_airtable(&self, entity: &KnowledgeEntity) -> Result<KnowledgeEntity> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| Error::Config("Airtable client not configured".to_string()))?;

        let table = table_for_classification(entity.classification);
        let fields = entity_to_fields(entity)?;

        if let Some(source_id) = &entity.source_id {
            client.update_record(table, source_id, &fields).await?;
            info!("Updated Airtable record {source_id}");
            Ok(entity.clone())
        } else {
            let created = client.create_record(table, &fields).await?;
            info!("Created Airtable record {}", created.id);

            let mut updated = entity.clone();
            updated.source_id = Some(created.id);
            self.manager.update(updated, "sync").await
        }
    }
}

#[async_trait]
impl SyncRunner for AirtableSyncService {
    async fn run_full(&self) -> Result<SyncOperation> {
        self.run(SyncKind::FullSync, None).await
    }

    async fn run_incremental(&self, since: Option<OffsetDateTime>) -> Result<SyncOperation> {
        self.run(SyncKind::IncrementalSync, since).await
    }

    async fn last_sync_time(&self) -> Result<Option<OffsetDateTime>> {
        self.sync_repository.last_successful_sync().await
    }

    async fn local_entry_count(&self) -> Result<i64> {
        self.manager.count().await
    }

    async fn cleanup_history(&self, cutoff: OffsetDateTime) -> Result<u64> {
        self.sync_repository.delete_operations_before(cutoff).await
    }
}
