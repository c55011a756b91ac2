//! Sync coordinator.
//!
//! Routes reads and writes cache-first or network-first depending on
//! connectivity, and replays the pending queue once the remote is reachable
//! again.
//!
//! # Write path
//!
//! | State | Remote result | Outcome |
//! |-------|---------------|---------|
//! | ONLINE | success | server row cached, returned |
//! | ONLINE | unavailable | optimistic cache write + queued operation |
//! | ONLINE | rejected | error returned, nothing queued (unless `queue_rejected_writes`) |
//! | OFFLINE | n/a | optimistic cache write + queued operation |
//!
//! Concurrent writers are not reconciled: the last write to reach the cache,
//! and later the last operation replayed, wins.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use talebedu_cache::{LocalCache, MetadataStore};
use talebedu_config::SyncConfig;
use talebedu_core::generate_local_id;
use talebedu_models::{
    Collection, OperationKind, QueuedOperation, SyncRecord, is_tombstone, merge_patch, record_id,
    tombstone,
};
use talebedu_observability::{
    set_pending_operations, track_remote_fallback, track_replay_duration, track_replay_outcome,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::connectivity::ConnectivityMonitor;
use crate::errors::SyncError;
use crate::queue::OperationQueue;
use crate::remote::{RemoteApi, RemoteError, RemoteQuery};

/// Outcome of one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    /// Operations sent to the remote.
    pub attempted: usize,
    pub synced: usize,
    /// Retryable failures left pending.
    pub failed: usize,
    pub dead_lettered: usize,
    /// Another replay was already running; nothing was done.
    pub skipped: bool,
    /// Connectivity dropped before the pass reached the end of the queue.
    pub interrupted: bool,
}

impl ReplayReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

pub struct SyncCoordinator {
    cache: LocalCache,
    queue: OperationQueue,
    metadata: MetadataStore,
    connectivity: Arc<ConnectivityMonitor>,
    remote: Arc<dyn RemoteApi>,
    config: SyncConfig,
    replay_lock: Mutex<()>,
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("online", &self.connectivity.is_online())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SyncCoordinator {
    pub fn new(
        cache: LocalCache,
        queue: OperationQueue,
        metadata: MetadataStore,
        connectivity: Arc<ConnectivityMonitor>,
        remote: Arc<dyn RemoteApi>,
        config: SyncConfig,
    ) -> Self {
        Self {
            cache,
            queue,
            metadata,
            connectivity,
            remote,
            config,
            replay_lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn queue(&self) -> &OperationQueue {
        &self.queue
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    // Typed API

    /// Records of `T`'s collection, remote-first when online.
    ///
    /// Locally deleted records (tombstones) are left out.
    pub async fn fetch<T: SyncRecord>(&self, query: &RemoteQuery) -> Result<Vec<T>, SyncError> {
        let records = self.fetch_records(T::COLLECTION, query).await?;

        records
            .into_iter()
            .filter(|record| !is_tombstone(record))
            .map(|record| serde_json::from_value(record).map_err(SyncError::from))
            .collect()
    }

    pub async fn insert<T: SyncRecord>(&self, record: &T) -> Result<T, SyncError> {
        let stored = self
            .insert_record(T::COLLECTION, serde_json::to_value(record)?)
            .await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Applies the fields set in `patch` to record `id`.
    pub async fn update<T: SyncRecord>(&self, id: &str, patch: &T) -> Result<T, SyncError> {
        let stored = self
            .update_record(T::COLLECTION, id, serde_json::to_value(patch)?)
            .await?;
        Ok(serde_json::from_value(stored)?)
    }

    pub async fn delete<T: SyncRecord>(&self, id: &str) -> Result<(), SyncError> {
        self.delete_record(T::COLLECTION, id).await
    }

    // JSON API

    /// Remote rows when online and reachable (mirrored into the cache),
    /// otherwise the cached snapshot including tombstones. Remote failures
    /// are never returned.
    #[instrument(skip(self, query), fields(sync.collection = %collection))]
    pub async fn fetch_records(
        &self,
        collection: Collection,
        query: &RemoteQuery,
    ) -> Result<Vec<Value>, SyncError> {
        if self.connectivity.is_online() {
            match self.remote.select(collection, query).await {
                Ok(rows) => {
                    self.cache.put_many(collection, &rows).await?;
                    return Ok(rows);
                }
                Err(e) => {
                    warn!(error = %e, "Online fetch failed, using cached data");
                    track_remote_fallback("fetch");
                }
            }
        }

        Ok(self.cache.get_all(collection).await?)
    }

    #[instrument(skip(self, record), fields(sync.collection = %collection))]
    pub async fn insert_record(
        &self,
        collection: Collection,
        record: Value,
    ) -> Result<Value, SyncError> {
        if self.connectivity.is_online() {
            match self.remote.insert(collection, &record).await {
                Ok(stored) => {
                    self.cache_confirmed(collection, &stored).await?;
                    return Ok(stored);
                }
                Err(e) => self.fall_back(OperationKind::Insert, e)?,
            }
        }

        let mut record = record;
        if record_id(&record).is_none()
            && let Some(fields) = record.as_object_mut()
        {
            fields.insert("id".to_string(), Value::String(generate_local_id()));
        }

        self.cache.put(collection, &record).await?;
        self.enqueue(collection, OperationKind::Insert, record.clone())
            .await?;

        Ok(record)
    }

    /// Returns the server row when confirmed online, otherwise the cached
    /// copy with the patch applied.
    #[instrument(skip(self, patch), fields(sync.collection = %collection))]
    pub async fn update_record(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
    ) -> Result<Value, SyncError> {
        if self.connectivity.is_online() {
            match self.remote.update(collection, id, &patch).await {
                Ok(stored) => {
                    self.cache_confirmed(collection, &stored).await?;
                    return Ok(stored);
                }
                Err(e) => self.fall_back(OperationKind::Update, e)?,
            }
        }

        let id_field = json!({ "id": id });

        let mut merged = self
            .cache
            .get(collection, id)
            .await?
            .unwrap_or_else(|| json!({}));
        merge_patch(&mut merged, &patch);
        merge_patch(&mut merged, &id_field);
        self.cache.put(collection, &merged).await?;

        let mut payload = patch;
        merge_patch(&mut payload, &id_field);
        self.enqueue(collection, OperationKind::Update, payload)
            .await?;

        Ok(merged)
    }

    /// Removes the record when the remote confirms; otherwise leaves a
    /// tombstone and queues the delete.
    #[instrument(skip(self), fields(sync.collection = %collection))]
    pub async fn delete_record(&self, collection: Collection, id: &str) -> Result<(), SyncError> {
        if self.connectivity.is_online() {
            match self.remote.delete(collection, id).await {
                Ok(()) => {
                    self.cache.delete(collection, id).await?;
                    return Ok(());
                }
                Err(e) => self.fall_back(OperationKind::Delete, e)?,
            }
        }

        self.cache.put(collection, &tombstone(id)).await?;
        self.enqueue(collection, OperationKind::Delete, json!({ "id": id }))
            .await?;

        Ok(())
    }

    /// Decides whether a failed online write may continue as an offline write.
    fn fall_back(&self, kind: OperationKind, error: RemoteError) -> Result<(), SyncError> {
        match error {
            RemoteError::Rejected { status, message } if !self.config.queue_rejected_writes => {
                warn!(operation = %kind, status, message = %message, "Remote rejected write");
                Err(SyncError::Rejected { status, message })
            }
            error => {
                warn!(operation = %kind, error = %error, "Online write failed, queuing for later sync");
                track_remote_fallback(kind.as_str());
                Ok(())
            }
        }
    }

    async fn enqueue(
        &self,
        collection: Collection,
        kind: OperationKind,
        payload: Value,
    ) -> Result<QueuedOperation, SyncError> {
        let op = self.queue.enqueue(collection, kind, payload).await?;
        self.refresh_pending_gauge().await?;
        Ok(op)
    }

    async fn cache_confirmed(&self, collection: Collection, stored: &Value) -> Result<(), SyncError> {
        if record_id(stored).is_some() {
            self.cache.put(collection, stored).await?;
        } else {
            warn!(sync.collection = %collection, "Remote row has no id, not cached");
        }
        Ok(())
    }

    async fn refresh_pending_gauge(&self) -> Result<(), SyncError> {
        let counts = self.queue.counts().await?;
        set_pending_operations(counts.pending);
        Ok(())
    }

    // Replay

    /// Re-issues pending operations in FIFO order.
    ///
    /// Does nothing while offline, and returns a skipped report if another
    /// replay is in progress. Stops early if connectivity drops. Rejected
    /// operations are dead-lettered at once; unavailable ones stay pending
    /// until `max_attempts` (if configured) is reached.
    #[instrument(skip(self))]
    pub async fn replay(&self) -> Result<ReplayReport, SyncError> {
        let Ok(_guard) = self.replay_lock.try_lock() else {
            debug!("Replay already in progress, skipping");
            return Ok(ReplayReport::skipped());
        };

        if !self.connectivity.is_online() {
            debug!("Offline, replay deferred");
            return Ok(ReplayReport::default());
        }

        let started = Instant::now();
        let pending = self.queue.list_pending().await?;
        let mut report = ReplayReport::default();

        if !pending.is_empty() {
            info!(pending = pending.len(), "Syncing pending changes");
        }

        for op in pending {
            if !self.connectivity.is_online() {
                warn!("Connectivity lost, stopping replay");
                report.interrupted = true;
                break;
            }

            report.attempted += 1;
            match self.replay_operation(&op).await? {
                Ok(()) => {
                    self.queue.mark_synced(&op.id).await?;
                    report.synced += 1;
                    track_replay_outcome("synced");
                }
                Err(error) if error.is_retryable() => {
                    let message = error.to_string();
                    let attempts = self
                        .queue
                        .record_failure(&op.id, &message)
                        .await?
                        .unwrap_or(op.attempts + 1);

                    if matches!(self.config.max_attempts, Some(max) if attempts >= max) {
                        self.queue.mark_dead_lettered(&op.id, &message).await?;
                        report.dead_lettered += 1;
                        track_replay_outcome("dead_lettered");
                    } else {
                        warn!(queue.id = %op.id, attempts, error = %message, "Failed to sync operation");
                        report.failed += 1;
                        track_replay_outcome("failed");
                    }
                }
                Err(error) => {
                    self.queue
                        .mark_dead_lettered(&op.id, &error.to_string())
                        .await?;
                    report.dead_lettered += 1;
                    track_replay_outcome("dead_lettered");
                }
            }
        }

        if !report.interrupted {
            self.metadata.set_last_sync(Utc::now()).await?;
        }
        self.refresh_pending_gauge().await?;
        track_replay_duration(started.elapsed().as_secs_f64());

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                synced = report.synced,
                failed = report.failed,
                dead_lettered = report.dead_lettered,
                "Replay finished"
            );
        }

        Ok(report)
    }

    /// Sends one queued operation and mirrors a confirmed result into the
    /// cache, unless a later pending operation targets the same record. The
    /// outer error is local storage failure; the inner one is the remote
    /// outcome.
    async fn replay_operation(
        &self,
        op: &QueuedOperation,
    ) -> Result<Result<(), RemoteError>, SyncError> {
        let Some(id) = op.record_id() else {
            return Ok(Err(RemoteError::rejected(
                400,
                "Queued operation has no record id",
            )));
        };

        let confirmed = match op.kind {
            OperationKind::Insert => self.remote.insert(op.collection, &op.payload).await.map(Some),
            OperationKind::Update => self
                .remote
                .update(op.collection, id, &op.payload)
                .await
                .map(Some),
            OperationKind::Delete => self.remote.delete(op.collection, id).await.map(|()| None),
        };
        let confirmed = match confirmed {
            Ok(confirmed) => confirmed,
            Err(e) => return Ok(Err(e)),
        };

        // A later queued change to the same record already shaped the cache
        if self
            .queue
            .has_later_pending(op.collection, id, op.sequence)
            .await?
        {
            debug!(queue.id = %op.id, record.id = %id, "Newer local change pending, cache left as is");
        } else {
            match confirmed {
                Some(stored) => self.cache_confirmed(op.collection, &stored).await?,
                None => {
                    self.cache.delete(op.collection, id).await?;
                }
            }
        }

        debug!(queue.id = %op.id, operation = %op.kind, "Operation synced");

        Ok(Ok(()))
    }
}
