//! Pending-operation queue.
//!
//! An append-only log of mutations the remote has not confirmed yet, stored
//! in the `sync_queue` table. Replay order is the `sequence` column. Payloads
//! are never rewritten; only status, attempt count and last error change.

use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use talebedu_core::{StoreError, generate_local_id, millis_to_datetime, now_millis};
use talebedu_models::{Collection, OperationKind, OperationStatus, QueuedOperation};
use talebedu_observability::track_operation_enqueued;
use tracing::{debug, instrument, warn};

const SELECT_COLUMNS: &str = "SELECT sequence, id, collection, operation, payload, created_at, status, attempts, last_error FROM sync_queue";

/// Number of queued operations per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounts {
    pub pending: i64,
    pub synced: i64,
    pub dead_lettered: i64,
}

#[derive(Clone)]
pub struct OperationQueue {
    pool: SqlitePool,
}

impl std::fmt::Debug for OperationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationQueue").finish_non_exhaustive()
    }
}

impl OperationQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends an operation with a fresh id in the pending state.
    #[instrument(skip(self, payload), fields(queue.collection = %collection, queue.operation = %kind))]
    pub async fn enqueue(
        &self,
        collection: Collection,
        kind: OperationKind,
        payload: Value,
    ) -> Result<QueuedOperation, StoreError> {
        let id = generate_local_id();
        let created_at = now_millis();
        let data = serde_json::to_string(&payload)?;

        let result = sqlx::query(
            r#"
            INSERT INTO sync_queue (id, collection, operation, payload, created_at, status, attempts)
            VALUES (?1, ?2, ?3, ?4, ?5, 'pending', 0)
            "#,
        )
        .bind(&id)
        .bind(collection.store_name())
        .bind(kind.as_str())
        .bind(&data)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let sequence = result.last_insert_rowid();

        track_operation_enqueued(collection.store_name(), kind.as_str());
        debug!(queue.id = %id, queue.sequence = sequence, "Operation enqueued");

        Ok(QueuedOperation {
            id,
            sequence,
            collection,
            kind,
            payload,
            created_at: millis_to_datetime(created_at),
            status: OperationStatus::Pending,
            attempts: 0,
            last_error: None,
        })
    }

    /// All pending operations, oldest first.
    pub async fn list_pending(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        self.list_by_status(OperationStatus::Pending).await
    }

    /// All dead-lettered operations, oldest first.
    pub async fn list_dead_lettered(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        self.list_by_status(OperationStatus::DeadLettered).await
    }

    async fn list_by_status(
        &self,
        status: OperationStatus,
    ) -> Result<Vec<QueuedOperation>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE status = ?1 ORDER BY sequence"))
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(operation_from_row).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Option<QueuedOperation>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(operation_from_row).transpose()
    }

    /// Whether a pending operation queued after `sequence` targets the same
    /// record.
    pub async fn has_later_pending(
        &self,
        collection: Collection,
        record_id: &str,
        sequence: i64,
    ) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT sequence FROM sync_queue
            WHERE status = 'pending'
              AND collection = ?1
              AND json_extract(payload, '$.id') = ?2
              AND sequence > ?3
            LIMIT 1
            "#,
        )
        .bind(collection.store_name())
        .bind(record_id)
        .bind(sequence)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    /// Flags an operation as confirmed by the remote. Unknown ids are ignored.
    #[instrument(skip(self))]
    pub async fn mark_synced(&self, id: &str) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE sync_queue SET status = 'synced', last_error = NULL WHERE id = ?1")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            debug!(queue.id = %id, "mark_synced on unknown operation");
        }

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every synced operation and returns how many were removed.
    #[instrument(skip(self))]
    pub async fn purge_synced(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sync_queue WHERE status = 'synced'")
            .execute(&self.pool)
            .await?;

        debug!(queue.purged = result.rows_affected(), "Synced operations purged");

        Ok(result.rows_affected())
    }

    /// Counts a failed replay attempt. Returns the new attempt count, or
    /// `None` for an unknown id.
    #[instrument(skip(self, error))]
    pub async fn record_failure(&self, id: &str, error: &str) -> Result<Option<u32>, StoreError> {
        let attempts: Option<i64> = sqlx::query_scalar(
            "UPDATE sync_queue SET attempts = attempts + 1, last_error = ?2 WHERE id = ?1 RETURNING attempts",
        )
        .bind(id)
        .bind(error)
        .fetch_optional(&self.pool)
        .await?;

        attempts.map(attempts_from_column).transpose()
    }

    /// Moves an operation out of the pending list for manual handling.
    #[instrument(skip(self, error))]
    pub async fn mark_dead_lettered(&self, id: &str, error: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE sync_queue SET status = 'dead_lettered', last_error = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            warn!(queue.id = %id, error = %error, "Operation dead-lettered");
        }

        Ok(result.rows_affected() > 0)
    }

    /// Puts a dead-lettered operation back at its original place in the
    /// pending list with its attempt count reset.
    #[instrument(skip(self))]
    pub async fn requeue(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE sync_queue
            SET status = 'pending', attempts = 0, last_error = NULL
            WHERE id = ?1 AND status = 'dead_lettered'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Drops every dead-lettered operation. Returns how many were removed.
    #[instrument(skip(self))]
    pub async fn discard_dead_lettered(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sync_queue WHERE status = 'dead_lettered'")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn counts(&self) -> Result<QueueCounts, StoreError> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS total FROM sync_queue GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = QueueCounts::default();
        for row in rows {
            let status: String = row.try_get("status")?;
            let total: i64 = row.try_get("total")?;
            match status.parse::<OperationStatus>() {
                Ok(OperationStatus::Pending) => counts.pending = total,
                Ok(OperationStatus::Synced) => counts.synced = total,
                Ok(OperationStatus::DeadLettered) => counts.dead_lettered = total,
                Err(e) => return Err(StoreError::corrupt("sync_queue", e.to_string())),
            }
        }

        Ok(counts)
    }
}

fn attempts_from_column(attempts: i64) -> Result<u32, StoreError> {
    u32::try_from(attempts)
        .map_err(|_| StoreError::corrupt("sync_queue", format!("attempts out of range: {attempts}")))
}

fn operation_from_row(row: &SqliteRow) -> Result<QueuedOperation, StoreError> {
    let corrupt = |e: &dyn std::fmt::Display| StoreError::corrupt("sync_queue", e.to_string());

    let collection: String = row.try_get("collection")?;
    let operation: String = row.try_get("operation")?;
    let status: String = row.try_get("status")?;
    let payload: String = row.try_get("payload")?;

    Ok(QueuedOperation {
        id: row.try_get("id")?,
        sequence: row.try_get("sequence")?,
        collection: collection.parse().map_err(|e| corrupt(&e))?,
        kind: operation.parse().map_err(|e| corrupt(&e))?,
        payload: serde_json::from_str(&payload)?,
        created_at: millis_to_datetime(row.try_get("created_at")?),
        status: status.parse().map_err(|e| corrupt(&e))?,
        attempts: attempts_from_column(row.try_get("attempts")?)?,
        last_error: row.try_get("last_error")?,
    })
}
