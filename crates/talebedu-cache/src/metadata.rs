//! Sync metadata: small durable facts about the sync process.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use talebedu_core::{StoreError, millis_to_datetime};
use tracing::debug;

const LAST_SYNC_KEY: &str = "last_sync";

/// Key/value store for sync bookkeeping.
#[derive(Clone)]
pub struct MetadataStore {
    pool: SqlitePool,
}

impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore").finish_non_exhaustive()
    }
}

impl MetadataStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar("SELECT value FROM sync_metadata WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sync_metadata (key, value) VALUES (?1, ?2)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!(metadata.key = %key, "Metadata updated");

        Ok(())
    }

    /// When the last replay pass finished, if ever.
    pub async fn last_sync(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let Some(raw) = self.get(LAST_SYNC_KEY).await? else {
            return Ok(None);
        };

        let millis = raw
            .parse::<i64>()
            .map_err(|e| StoreError::corrupt("sync_metadata", format!("last_sync: {e}")))?;

        Ok(Some(millis_to_datetime(millis)))
    }

    pub async fn set_last_sync(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.set(LAST_SYNC_KEY, &at.timestamp_millis().to_string())
            .await
    }
}
