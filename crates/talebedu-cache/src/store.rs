//! Local durable record cache.
//!
//! Records are JSON objects keyed by `(collection, id)`. Writes overwrite;
//! there is no versioning. Tombstones are stored like any other record and
//! are not filtered here.

use serde_json::Value;
use sqlx::{Row, SqlitePool};
use talebedu_core::{StoreError, now_millis};
use talebedu_models::{Collection, record_id};
use tracing::{debug, instrument, warn};

/// SQLite-backed cache of records per collection.
#[derive(Clone)]
pub struct LocalCache {
    pool: SqlitePool,
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache").finish_non_exhaustive()
    }
}

const UPSERT_SQL: &str = r#"
    INSERT INTO cached_records (collection, id, data, updated_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (collection, id)
    DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
"#;

impl LocalCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts or overwrites a record keyed by its `id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MissingId` if the record has no string `id`, or a
    /// database error if the write fails.
    #[instrument(skip(self, record), fields(cache.operation = "PUT", cache.collection = %collection))]
    pub async fn put(&self, collection: Collection, record: &Value) -> Result<(), StoreError> {
        let id = record_id(record).ok_or_else(|| StoreError::missing_id(collection.store_name()))?;
        let data = serde_json::to_string(record)?;

        sqlx::query(UPSERT_SQL)
            .bind(collection.store_name())
            .bind(id)
            .bind(&data)
            .bind(now_millis())
            .execute(&self.pool)
            .await?;

        debug!(cache.id = %id, "Record cached");

        Ok(())
    }

    /// Caches a batch of records in one transaction.
    ///
    /// Records without an `id` are skipped with a warning. Returns the number
    /// of records written.
    #[instrument(skip(self, records), fields(cache.operation = "PUT_MANY", cache.collection = %collection, cache.batch = records.len()))]
    pub async fn put_many(
        &self,
        collection: Collection,
        records: &[Value],
    ) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        let updated_at = now_millis();
        let mut written = 0;

        for record in records {
            let Some(id) = record_id(record) else {
                warn!("Skipping record without id");
                continue;
            };
            let data = serde_json::to_string(record)?;

            sqlx::query(UPSERT_SQL)
                .bind(collection.store_name())
                .bind(id)
                .bind(&data)
                .bind(updated_at)
                .execute(&mut *tx)
                .await?;
            written += 1;
        }

        tx.commit().await?;

        debug!(cache.written = written, "Batch cached");

        Ok(written)
    }

    /// Gets a single record, or `None` if it is not cached.
    #[instrument(skip(self), fields(cache.operation = "GET", cache.collection = %collection))]
    pub async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT data FROM cached_records WHERE collection = ?1 AND id = ?2")
            .bind(collection.store_name())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                debug!(cache.id = %id, "Cache hit");
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => {
                debug!(cache.id = %id, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Snapshot of every record cached for a collection, tombstones included.
    #[instrument(skip(self), fields(cache.operation = "GET_ALL", cache.collection = %collection))]
    pub async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query("SELECT data FROM cached_records WHERE collection = ?1 ORDER BY id")
            .bind(collection.store_name())
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(|row| {
                let data: String = row.try_get("data")?;
                Ok(serde_json::from_str(&data)?)
            })
            .collect::<Result<Vec<Value>, StoreError>>()?;

        debug!(cache.count = records.len(), "Collection read from cache");

        Ok(records)
    }

    /// Physically removes a record. Returns whether anything was removed.
    #[instrument(skip(self), fields(cache.operation = "DEL", cache.collection = %collection))]
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cached_records WHERE collection = ?1 AND id = ?2")
            .bind(collection.store_name())
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(cache.id = %id, cache.removed = result.rows_affected(), "Record removed");

        Ok(result.rows_affected() > 0)
    }

    /// Number of records cached for a collection, tombstones included.
    pub async fn count(&self, collection: Collection) -> Result<i64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cached_records WHERE collection = ?1")
                .bind(collection.store_name())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use talebedu_config::StorageConfig;
    use talebedu_models::tombstone;

    async fn setup_cache() -> LocalCache {
        let pool = talebedu_db::init_pool(&StorageConfig::in_memory())
            .await
            .unwrap();
        LocalCache::new(pool)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let cache = setup_cache().await;
        let record = json!({"id": "s1", "first_name": "Amal"});

        cache.put(Collection::Students, &record).await.unwrap();

        let cached = cache.get(Collection::Students, "s1").await.unwrap();
        assert_eq!(cached, Some(record));
        assert_eq!(cache.get(Collection::Students, "s2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = setup_cache().await;
        cache
            .put(Collection::Attendance, &json!({"id": "rec1", "status": "present"}))
            .await
            .unwrap();
        cache
            .put(Collection::Attendance, &json!({"id": "rec1", "status": "absent"}))
            .await
            .unwrap();

        let all = cache.get_all(Collection::Attendance).await.unwrap();
        assert_eq!(all, vec![json!({"id": "rec1", "status": "absent"})]);
    }

    #[tokio::test]
    async fn test_put_without_id_is_rejected() {
        let cache = setup_cache().await;
        let err = cache
            .put(Collection::Fees, &json!({"amount": 10}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingId { .. }));
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let cache = setup_cache().await;
        cache.put(Collection::Students, &json!({"id": "x"})).await.unwrap();
        cache.put(Collection::Teachers, &json!({"id": "x", "employee_id": "E1"})).await.unwrap();

        assert_eq!(cache.count(Collection::Students).await.unwrap(), 1);
        assert_eq!(cache.count(Collection::Teachers).await.unwrap(), 1);
        assert!(cache.get_all(Collection::Fees).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_keeps_tombstones() {
        let cache = setup_cache().await;
        cache.put(Collection::Students, &json!({"id": "a"})).await.unwrap();
        cache.put(Collection::Students, &tombstone("b")).await.unwrap();

        let all = cache.get_all(Collection::Students).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1]["_deleted"], true);
    }

    #[tokio::test]
    async fn test_put_many_skips_records_without_id() {
        let cache = setup_cache().await;
        let written = cache
            .put_many(
                Collection::Fees,
                &[json!({"id": "f1"}), json!({"amount": 3}), json!({"id": "f2"})],
            )
            .await
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(cache.count(Collection::Fees).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = setup_cache().await;
        cache.put(Collection::Students, &json!({"id": "s1"})).await.unwrap();

        assert!(cache.delete(Collection::Students, "s1").await.unwrap());
        assert!(!cache.delete(Collection::Students, "s1").await.unwrap());
        assert_eq!(cache.get(Collection::Students, "s1").await.unwrap(), None);
    }
}
