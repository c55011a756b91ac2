mod common;

use common::FakeRemote;
use serde_json::json;
use talebedu::talebedu_config::{StorageConfig, SyncConfig};
use talebedu::talebedu_db::init_pool;
use talebedu::talebedu_models::{Collection, OperationKind, is_tombstone};
use talebedu::{RemoteApi, SyncState};
use tempfile::TempDir;

fn file_storage(dir: &TempDir) -> StorageConfig {
    StorageConfig {
        database_url: format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("offline.db").display()
        ),
        max_connections: 2,
    }
}

async fn open_state(dir: &TempDir) -> SyncState {
    let pool = init_pool(&file_storage(dir)).await.unwrap();
    let remote: std::sync::Arc<dyn RemoteApi> = FakeRemote::new();
    SyncState::with_remote(pool, Some(remote), SyncConfig::default().with_start_online(false))
}

#[tokio::test]
async fn test_cache_and_queue_survive_reopen() {
    let dir = TempDir::new().unwrap();

    let inserted_id = {
        let state = open_state(&dir).await;
        let coordinator = state.coordinator().unwrap();

        coordinator
            .insert_record(Collection::Students, json!({"id": "s1", "name": "Amal"}))
            .await
            .unwrap();
        coordinator
            .delete_record(Collection::Fees, "f9")
            .await
            .unwrap();
        let pending = state.queue.list_pending().await.unwrap();
        state.metadata.set_last_sync(chrono::Utc::now()).await.unwrap();

        state.db.close().await;
        pending[0].id.clone()
    };

    let state = open_state(&dir).await;

    let student = state.cache.get(Collection::Students, "s1").await.unwrap();
    assert_eq!(student, Some(json!({"id": "s1", "name": "Amal"})));

    let fee = state.cache.get(Collection::Fees, "f9").await.unwrap().unwrap();
    assert!(is_tombstone(&fee));

    let pending = state.queue.list_pending().await.unwrap();
    let kinds: Vec<_> = pending.iter().map(|op| op.kind).collect();
    assert_eq!(kinds, vec![OperationKind::Insert, OperationKind::Delete]);
    assert_eq!(pending[0].id, inserted_id);

    assert!(state.metadata.last_sync().await.unwrap().is_some());
}

#[tokio::test]
async fn test_reopen_runs_migrations_once() {
    let dir = TempDir::new().unwrap();

    let first = init_pool(&file_storage(&dir)).await.unwrap();
    first.close().await;

    let second = init_pool(&file_storage(&dir)).await.unwrap();
    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('cached_records', 'sync_queue', 'sync_metadata')",
    )
    .fetch_one(&second)
    .await
    .unwrap();

    assert_eq!(tables, 3);
}
