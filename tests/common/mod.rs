#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use talebedu::talebedu_config::{StorageConfig, SyncConfig};
use talebedu::talebedu_db::init_pool;
use talebedu::talebedu_models::{Collection, merge_patch, record_id};
use talebedu::remote::RemoteFuture;
use talebedu::{
    ConnectivityMonitor, RemoteApi, RemoteError, RemoteQuery, SyncCoordinator, SyncState,
};

/// In-memory remote backend with switchable failures.
///
/// Rows it stores or returns carry `"server": true` so tests can tell a
/// confirmed row from an optimistic one.
#[derive(Default)]
pub struct FakeRemote {
    tables: Mutex<HashMap<Collection, Vec<Value>>>,
    failure: Mutex<Option<RemoteError>>,
    calls: Mutex<Vec<String>>,
    disconnect_after: Mutex<Option<(usize, Arc<ConnectivityMonitor>)>>,
    next_id: Mutex<u32>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every following call fails with `error` until [`FakeRemote::recover`].
    pub fn fail_with(&self, error: RemoteError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn fail_unavailable(&self) {
        self.fail_with(RemoteError::from_status(500, "Internal Server Error"));
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Flips `monitor` offline while serving the `calls`-th remote call. That
    /// call itself still goes through.
    pub fn disconnect_after(&self, calls: usize, monitor: Arc<ConnectivityMonitor>) {
        *self.disconnect_after.lock().unwrap() = Some((calls, monitor));
    }

    pub fn seed(&self, collection: Collection, rows: Vec<Value>) {
        self.tables.lock().unwrap().insert(collection, rows);
    }

    pub fn rows(&self, collection: Collection) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Calls received so far, as `"<method> <table>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn begin(&self, method: &str, collection: Collection) -> Result<(), RemoteError> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(format!("{method} {}", collection.table()));
            calls.len()
        };

        if let Some((after, monitor)) = self.disconnect_after.lock().unwrap().as_ref()
            && count >= *after
        {
            monitor.set_online(false);
        }

        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl RemoteApi for FakeRemote {
    fn select<'a>(
        &'a self,
        collection: Collection,
        query: &'a RemoteQuery,
    ) -> RemoteFuture<'a, Vec<Value>> {
        Box::pin(async move {
            self.begin("select", collection)?;
            let rows = self
                .rows(collection)
                .into_iter()
                .filter(|row| {
                    query
                        .filters
                        .iter()
                        .all(|(column, value)| row.get(column).and_then(Value::as_str) == Some(value.as_str()))
                })
                .collect();
            Ok(rows)
        })
    }

    fn insert<'a>(&'a self, collection: Collection, record: &'a Value) -> RemoteFuture<'a, Value> {
        Box::pin(async move {
            self.begin("insert", collection)?;

            let mut row = record.clone();
            if record_id(&row).is_none() {
                let mut next = self.next_id.lock().unwrap();
                *next += 1;
                merge_patch(&mut row, &json!({ "id": format!("srv-{next}") }));
            }
            merge_patch(&mut row, &json!({ "server": true }));

            self.tables
                .lock()
                .unwrap()
                .entry(collection)
                .or_default()
                .push(row.clone());
            Ok(row)
        })
    }

    fn update<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        patch: &'a Value,
    ) -> RemoteFuture<'a, Value> {
        Box::pin(async move {
            self.begin("update", collection)?;

            let mut tables = self.tables.lock().unwrap();
            let row = tables
                .entry(collection)
                .or_default()
                .iter_mut()
                .find(|row| record_id(row) == Some(id))
                .ok_or_else(|| RemoteError::rejected(404, format!("No row with id {id}")))?;

            merge_patch(row, patch);
            merge_patch(row, &json!({ "server": true }));
            Ok(row.clone())
        })
    }

    fn delete<'a>(&'a self, collection: Collection, id: &'a str) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            self.begin("delete", collection)?;

            self.tables
                .lock()
                .unwrap()
                .entry(collection)
                .or_default()
                .retain(|row| record_id(row) != Some(id));
            Ok(())
        })
    }
}

/// Sync state over a fresh in-memory database and the given remote.
pub async fn setup_state(remote: Arc<FakeRemote>, config: SyncConfig) -> SyncState {
    let pool = init_pool(&StorageConfig::in_memory())
        .await
        .expect("Failed to open in-memory database");
    SyncState::with_remote(pool, Some(remote as Arc<dyn RemoteApi>), config)
}

/// Coordinator over a fresh in-memory database, starting online.
pub async fn setup_coordinator(remote: Arc<FakeRemote>) -> Arc<SyncCoordinator> {
    setup_state(remote, SyncConfig::default())
        .await
        .coordinator()
        .expect("Remote is configured")
}

/// Coordinator starting offline.
pub async fn setup_offline_coordinator(remote: Arc<FakeRemote>) -> Arc<SyncCoordinator> {
    setup_state(remote, SyncConfig::default().with_start_online(false))
        .await
        .coordinator()
        .expect("Remote is configured")
}
