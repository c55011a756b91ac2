use std::sync::Arc;

use talebedu_cache::{LocalCache, MetadataStore};
use talebedu_config::{RemoteConfig, StorageConfig, SyncConfig};
use talebedu_db::{SqlitePool, init_pool};
use tracing::{info, warn};

use crate::connectivity::ConnectivityMonitor;
use crate::coordinator::SyncCoordinator;
use crate::errors::SyncError;
use crate::queue::OperationQueue;
use crate::remote::{PostgrestClient, RemoteApi};

/// Configuration for building a [`SyncState`].
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            storage: StorageConfig::from_env(),
            remote: RemoteConfig::from_env(),
            sync: SyncConfig::from_env(),
        }
    }
}

/// The local stores plus, when a remote is configured, a coordinator over
/// them. Everything shares one SQLite pool.
#[derive(Clone, Debug)]
pub struct SyncState {
    pub db: SqlitePool,
    pub cache: LocalCache,
    pub queue: OperationQueue,
    pub metadata: MetadataStore,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub config: SyncConfig,
    coordinator: Option<Arc<SyncCoordinator>>,
}

impl SyncState {
    /// Opens the database and connects the remote client configured in `config`.
    pub async fn init(config: AppConfig) -> Result<Self, SyncError> {
        let remote = PostgrestClient::from_config(&config.remote)?
            .map(|client| Arc::new(client) as Arc<dyn RemoteApi>);

        if remote.is_none() {
            warn!("SUPABASE_URL is not set, remote sync disabled");
        }

        let db = init_pool(&config.storage).await?;
        let state = Self::with_remote(db, remote, config.sync);

        info!(
            online = state.connectivity.is_online(),
            remote = state.coordinator.is_some(),
            "Sync state initialized"
        );

        Ok(state)
    }

    /// Builds the state over an already migrated pool.
    pub fn with_remote(
        db: SqlitePool,
        remote: Option<Arc<dyn RemoteApi>>,
        config: SyncConfig,
    ) -> Self {
        let cache = LocalCache::new(db.clone());
        let queue = OperationQueue::new(db.clone());
        let metadata = MetadataStore::new(db.clone());
        let connectivity = Arc::new(ConnectivityMonitor::new(config.start_online));

        let coordinator = remote.map(|remote| {
            Arc::new(SyncCoordinator::new(
                cache.clone(),
                queue.clone(),
                metadata.clone(),
                connectivity.clone(),
                remote,
                config.clone(),
            ))
        });

        Self {
            db,
            cache,
            queue,
            metadata,
            connectivity,
            config,
            coordinator,
        }
    }

    /// The coordinator, or [`SyncError::NoRemote`] when no remote is configured.
    pub fn coordinator(&self) -> Result<Arc<SyncCoordinator>, SyncError> {
        self.coordinator.clone().ok_or(SyncError::NoRemote)
    }
}
