//! Background sync worker.
//!
//! Replays the queue once at startup if online, again on every OFFLINE to
//! ONLINE transition, and purges synced operations on a fixed interval.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::coordinator::SyncCoordinator;

/// Shortest purge period; `tokio::time::interval` rejects zero.
const MIN_PURGE_INTERVAL: Duration = Duration::from_millis(10);

pub struct SyncWorker {
    coordinator: Arc<SyncCoordinator>,
    purge_interval: Duration,
}

/// Handle to a spawned [`SyncWorker`].
pub struct WorkerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Stops the worker and waits for it to finish its current step.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            error!(error = %e, "Sync worker task failed");
        }
    }
}

impl SyncWorker {
    pub fn new(coordinator: Arc<SyncCoordinator>) -> Self {
        let purge_interval = coordinator.config().purge_interval.max(MIN_PURGE_INTERVAL);
        Self {
            coordinator,
            purge_interval,
        }
    }

    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = interval.max(MIN_PURGE_INTERVAL);
        self
    }

    /// Runs the worker on the current runtime until the handle is shut down.
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown, stop) = oneshot::channel();
        let task = tokio::spawn(self.run(async move {
            let _ = stop.await;
        }));

        WorkerHandle { shutdown, task }
    }

    /// Runs until `shutdown` completes or the connectivity monitor goes away.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let mut connectivity = self.coordinator.connectivity().subscribe();

        let mut purge = tokio::time::interval(self.purge_interval);
        purge.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        purge.tick().await;

        info!(purge_interval_secs = self.purge_interval.as_secs(), "Sync worker started");

        if *connectivity.borrow_and_update() {
            self.replay().await;
        }

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                changed = connectivity.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let online = *connectivity.borrow_and_update();
                    if online {
                        info!("Back online, syncing pending changes");
                        self.replay().await;
                    } else {
                        info!("Offline, changes will be queued until connectivity returns");
                    }
                }
                _ = purge.tick() => self.purge().await,
            }
        }

        info!("Sync worker stopped");
    }

    async fn replay(&self) {
        if let Err(e) = self.coordinator.replay().await {
            error!(error = %e, "Replay failed, will retry on next reconnect");
        }
    }

    async fn purge(&self) {
        match self.coordinator.queue().purge_synced().await {
            Ok(0) => {}
            Ok(purged) => info!(purged, "Purged synced operations"),
            Err(e) => error!(error = %e, "Failed to purge synced operations"),
        }
    }
}
