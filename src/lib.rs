//! # TalebEdu Offline Sync
//!
//! Offline-first data synchronization layer for TalebEdu. Reads and writes
//! go through a [`SyncCoordinator`] that serves them from the remote backend
//! when it is reachable and from a local SQLite cache when it is not.
//! Writes that could not be confirmed are queued and replayed in order once
//! connectivity returns.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── connectivity.rs   # ONLINE/OFFLINE flag with change notifications
//! ├── coordinator.rs    # cache-first / network-first routing, replay
//! ├── errors.rs         # SyncError
//! ├── queue.rs          # pending-operation queue (FIFO, dead letters)
//! ├── remote/           # RemoteApi contract + PostgREST client
//! ├── state.rs          # wiring from configuration
//! ├── worker.rs         # background replay and purge
//! └── main.rs           # talebedu-sync CLI
//! crates/
//! ├── talebedu-cache/          # local durable cache, sync metadata
//! ├── talebedu-config/         # environment configuration
//! ├── talebedu-core/           # store errors, id and time helpers
//! ├── talebedu-db/             # SQLite pool and migrations
//! ├── talebedu-models/         # collections, typed records, queued operations
//! └── talebedu-observability/  # logging and metrics
//! ```
//!
//! ## Collections
//!
//! | Collection | Local store | Remote table |
//! |------------|-------------|--------------|
//! | Students | `students` | `students` |
//! | Teachers | `teachers` | `teachers` |
//! | Fees | `fees` | `student_fees` |
//! | Attendance | `attendance` | `attendance_records` |
//!
//! ## Consistency
//!
//! Last writer wins. There is no conflict detection between a queued local
//! mutation and a concurrent remote change to the same record; whichever is
//! applied last is kept.
//!
//! ## Quick Start
//!
//! ```ignore
//! use talebedu::{AppConfig, SyncState};
//! use talebedu::talebedu_models::Student;
//! use talebedu::remote::RemoteQuery;
//!
//! let state = SyncState::init(AppConfig::from_env()).await?;
//! let coordinator = state.coordinator()?;
//!
//! let students: Vec<Student> = coordinator.fetch(&RemoteQuery::all()).await?;
//! coordinator.connectivity().set_online(false);
//! coordinator.insert(&Student { first_name: Some("Amal".into()), ..Default::default() }).await?;
//! ```

pub mod connectivity;
pub mod coordinator;
pub mod errors;
pub mod queue;
pub mod remote;
pub mod state;
pub mod worker;

pub use connectivity::ConnectivityMonitor;
pub use coordinator::{ReplayReport, SyncCoordinator};
pub use errors::SyncError;
pub use queue::{OperationQueue, QueueCounts};
pub use remote::{PostgrestClient, RemoteApi, RemoteError, RemoteQuery};
pub use state::{AppConfig, SyncState};
pub use worker::{SyncWorker, WorkerHandle};

// Re-export workspace crates for convenience
pub use talebedu_cache;
pub use talebedu_config;
pub use talebedu_core;
pub use talebedu_db;
pub use talebedu_models;
