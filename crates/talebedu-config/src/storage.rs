//! Local storage configuration.
//!
//! The cache, the pending-operation queue and the sync metadata all live in
//! one SQLite database on the device.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: SQLite connection string (default: `sqlite://talebedu-offline.db?mode=rwc`)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)

use std::env;

const DEFAULT_DATABASE_URL: &str = "sqlite://talebedu-offline.db?mode=rwc";

/// SQLite connection settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// SQLite connection URL. `sqlite::memory:` gives a throwaway database.
    pub database_url: String,

    /// Maximum number of pooled connections.
    pub max_connections: u32,
}

impl StorageConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(5),
        }
    }

    /// An isolated in-memory database, used by tests and dry runs.
    ///
    /// In-memory SQLite databases are per-connection, so the pool is pinned
    /// to a single connection.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            max_connections: 1,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            max_connections: 5,
        }
    }
}
