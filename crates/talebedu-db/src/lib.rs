//! # TalebEdu DB
//!
//! SQLite connection pool and embedded schema migrations for the offline
//! store.
//!
//! The cache, the pending-operation queue and the sync metadata share one
//! database. [`init_pool`] opens it and brings the schema up to date.
//!
//! # Example
//!
//! ```ignore
//! use talebedu_config::StorageConfig;
//! use talebedu_db::init_pool;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sqlx::Error> {
//!     let pool = init_pool(&StorageConfig::from_env()).await?;
//!     // Hand the pool to the cache and the queue
//!     Ok(())
//! }
//! ```

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;
use talebedu_config::StorageConfig;
use tracing::{debug, info};

/// Schema migrations, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Opens the SQLite database described by `config` and runs pending migrations.
///
/// In-memory databases are kept on a single connection that never expires,
/// since closing it would drop the data.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or a migration fails.
pub async fn init_pool(config: &StorageConfig) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = is_in_memory(&config.database_url);

    let mut options = SqlitePoolOptions::new().max_connections(if in_memory {
        1
    } else {
        config.max_connections
    });

    if in_memory {
        options = options
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    }

    let pool = options.connect(&config.database_url).await?;

    debug!(db.in_memory = in_memory, "Running offline store migrations");
    MIGRATOR.run(&pool).await?;

    info!(
        db.max_connections = config.max_connections,
        db.in_memory = in_memory,
        "Offline store ready"
    );

    Ok(pool)
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

// Re-export SqlitePool for convenience
pub use sqlx::SqlitePool;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_in_memory() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file.db?mode=memory"));
        assert!(!is_in_memory("sqlite://talebedu-offline.db?mode=rwc"));
    }

    #[tokio::test]
    async fn test_init_pool_creates_schema() {
        let pool = init_pool(&StorageConfig::in_memory()).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert!(names.contains(&"cached_records"));
        assert!(names.contains(&"sync_queue"));
        assert!(names.contains(&"sync_metadata"));
    }
}
