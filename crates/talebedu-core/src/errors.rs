//! Local storage errors.
//!
//! Everything that can go wrong while reading or writing the on-device
//! SQLite database ends up as a [`StoreError`]. These errors are never
//! retried by the stores themselves; they propagate to the caller.

/// Error type for local cache, queue and metadata operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Local database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record in collection '{collection}' has no string id")]
    MissingId { collection: String },

    #[error("Corrupt row in '{table}': {reason}")]
    Corrupt { table: &'static str, reason: String },
}

impl StoreError {
    pub fn missing_id(collection: impl Into<String>) -> Self {
        Self::MissingId {
            collection: collection.into(),
        }
    }

    pub fn corrupt(table: &'static str, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            table,
            reason: reason.into(),
        }
    }
}
