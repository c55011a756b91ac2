use talebedu_core::StoreError;

/// Errors surfaced by the sync coordinator.
///
/// Unreachable-remote failures never appear here; they are absorbed into a
/// cache read or an optimistic write plus a queued operation.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote refused a write made while online.
    #[error("Remote rejected the write with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("No remote backend configured (set SUPABASE_URL)")]
    NoRemote,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to open local database: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message() {
        let err = SyncError::Rejected {
            status: 409,
            message: "duplicate key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Remote rejected the write with status 409: duplicate key"
        );
    }

    #[test]
    fn test_storage_is_transparent() {
        let err = SyncError::from(StoreError::missing_id("fees"));
        assert_eq!(err.to_string(), "Record in collection 'fees' has no string id");
    }
}
