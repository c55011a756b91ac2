//! Queued mutations awaiting confirmation by the remote backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::collections::Collection;
use crate::record::record_id;

/// The kind of mutation a queued operation replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

impl OperationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            OperationKind::Insert => "INSERT",
            OperationKind::Update => "UPDATE",
            OperationKind::Delete => "DELETE",
        }
    }
}

/// Lifecycle of a queued operation.
///
/// `Pending` operations are replayed in FIFO order. `Synced` ones wait for the
/// next purge. `DeadLettered` ones exhausted their attempts or were rejected
/// by the remote and are only replayed again after an explicit requeue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Synced,
    DeadLettered,
}

impl OperationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Synced => "synced",
            OperationStatus::DeadLettered => "dead_lettered",
        }
    }
}

/// Returned when a stored operation kind or status is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognised {field} '{value}'")]
pub struct ParseOperationError {
    pub field: &'static str,
    pub value: String,
}

impl FromStr for OperationKind {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSERT" => Ok(OperationKind::Insert),
            "UPDATE" => Ok(OperationKind::Update),
            "DELETE" => Ok(OperationKind::Delete),
            other => Err(ParseOperationError {
                field: "operation",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for OperationStatus {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OperationStatus::Pending),
            "synced" => Ok(OperationStatus::Synced),
            "dead_lettered" => Ok(OperationStatus::DeadLettered),
            other => Err(ParseOperationError {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutation that has not yet been confirmed by the remote backend.
///
/// The payload is never modified after enqueue; only `status`, `attempts`
/// and `last_error` change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOperation {
    /// Locally generated identifier.
    pub id: String,
    /// Insertion order; replay follows ascending sequence.
    pub sequence: i64,
    pub collection: Collection,
    pub kind: OperationKind,
    /// The record (INSERT), the patch plus `id` (UPDATE) or `{id}` (DELETE).
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub status: OperationStatus,
    /// Replay attempts that failed so far.
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl QueuedOperation {
    /// Whether the remote has confirmed this operation.
    pub fn synced(&self) -> bool {
        self.status == OperationStatus::Synced
    }

    /// Id of the record this operation targets.
    pub fn record_id(&self) -> Option<&str> {
        record_id(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_parse_round_trip() {
        for kind in [
            OperationKind::Insert,
            OperationKind::Update,
            OperationKind::Delete,
        ] {
            assert_eq!(kind.as_str().parse::<OperationKind>(), Ok(kind));
        }
        assert!("UPSERT".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "dead_lettered".parse::<OperationStatus>(),
            Ok(OperationStatus::DeadLettered)
        );
        let err = "done".parse::<OperationStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Unrecognised status 'done'");
    }

    #[test]
    fn test_synced_and_record_id() {
        let op = QueuedOperation {
            id: "op1".into(),
            sequence: 1,
            collection: Collection::Attendance,
            kind: OperationKind::Update,
            payload: json!({"id": "rec1", "status": "absent"}),
            created_at: Utc::now(),
            status: OperationStatus::Pending,
            attempts: 0,
            last_error: None,
        };
        assert!(!op.synced());
        assert_eq!(op.record_id(), Some("rec1"));
    }
}
