//! Local identifier and timestamp helpers.
//!
//! Records created while offline get a UUID v4 so the remote backend can
//! accept them verbatim on replay. Timestamps are stored as milliseconds
//! since the Unix epoch.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a fresh identifier for an optimistic record or a queued operation.
pub fn generate_local_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a stored millisecond timestamp back into a `DateTime<Utc>`.
///
/// Out-of-range values collapse to the Unix epoch.
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
