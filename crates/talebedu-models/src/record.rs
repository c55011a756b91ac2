//! The [`SyncRecord`] trait and helpers for cached JSON rows.
//!
//! Locally, every record is stored as a JSON object with a string `id`.
//! Deleting a record while the remote is unreachable replaces it with a
//! tombstone (`{"id": ..., "_deleted": true}`) until the delete is replayed.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::collections::Collection;

/// Field marking a cached record as locally deleted.
pub const TOMBSTONE_FIELD: &str = "_deleted";

/// A record type that belongs to exactly one synchronized collection.
///
/// Implementors are plain serde structs; the coordinator converts them to
/// and from the JSON stored in the cache.
pub trait SyncRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection this record type lives in.
    const COLLECTION: Collection;

    /// The record identifier, if one has been assigned.
    fn id(&self) -> Option<&str>;
}

/// Implements [`SyncRecord`] for a struct with an `id: Option<String>` field.
macro_rules! impl_sync_record {
    ($ty:ty, $collection:expr) => {
        impl $crate::record::SyncRecord for $ty {
            const COLLECTION: $crate::collections::Collection = $collection;

            fn id(&self) -> Option<&str> {
                self.id.as_deref().filter(|id| !id.is_empty())
            }
        }
    };
}

pub(crate) use impl_sync_record;

/// Extracts the non-empty string `id` of a JSON record.
pub fn record_id(record: &Value) -> Option<&str> {
    record
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Whether a cached record is a deletion tombstone.
pub fn is_tombstone(record: &Value) -> bool {
    record
        .get(TOMBSTONE_FIELD)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Builds the tombstone stored in place of a record deleted offline.
pub fn tombstone(id: &str) -> Value {
    json!({ "id": id, TOMBSTONE_FIELD: true })
}

/// Shallow-merges the top-level fields of `patch` into `base`.
///
/// A non-object `base` is replaced by the patch.
pub fn merge_patch(base: &mut Value, patch: &Value) {
    match (base.as_object_mut(), patch.as_object()) {
        (Some(target), Some(fields)) => {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        _ => *base = patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id() {
        assert_eq!(record_id(&json!({"id": "s1"})), Some("s1"));
        assert_eq!(record_id(&json!({"id": ""})), None);
        assert_eq!(record_id(&json!({"id": 7})), None);
        assert_eq!(record_id(&json!({"name": "Amal"})), None);
    }

    #[test]
    fn test_tombstone_round_trip() {
        let stone = tombstone("rec1");
        assert!(is_tombstone(&stone));
        assert_eq!(record_id(&stone), Some("rec1"));
        assert!(!is_tombstone(&json!({"id": "rec1", "_deleted": false})));
    }

    #[test]
    fn test_merge_patch_overwrites_top_level_fields() {
        let mut base = json!({"id": "rec1", "status": "present", "location": "gate"});
        merge_patch(&mut base, &json!({"status": "absent"}));
        assert_eq!(
            base,
            json!({"id": "rec1", "status": "absent", "location": "gate"})
        );
    }

    #[test]
    fn test_merge_patch_replaces_non_object_base() {
        let mut base = Value::Null;
        merge_patch(&mut base, &json!({"id": "x"}));
        assert_eq!(base, json!({"id": "x"}));
    }
}
