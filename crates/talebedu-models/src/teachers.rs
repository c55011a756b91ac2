//! Teacher records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collections::Collection;
use crate::record::impl_sync_record;

/// A teacher row as cached offline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nfc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Teacher {
    /// Whether the teacher is assigned to the given class.
    pub fn teaches_class(&self, class: &str) -> bool {
        self.classes
            .as_ref()
            .is_some_and(|classes| classes.iter().any(|c| c == class))
    }
}

impl_sync_record!(Teacher, Collection::Teachers);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_teaches_class() {
        let teacher: Teacher = serde_json::from_value(json!({
            "id": "t1",
            "employee_id": "EMP-001",
            "classes": ["5A", "6B"]
        }))
        .unwrap();
        assert!(teacher.teaches_class("6B"));
        assert!(!teacher.teaches_class("7C"));
    }

    #[test]
    fn test_null_arrays_deserialize_as_none() {
        let teacher: Teacher =
            serde_json::from_value(json!({"id": "t2", "subjects": null})).unwrap();
        assert_eq!(teacher.subjects, None);
        assert!(!teacher.teaches_class("5A"));
    }
}
