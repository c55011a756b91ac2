//! Synchronized collections.
//!
//! A collection is a named group of records, cached locally under its store
//! name and mirrored to a remote table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The collections kept available offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Students,
    Teachers,
    Fees,
    Attendance,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Students,
        Collection::Teachers,
        Collection::Fees,
        Collection::Attendance,
    ];

    /// Name of the local store holding this collection.
    pub const fn store_name(self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Teachers => "teachers",
            Collection::Fees => "fees",
            Collection::Attendance => "attendance",
        }
    }

    /// Name of the remote table backing this collection.
    pub const fn table(self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Teachers => "teachers",
            Collection::Fees => "student_fees",
            Collection::Attendance => "attendance_records",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.store_name())
    }
}

/// Returned when a string names no known collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown collection '{0}' (expected one of: students, teachers, fees, attendance)")]
pub struct ParseCollectionError(pub String);

impl FromStr for Collection {
    type Err = ParseCollectionError;

    /// Accepts either the local store name or the remote table name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Collection::ALL
            .into_iter()
            .find(|c| c.store_name() == needle || c.table() == needle)
            .ok_or_else(|| ParseCollectionError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_table_names() {
        assert_eq!(Collection::Fees.store_name(), "fees");
        assert_eq!(Collection::Fees.table(), "student_fees");
        assert_eq!(Collection::Attendance.table(), "attendance_records");
    }

    #[test]
    fn test_parse_accepts_store_and_table_names() {
        assert_eq!("students".parse::<Collection>(), Ok(Collection::Students));
        assert_eq!(
            "attendance_records".parse::<Collection>(),
            Ok(Collection::Attendance)
        );
        assert_eq!(" Fees ".parse::<Collection>(), Ok(Collection::Fees));
        assert!("buses".parse::<Collection>().is_err());
    }

    #[test]
    fn test_serde_uses_store_name() {
        let json = serde_json::to_string(&Collection::Teachers).unwrap();
        assert_eq!(json, "\"teachers\"");
    }
}
