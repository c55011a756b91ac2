//! # TalebEdu Models
//!
//! Data structures shared by the offline store and the sync coordinator.
//!
//! # Modules
//!
//! - [`collections`]: the synchronized collections and their remote tables
//! - [`record`]: the [`SyncRecord`] trait and JSON helpers for cached rows
//! - [`students`], [`teachers`], [`fees`], [`attendance`]: typed records
//! - [`operations`]: queued mutations awaiting remote confirmation
//!
//! # Example
//!
//! ```ignore
//! use talebedu_models::{Collection, Student, SyncRecord};
//!
//! let student = Student {
//!     first_name: Some("Amal".into()),
//!     ..Default::default()
//! };
//! assert_eq!(Student::COLLECTION, Collection::Students);
//! ```

pub mod attendance;
pub mod collections;
pub mod fees;
pub mod operations;
pub mod record;
pub mod students;
pub mod teachers;

// Re-export commonly used types at crate root
pub use attendance::AttendanceRecord;
pub use collections::{Collection, ParseCollectionError};
pub use fees::Fee;
pub use operations::{OperationKind, OperationStatus, ParseOperationError, QueuedOperation};
pub use record::{SyncRecord, TOMBSTONE_FIELD, is_tombstone, merge_patch, record_id, tombstone};
pub use students::Student;
pub use teachers::Teacher;
