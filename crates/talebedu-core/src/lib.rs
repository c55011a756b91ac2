//! # TalebEdu Core
//!
//! Foundational types shared by every TalebEdu sync crate:
//!
//! - [`errors`]: the local storage error type returned by the cache and the queue
//! - [`ids`]: local identifier and timestamp helpers
//!
//! # Example
//!
//! ```ignore
//! use talebedu_core::{StoreError, ids};
//!
//! let id = ids::generate_local_id();
//! let now = ids::now_millis();
//! ```

pub mod errors;
pub mod ids;

pub use errors::StoreError;
pub use ids::{generate_local_id, millis_to_datetime, now_millis};
