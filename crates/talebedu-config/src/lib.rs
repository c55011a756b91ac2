//! # TalebEdu Config
//!
//! Configuration types for the TalebEdu offline sync layer.
//!
//! Every structure here is loaded from environment variables with sensible
//! defaults:
//!
//! - [`storage`]: local SQLite database settings
//! - [`remote`]: remote REST backend location and credentials
//! - [`sync`]: connectivity, retry and purge behaviour
//!
//! # Example
//!
//! ```ignore
//! use talebedu_config::{RemoteConfig, StorageConfig, SyncConfig};
//!
//! let storage = StorageConfig::from_env();
//! let remote = RemoteConfig::from_env();
//! let sync = SyncConfig::from_env();
//! ```

pub mod remote;
pub mod storage;
pub mod sync;

pub use remote::RemoteConfig;
pub use storage::StorageConfig;
pub use sync::SyncConfig;

/// Interpret common truthy/falsy spellings of an environment flag.
///
/// Returns `None` for anything unrecognised so callers can fall back to
/// their default.
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
