//! # TalebEdu Cache
//!
//! Durable on-device storage for the offline sync layer.
//!
//! This crate provides:
//! - [`LocalCache`]: the last known good copy of every record, per collection
//! - [`MetadataStore`]: small key/value facts about syncing (last replay time)
//!
//! Both are thin wrappers over the shared SQLite pool opened by
//! `talebedu-db`, so they survive process restarts.
//!
//! # Example
//!
//! ```ignore
//! use talebedu_cache::LocalCache;
//! use talebedu_models::Collection;
//! use serde_json::json;
//!
//! let cache = LocalCache::new(pool);
//! cache.put(Collection::Students, &json!({"id": "s1", "first_name": "Amal"})).await?;
//! let all = cache.get_all(Collection::Students).await?;
//! ```

pub mod metadata;
pub mod store;

pub use metadata::MetadataStore;
pub use store::LocalCache;
