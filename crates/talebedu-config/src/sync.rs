//! Sync behaviour configuration.
//!
//! # Environment Variables
//!
//! - `SYNC_START_ONLINE`: initial connectivity state (default: `true`)
//! - `SYNC_MAX_ATTEMPTS`: replay attempts before an operation is dead-lettered
//!   (default: unset, meaning retry forever)
//! - `SYNC_QUEUE_REJECTED_WRITES`: queue writes the remote rejected with a 4xx
//!   instead of returning the rejection to the caller (default: `false`)
//! - `SYNC_PURGE_INTERVAL_SECONDS`: how often the worker purges synced
//!   operations (default: `300`)

use std::env;
use std::time::Duration;

use crate::parse_flag;

/// Connectivity, retry and housekeeping settings for the sync coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Connectivity state assumed at startup.
    pub start_online: bool,

    /// Replay attempts after which an operation is moved to the dead-letter
    /// list. `None` keeps retrying forever.
    pub max_attempts: Option<u32>,

    /// When true, writes the remote rejected (4xx) are queued like transient
    /// failures and retried on replay.
    pub queue_rejected_writes: bool,

    /// Interval between purges of synced operations.
    pub purge_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            start_online: true,
            max_attempts: None,
            queue_rejected_writes: false,
            purge_interval: Duration::from_secs(300),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            start_online: env::var("SYNC_START_ONLINE")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.start_online),
            max_attempts: env::var("SYNC_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|n| *n > 0),
            queue_rejected_writes: env::var("SYNC_QUEUE_REJECTED_WRITES")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.queue_rejected_writes),
            purge_interval: env::var("SYNC_PURGE_INTERVAL_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|n| *n > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.purge_interval),
        }
    }

    /// Set the dead-letter threshold. Zero means unbounded.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = (attempts > 0).then_some(attempts);
        self
    }

    /// Start in the given connectivity state.
    pub fn with_start_online(mut self, online: bool) -> Self {
        self.start_online = online;
        self
    }

    /// Queue rejected writes instead of surfacing them.
    pub fn with_queue_rejected_writes(mut self, queue: bool) -> Self {
        self.queue_rejected_writes = queue;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert!(config.start_online);
        assert_eq!(config.max_attempts, None);
        assert!(!config.queue_rejected_writes);
        assert_eq!(config.purge_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_builders() {
        let config = SyncConfig::default()
            .with_max_attempts(3)
            .with_start_online(false)
            .with_queue_rejected_writes(true);
        assert_eq!(config.max_attempts, Some(3));
        assert!(!config.start_online);
        assert!(config.queue_rejected_writes);
    }

    #[test]
    fn test_zero_max_attempts_is_unbounded() {
        let config = SyncConfig::default().with_max_attempts(0);
        assert_eq!(config.max_attempts, None);
    }
}
