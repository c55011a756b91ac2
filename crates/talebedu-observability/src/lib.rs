//! TalebEdu Observability Module
//!
//! Provides configurable observability for the sync layer:
//! - Structured logging via `tracing` (console, plus rolling JSON files)
//! - Sync metrics via `metrics`, exported to Prometheus
//!
//! This module can be enabled or disabled at compile time via the `observability` feature flag.
//! At runtime, observability can be further controlled via the `OBSERVABILITY_ENABLED` environment variable.
//!
//! # Features
//!
//! - `observability` (default): Enables file logging and metrics
//!
//! # Examples
//!
//! ```no_run
//! use talebedu_observability::{init_metrics, init_tracing};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_tracing();
//!     let _metrics = init_metrics();
//!     // ... application code ...
//! }
//! ```

pub mod basic_logging;

#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

pub use basic_logging::init_basic_console_logging;

#[cfg(feature = "observability")]
pub use self::logging::init_tracing;
#[cfg(feature = "observability")]
pub use self::metrics::{
    PrometheusHandle, init_metrics, is_observability_enabled, set_pending_operations,
    track_connectivity_change, track_operation_enqueued, track_remote_fallback,
    track_replay_duration, track_replay_outcome,
};

// No-op stubs when observability is disabled
#[cfg(not(feature = "observability"))]
pub mod stubs {
    /// No-op observability check when feature disabled
    pub fn is_observability_enabled() -> bool {
        false
    }

    /// Console logging only when feature disabled
    pub fn init_tracing() {
        super::init_basic_console_logging();
    }

    /// No-op metrics initialization when feature disabled
    pub fn init_metrics() -> Option<()> {
        None
    }

    // No-op tracking functions
    pub fn track_operation_enqueued(_collection: &str, _operation: &str) {}
    pub fn track_replay_outcome(_result: &str) {}
    pub fn track_replay_duration(_duration_secs: f64) {}
    pub fn track_remote_fallback(_operation: &str) {}
    pub fn track_connectivity_change(_online: bool) {}
    pub fn set_pending_operations(_count: i64) {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
