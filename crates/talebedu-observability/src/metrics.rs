use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

pub use metrics_exporter_prometheus::PrometheusHandle;

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if observability is enabled via OBSERVABILITY_ENABLED env var
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true) // Enabled by default
    })
}

fn metrics_addr() -> Option<SocketAddr> {
    let raw = std::env::var("METRICS_ADDR").ok()?;
    match raw.parse() {
        Ok(addr) => Some(addr),
        Err(e) => {
            warn!(metrics.addr = %raw, error = %e, "Ignoring invalid METRICS_ADDR");
            None
        }
    }
}

/// Initialize the Prometheus recorder.
///
/// When `METRICS_ADDR` is set, a scrape endpoint is served on that address.
/// Returns None if observability is disabled or the recorder could not be
/// installed. Must be called from within a tokio runtime.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("sync_replay_duration_seconds".to_string()),
        &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
    ) {
        Ok(builder) => builder,
        Err(e) => {
            warn!(error = %e, "Failed to configure metric buckets");
            return None;
        }
    };

    let handle = match metrics_addr() {
        Some(addr) => {
            let (recorder, exporter) = match builder.with_http_listener(addr).build() {
                Ok(parts) => parts,
                Err(e) => {
                    warn!(error = %e, "Failed to build Prometheus exporter");
                    return None;
                }
            };
            let handle = recorder.handle();
            if let Err(e) = metrics::set_global_recorder(recorder) {
                warn!(error = %e, "Metrics recorder already installed");
                return None;
            }
            tokio::spawn(async move {
                if exporter.await.is_err() {
                    warn!("Prometheus exporter stopped");
                }
            });
            info!(metrics.addr = %addr, "Prometheus exporter listening");
            handle
        }
        None => match builder.install_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "Failed to install Prometheus recorder");
                return None;
            }
        },
    };

    // Spawn upkeep task to clean stale metrics
    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

// Sync metrics helpers

/// Track an operation appended to the pending queue
pub fn track_operation_enqueued(collection: &str, operation: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!(
        "sync_operations_enqueued_total",
        "collection" => collection.to_string(),
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Track the outcome of replaying one operation: synced, failed or dead_lettered
pub fn track_replay_outcome(result: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("sync_replay_total", "result" => result.to_string()).increment(1);
}

pub fn track_replay_duration(duration_secs: f64) {
    if !is_observability_enabled() {
        return;
    }
    histogram!("sync_replay_duration_seconds").record(duration_secs);
}

/// Track a remote call that failed and was served from the cache instead
pub fn track_remote_fallback(operation: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("sync_remote_fallbacks_total", "operation" => operation.to_string()).increment(1);
}

pub fn track_connectivity_change(online: bool) {
    if !is_observability_enabled() {
        return;
    }
    gauge!("sync_online").set(if online { 1.0 } else { 0.0 });
    counter!(
        "sync_connectivity_changes_total",
        "state" => if online { "online" } else { "offline" }
    )
    .increment(1);
}

/// Set gauge for operations still waiting to be replayed
pub fn set_pending_operations(count: i64) {
    if !is_observability_enabled() {
        return;
    }
    gauge!("sync_pending_operations").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_without_recorder_is_noop() {
        track_operation_enqueued("students", "INSERT");
        track_replay_outcome("synced");
        track_replay_duration(0.2);
        track_remote_fallback("fetch");
        track_connectivity_change(true);
        set_pending_operations(3);
    }
}
