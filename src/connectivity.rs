//! Connectivity monitor.
//!
//! Holds the process-wide ONLINE/OFFLINE flag. The embedding runtime calls
//! [`ConnectivityMonitor::set_online`] on network-change events; nothing here
//! probes the network.

use talebedu_observability::track_connectivity_change;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug)]
pub struct ConnectivityMonitor {
    state: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (state, _) = watch::channel(initially_online);
        Self { state }
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Records a connectivity change. Returns whether the state changed;
    /// setting the current value notifies nobody.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            info!(online, "Connectivity changed");
            track_connectivity_change(online);
        }

        changed
    }

    /// Stream of connectivity states. The receiver starts at the current
    /// value, marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        assert!(ConnectivityMonitor::new(true).is_online());
        assert!(!ConnectivityMonitor::new(false).is_online());
    }

    #[test]
    fn test_redundant_transition_is_ignored() {
        let monitor = ConnectivityMonitor::new(true);
        let rx = monitor.subscribe();

        assert!(!monitor.set_online(true));
        assert!(!rx.has_changed().unwrap());

        assert!(monitor.set_online(false));
        assert!(rx.has_changed().unwrap());
        assert!(!monitor.is_online());
    }

    #[tokio::test]
    async fn test_subscriber_sees_transitions() {
        let monitor = ConnectivityMonitor::new(false);
        let mut rx = monitor.subscribe();

        monitor.set_online(true);
        rx.changed().await.unwrap();

        assert!(*rx.borrow_and_update());
    }
}
