//! Connectivity oracle.
//!
//! Answers "are we online" for the strategies. The link state is fed by
//! whatever detects connectivity on the platform; the forced-offline flag is
//! an operator/test override. Strategies read both on every request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
struct State {
    link_up: AtomicBool,
    forced_offline: AtomicBool,
}

/// Shared connectivity handle. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct Connectivity {
    state: Arc<State>,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl Connectivity {
    /// Link up, not forced offline.
    pub fn new() -> Self {
        Self { state: Arc::new(State { link_up: AtomicBool::new(true), forced_offline: AtomicBool::new(false) }) }
    }

    pub fn is_online(&self) -> bool {
        self.state.link_up.load(Ordering::SeqCst) && !self.state.forced_offline.load(Ordering::SeqCst)
    }

    /// Force offline mode on or off, regardless of the link state.
    pub fn force_offline(&self, offline: bool) {
        let previous = self.state.forced_offline.swap(offline, Ordering::SeqCst);
        if previous != offline {
            tracing::info!(forced_offline = offline, "connectivity override changed");
        }
    }

    pub fn is_forced_offline(&self) -> bool {
        self.state.forced_offline.load(Ordering::SeqCst)
    }

    /// Report the platform link state.
    pub fn set_link_up(&self, up: bool) {
        let previous = self.state.link_up.swap(up, Ordering::SeqCst);
        if previous != up {
            tracing::debug!(link_up = up, "link state changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_online() {
        let connectivity = Connectivity::new();
        assert!(connectivity.is_online());
        assert!(!connectivity.is_forced_offline());
    }

    #[test]
    fn test_force_offline_toggle() {
        let connectivity = Connectivity::new();
        connectivity.force_offline(true);
        assert!(!connectivity.is_online());
        connectivity.force_offline(false);
        assert!(connectivity.is_online());
    }

    #[test]
    fn test_link_down_is_offline_even_without_override() {
        let connectivity = Connectivity::new();
        connectivity.set_link_up(false);
        assert!(!connectivity.is_online());
        assert!(!connectivity.is_forced_offline());
    }

    #[test]
    fn test_clones_share_state() {
        let connectivity = Connectivity::new();
        let observer = connectivity.clone();
        connectivity.force_offline(true);
        assert!(!observer.is_online());
    }
}
