//! Tracks availability of the external discovery/migration dependency.

use async_trait::async_trait;

use crate::core::types::HealthState;
use crate::util::Clock;

/// External collaborator: exposes a health indicator for the
/// discovery/migration service. A real deployment implements this against
/// its actual service-discovery client; the core never talks to that
/// service directly.
#[async_trait]
pub trait DiscoveryProbe: Send + Sync {
    /// Check current availability of the discovery dependency.
    async fn check(&self) -> bool;
}

/// Always-available probe, the default when no external dependency is wired
/// up (every task type behaves as ungated).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAvailableProbe;

#[async_trait]
impl DiscoveryProbe for AlwaysAvailableProbe {
    async fn check(&self) -> bool {
        true
    }
}

/// Test double whose answer is set by the test, not computed.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    available: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl StaticProbe {
    /// Create a probe that starts in the given availability state.
    #[must_use]
    pub fn new(available: bool) -> Self {
        Self {
            available: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(available)),
        }
    }

    /// Flip the reported availability.
    pub fn set_available(&self, available: bool) {
        self.available
            .store(available, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl DiscoveryProbe for StaticProbe {
    async fn check(&self) -> bool {
        self.available.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// Single boolean flag tracking the discovery dependency's health, plus the
/// bookkeeping needed to know when it last changed (a transition from
/// unavailable to available triggers a drain pass, see `core::dispatcher`).
pub struct HealthProbe {
    state: HealthState,
}

impl HealthProbe {
    /// Create a probe starting in the available state.
    #[must_use]
    pub fn new(clock: &dyn Clock) -> Self {
        Self {
            state: HealthState {
                discovery_available: true,
                last_checked_at: clock.now(),
            },
        }
    }

    /// Current cached state.
    #[must_use]
    pub fn state(&self) -> HealthState {
        self.state
    }

    /// Refresh the flag from a live check. Returns `true` if the dependency
    /// transitioned from unavailable to available (the caller should then
    /// run a drain pass to pick up gated tasks).
    pub fn refresh(&mut self, available: bool, clock: &dyn Clock) -> bool {
        let recovered = available && !self.state.discovery_available;
        self.state.discovery_available = available;
        self.state.last_checked_at = clock.now();
        recovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::SystemClock;

    #[test]
    fn recovery_is_detected_exactly_on_transition() {
        let clock = SystemClock;
        let mut probe = HealthProbe::new(&clock);
        assert!(!probe.refresh(true, &clock)); // already available, no transition
        assert!(!probe.refresh(false, &clock)); // going down is not a recovery
        assert!(probe.refresh(true, &clock)); // unavailable -> available
        assert!(!probe.refresh(true, &clock)); // staying available, no transition
    }
}
