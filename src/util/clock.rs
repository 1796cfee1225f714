//! Monotonic time source for latency measurement and timeouts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Monotonic clock abstraction. The core never formats wall-clock time; it
/// only needs a monotonically increasing instant for latency accounting and
/// a millisecond timestamp for event/audit records.
pub trait Clock: Send + Sync {
    /// A monotonic instant usable for duration arithmetic.
    fn now(&self) -> Instant;
    /// Milliseconds since the Unix epoch, for event timestamps. Not
    /// guaranteed monotonic; used only for display/audit purposes.
    fn now_ms(&self) -> u128;
}

/// Production clock backed by `std::time`.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_ms(&self) -> u128 {
        now_ms()
    }
}

/// Milliseconds since the Unix epoch using the system clock.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Deterministic clock for tests. `now()` advances only when `advance()` is
/// called, so latency and ordering assertions do not flake under load.
#[derive(Debug, Clone)]
pub struct FakeClock {
    origin: Instant,
    offset_ms: Arc<AtomicU64>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClock {
    /// Create a fake clock starting at "now" with a zero offset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance the fake clock by the given number of milliseconds.
    pub fn advance(&self, millis: u64) {
        self.offset_ms.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.origin + std::time::Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }

    fn now_ms(&self) -> u128 {
        u128::from(self.offset_ms.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_advances_on_demand() {
        let clock = FakeClock::new();
        let t0 = clock.now();
        clock.advance(50);
        let t1 = clock.now();
        assert_eq!(t1.duration_since(t0).as_millis(), 50);
    }

    #[test]
    fn system_clock_now_ms_is_nonzero() {
        let clock = SystemClock;
        assert!(clock.now_ms() > 0);
    }
}
