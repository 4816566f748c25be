//! Monotonic time source for timer arithmetic.
//!
//! Every store in the subsystem measures time in monotonic milliseconds
//! from a single shared [`TimeSource`], so expiry arithmetic is immune to
//! wall-clock steps (NTP adjustments, manual clock changes). Wall-clock
//! time appears only on outbound notification timestamps, never in timer
//! comparisons.
//!
//! The clock is an owned object constructed at subsystem init -- there is
//! no ambient/static time state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A source of monotonic milliseconds.
///
/// Implementations must be cheap and non-blocking: `now_millis` is called
/// on every store operation, including hot read paths.
pub trait TimeSource: Send + Sync {
    /// Milliseconds elapsed on this source's monotonic timeline.
    fn now_millis(&self) -> u64;
}

/// Production time source backed by [`Instant`].
///
/// The timeline origin is the moment of construction; only differences
/// ever matter, so the origin is arbitrary.
pub struct MonotonicClock {
    /// Origin instant all readings are measured from.
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose timeline starts now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Manually advanced time source for tests.
///
/// Time only moves when [`advance`](Self::advance) is called, which makes
/// expiry behavior fully deterministic in tests regardless of scheduler
/// timing.
#[derive(Debug, Default)]
pub struct ManualClock {
    /// Current reading in milliseconds.
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading 0 ms.
    pub const fn new() -> Self {
        Self {
            now: AtomicU64::new(0),
        }
    }

    /// Move the clock forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Set the clock to an absolute reading.
    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now_millis();
        let b = clock.now_millis();
        assert!(b >= a);
    }

    #[test]
    fn manual_clock_starts_at_zero() {
        let clock = ManualClock::new();
        assert_eq!(clock.now_millis(), 0);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        clock.advance(1_500);
        assert_eq!(clock.now_millis(), 1_500);
        clock.advance(500);
        assert_eq!(clock.now_millis(), 2_000);
    }

    #[test]
    fn manual_clock_set_overrides() {
        let clock = ManualClock::new();
        clock.advance(100);
        clock.set(42);
        assert_eq!(clock.now_millis(), 42);
    }
}
