//! Raw monotonic tick providers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::Ticks;

/// Source of raw monotonic ticks, sampled once per frame.
pub trait Clock: Send {
    /// Microseconds since some fixed origin. Must never go backwards.
    fn now(&self) -> Ticks;
}

/// Wall clock measured from construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// A clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        SystemClock { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Ticks {
        self.origin.elapsed().as_micros() as Ticks
    }
}

/// Hand-driven clock for tests and deterministic replay.
///
/// Clones share the same underlying counter, so a copy kept outside the
/// time chain can advance the copy handed into it.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Moves the clock forward by `ticks` microseconds.
    pub fn advance(&self, ticks: Ticks) {
        self.now.fetch_add(ticks, Ordering::Relaxed);
    }

    /// Jumps the clock to an absolute tick count.
    pub fn set(&self, ticks: Ticks) {
        self.now.store(ticks, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Ticks {
        self.now.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_state() {
        let a = ManualClock::default();
        let b = a.clone();
        a.advance(250);
        assert_eq!(b.now(), 250);
        b.set(1_000);
        assert_eq!(a.now(), 1_000);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
