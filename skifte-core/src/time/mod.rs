//! ## skifte-core::time
//! **Virtual clock for deterministic simulation**
//!
//! ### Expectations:
//! - Nanosecond resolution
//! - Seedable and deterministic
//! - Lock-free operations

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Converts a duration given in (possibly fractional) seconds to
/// virtual-clock nanoseconds. Negative inputs clamp to zero.
#[inline]
pub fn secs_to_ns(secs: f64) -> u64 {
    if secs <= 0.0 {
        return 0;
    }
    (secs * NANOS_PER_SEC as f64) as u64
}

/// A simple virtual clock that advances in nanoseconds.
///
/// Exactly one run owns one clock; clones share the same counter so the
/// scheduler and any observer read the same instant.
#[derive(Clone)]
pub struct VirtualClock {
    // A shared atomic counter representing the current simulation time in nanoseconds.
    offset: Arc<AtomicU64>,
}

impl VirtualClock {
    /// Creates a new virtual clock with the given starting time.
    pub fn new(start_ns: u64) -> Self {
        Self {
            offset: Arc::new(AtomicU64::new(start_ns)),
        }
    }

    /// Returns the current virtual time in nanoseconds.
    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.offset.load(Ordering::Acquire)
    }

    /// Advances the virtual clock by the given number of nanoseconds.
    #[inline]
    pub fn advance(&self, ns: u64) {
        self.offset.fetch_add(ns, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_initial_value() {
        let clock = VirtualClock::new(100);
        assert_eq!(clock.now_ns(), 100);
    }

    #[test]
    fn test_clock_advance() {
        let clock = VirtualClock::new(0);
        clock.advance(500);
        assert_eq!(clock.now_ns(), 500);
        clock.advance(250);
        assert_eq!(clock.now_ns(), 750);
    }

    #[test]
    fn test_secs_to_ns() {
        assert_eq!(secs_to_ns(1.0), NANOS_PER_SEC);
        assert_eq!(secs_to_ns(0.5), NANOS_PER_SEC / 2);
        assert_eq!(secs_to_ns(-3.0), 0);
    }
}
