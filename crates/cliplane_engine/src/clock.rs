// SPDX-License-Identifier: MIT OR Apache-2.0
//! Monotonic clock sources for driving frames.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// A monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> f64;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually advanced clock for deterministic playback.
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    /// Create a clock at 0 ms
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `ms` milliseconds (negative values are ignored)
    pub fn advance(&self, ms: f64) {
        *self.now.lock() += ms.max(0.0);
    }

    /// Jump to `ms`, never moving backwards
    pub fn set(&self, ms: f64) {
        let mut now = self.now.lock();
        *now = now.max(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_monotonic() {
        let clock = ManualClock::new();
        let shared = clock.clone();
        clock.advance(16.0);
        shared.advance(-5.0);
        assert_eq!(clock.now_ms(), 16.0);
        shared.set(10.0);
        assert_eq!(clock.now_ms(), 16.0);
        shared.set(100.0);
        assert_eq!(clock.now_ms(), 100.0);
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
