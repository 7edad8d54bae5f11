//=========================================================================
// Animation Clock
//=========================================================================
//
// Monotonic time source (seconds) shared by storyboards and eye-catches.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

//=== Clock Trait =========================================================

/// Monotonic time source in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Clock handle shared between the render loop and animated objects.
pub type SharedClock = Arc<dyn Clock>;

//=== SystemClock =========================================================

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

//=== ManualClock =========================================================

/// Externally driven clock for deterministic replay and tests.
///
/// Stores the time as `f64` bits in an atomic so it can be shared with
/// the render thread.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    /// Sets the current time.
    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::Release);
    }

    /// Moves the current time forward by `seconds`.
    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_given_time() {
        let clock = ManualClock::new(3.5);
        assert_eq!(clock.now(), 3.5);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1.0);
        clock.advance(0.25);
        clock.advance(0.25);
        assert!((clock.now() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn shared_clock_is_object_safe() {
        let clock: SharedClock = Arc::new(ManualClock::new(2.0));
        assert_eq!(clock.now(), 2.0);
    }
}
