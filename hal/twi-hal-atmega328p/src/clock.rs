//! Millisecond clock
//!
//! The ATmega has no free-running millisecond counter, so the application
//! configures a 1 kHz timer interrupt and calls [`MillisCounter::tick`] from
//! it. 32-bit atomics are emulated with a critical section on AVR.

use portable_atomic::{AtomicU32, Ordering};
use twi_hal::Clock;

/// Millisecond counter shared between a timer ISR and the bus engine
pub struct MillisCounter {
    millis: AtomicU32,
}

impl Default for MillisCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl MillisCounter {
    /// Create a counter starting at zero
    pub const fn new() -> Self {
        Self {
            millis: AtomicU32::new(0),
        }
    }

    /// Advance the counter by one millisecond
    ///
    /// Call from the timer compare interrupt.
    pub fn tick(&self) {
        self.millis.fetch_add(1, Ordering::Relaxed);
    }
}

impl Clock for MillisCounter {
    fn now_ms(&self) -> u32 {
        self.millis.load(Ordering::Relaxed)
    }
}
