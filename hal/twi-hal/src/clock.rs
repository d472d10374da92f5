//! Time source abstraction
//!
//! Poll timeouts and the FRAM settle delay are measured against a monotonic
//! millisecond counter that is allowed to wrap.

/// Monotonic millisecond clock
pub trait Clock {
    /// Current time in milliseconds
    ///
    /// The counter wraps at `u32::MAX`; consumers only ever look at
    /// differences between two readings.
    fn now_ms(&self) -> u32;

    /// Milliseconds elapsed since `reference` was read from this clock
    fn elapsed_since(&self, reference: u32) -> u32 {
        self.now_ms().wrapping_sub(reference)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}
