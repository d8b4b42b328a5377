//! Monotonic time source
//!
//! Transactions are bounded by deadlines measured against a [`Clock`].
//! Sleeping is left to `embedded_hal::delay::DelayNs`, which every chip
//! HAL already provides.

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin
    ///
    /// Must never go backwards.
    fn now_ms(&mut self) -> u64;

    /// Milliseconds elapsed since `start`, saturating at zero
    fn elapsed_since(&mut self, start: u64) -> u64 {
        self.now_ms().saturating_sub(start)
    }
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn now_ms(&mut self) -> u64 {
        (**self).now_ms()
    }
}
