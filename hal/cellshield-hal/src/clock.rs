//! Wall clock abstraction
//!
//! Transaction timeouts are measured against this clock from the moment a
//! wait begins. Implementations typically wrap a free-running hardware timer.

/// Monotonic millisecond time source
pub trait Clock {
    /// Milliseconds since an arbitrary fixed epoch (usually boot)
    ///
    /// Must never go backwards. Takes `&mut self` because some timers need
    /// to latch a register pair to read a consistent 64-bit value.
    fn now_ms(&mut self) -> u64;

    /// Milliseconds elapsed since `since`
    fn elapsed_ms(&mut self, since: u64) -> u64 {
        self.now_ms().saturating_sub(since)
    }
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now_ms(&mut self) -> u64 {
        T::now_ms(self)
    }
}
