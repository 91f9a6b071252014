//! Monotonic microsecond time source

/// Free-running microsecond clock. Wraps around at `u32::MAX`; callers compare timestamps with
/// wrapping subtraction.
pub trait PulseClock {
    fn micros(&self) -> u32;
}

impl<C: PulseClock + ?Sized> PulseClock for &C {
    #[inline]
    fn micros(&self) -> u32 {
        (**self).micros()
    }
}
