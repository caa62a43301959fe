//! MIPS core timer as a [`Monotonic`] clock.
//!
//! CP0 `Count` is a free-running 32-bit counter at SYSCLK/2 (100 MHz on the
//! PIC32MZ DA), wrapping every ~43 s. [`CoreTimer`] widens it to 64 bits by
//! counting wraps between reads, so it stays monotonic as long as it is read
//! at least once per wrap period. Every bring-up poll reads it far more often.

use core::cell::Cell;
use core::num::NonZeroU32;

use embassy_time::Instant;
use platform::Monotonic;

/// CP0 `Count` rate at the 200 MHz system clock.
pub const CORE_TIMER_HZ: u32 = 100_000_000;

/// Source of raw 32-bit counter values.
pub trait CountSource {
    /// Current counter value.
    fn count(&self) -> u32;
}

/// CP0 register 9, select 0.
#[cfg(all(feature = "hardware", any(target_arch = "mips", target_arch = "mips32r6")))]
#[derive(Debug, Clone, Copy, Default)]
pub struct Cp0Count;

#[cfg(all(feature = "hardware", any(target_arch = "mips", target_arch = "mips32r6")))]
impl CountSource for Cp0Count {
    #[inline]
    fn count(&self) -> u32 {
        let count: u32;
        // SAFETY: `mfc0` from Count has no side effects and is always
        // permitted in kernel mode, where boot code runs.
        unsafe {
            core::arch::asm!("mfc0 {0}, $9, 0", out(reg) count, options(nomem, nostack));
        }
        count
    }
}

/// 64-bit monotonic clock over a wrapping 32-bit counter.
#[derive(Debug)]
pub struct CoreTimer<S> {
    source: S,
    ticks_per_us: NonZeroU32,
    last: Cell<u32>,
    wraps: Cell<u32>,
}

impl<S: CountSource> CoreTimer<S> {
    /// Clock over `source` counting at `count_hz`.
    ///
    /// Returns `None` below 1 MHz, where microsecond resolution is lost.
    pub fn new(source: S, count_hz: u32) -> Option<Self> {
        let ticks_per_us = NonZeroU32::new(count_hz.checked_div(1_000_000)?)?;
        let last = source.count();
        Some(Self {
            source,
            ticks_per_us,
            last: Cell::new(last),
            wraps: Cell::new(0),
        })
    }

    /// Current counter value widened to 64 bits with the wraps seen so far.
    pub fn ticks(&self) -> u64 {
        let now = self.source.count();
        if now < self.last.get() {
            self.wraps.set(self.wraps.get().wrapping_add(1));
        }
        self.last.set(now);
        (u64::from(self.wraps.get()) << 32) | u64::from(now)
    }
}

impl<S: CountSource> Monotonic for CoreTimer<S> {
    fn now(&self) -> Instant {
        let micros = self
            .ticks()
            .checked_div(u64::from(self.ticks_per_us.get()))
            .unwrap_or(0);
        Instant::from_micros(micros)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::vec::Vec;

    /// Replays a fixed sequence of counter values.
    struct Replay {
        values: Vec<u32>,
        next: Cell<usize>,
    }

    impl Replay {
        fn new(values: &[u32]) -> Self {
            Self {
                values: values.to_vec(),
                next: Cell::new(0),
            }
        }
    }

    impl CountSource for Replay {
        fn count(&self) -> u32 {
            let i = self.next.get();
            self.next.set(i.saturating_add(1));
            self.values.get(i).or(self.values.last()).copied().unwrap_or(0)
        }
    }

    #[test]
    fn wrap_is_widened() {
        let timer = CoreTimer::new(Replay::new(&[0xFFFF_FF00, 0xFFFF_FFF0, 0x10, 0x20]), CORE_TIMER_HZ)
            .unwrap_or_else(|| panic!("100 MHz is supported"));
        assert_eq!(timer.ticks(), 0xFFFF_FFF0);
        assert_eq!(timer.ticks(), 0x1_0000_0010);
        assert_eq!(timer.ticks(), 0x1_0000_0020);
    }

    #[test]
    fn instants_are_in_microseconds() {
        let timer = CoreTimer::new(Replay::new(&[0, 100, 250_000]), CORE_TIMER_HZ)
            .unwrap_or_else(|| panic!("100 MHz is supported"));
        assert_eq!(timer.now(), Instant::from_micros(1));
        assert_eq!(timer.now(), Instant::from_micros(2_500));
    }

    #[test]
    fn now_never_goes_backwards_across_wrap() {
        let timer = CoreTimer::new(Replay::new(&[0, 0xFFFF_0000, 5, 0x8000_0000]), CORE_TIMER_HZ)
            .unwrap_or_else(|| panic!("100 MHz is supported"));
        let a = timer.now();
        let b = timer.now();
        let c = timer.now();
        assert!(a <= b && b <= c);
    }

    #[test]
    fn sub_megahertz_counter_is_rejected() {
        assert!(CoreTimer::new(Replay::new(&[0]), 999_999).is_none());
    }
}
