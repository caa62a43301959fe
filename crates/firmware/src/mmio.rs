//! Register access through the uncached KSEG1 window.
//!
//! Physical register addresses are mapped to KSEG1 (`0xA000_0000 | phys`) so
//! every access bypasses the L1 cache and reaches the peripheral bus in
//! program order.

use platform::RegisterBus;

/// Base of the unmapped, uncached kernel segment.
pub const KSEG1: u32 = 0xA000_0000;

/// Mask selecting the physical part of a kernel-segment address.
const PHYSICAL_MASK: u32 = 0x1FFF_FFFF;

/// KSEG1 virtual address for physical address `phys`.
pub const fn kseg1(phys: u32) -> u32 {
    (phys & PHYSICAL_MASK) | KSEG1
}

/// The SoC register file, accessed with volatile 32-bit loads and stores.
///
/// Takes physical addresses; translation to KSEG1 happens on every access.
#[derive(Debug)]
pub struct Kseg1Bus {
    _private: (),
}

impl Kseg1Bus {
    /// Claim the register file.
    ///
    /// # Safety
    ///
    /// - Must run in kernel mode on a PIC32MZ, where KSEG1 is mapped.
    /// - Only one `Kseg1Bus` may be live; it stands in for exclusive
    ///   ownership of every register reachable through it.
    /// - Callers pass only word-aligned addresses of existing registers.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for Kseg1Bus {
    #[inline]
    fn read32(&mut self, addr: u32) -> u32 {
        let ptr = kseg1(addr) as usize as *const u32;
        // SAFETY: `Kseg1Bus::new` contract: kernel mode, aligned address of an
        // existing register, exclusive access.
        unsafe { core::ptr::read_volatile(ptr) }
    }

    #[inline]
    fn write32(&mut self, addr: u32, value: u32) {
        let ptr = kseg1(addr) as usize as *mut u32;
        // SAFETY: as for `read32`.
        unsafe { core::ptr::write_volatile(ptr, value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kseg1_translation() {
        assert_eq!(kseg1(0x1F8E_8000), 0xBF8E_8000);
        assert_eq!(kseg1(0x1F80_0100), 0xBF80_0100);
        // Already-virtual addresses are idempotent.
        assert_eq!(kseg1(0xBF8E_9100), 0xBF8E_9100);
        assert_eq!(kseg1(0x9F8E_9100), 0xBF8E_9100);
    }
}
