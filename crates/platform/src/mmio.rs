//! 32-bit memory-mapped register access
//!
//! Every register touched during DRAM bring-up is a naturally aligned 32-bit
//! word addressed by its *physical* address (e.g. `0x1F8E_8000` for the DDR2
//! controller). How that physical address becomes a CPU pointer (KSEG1
//! uncached window on the PIC32MZ) is the implementor's concern.
//!
//! # Ownership
//!
//! Bring-up runs single-threaded with exclusive ownership of the register
//! blocks, expressed by `&mut` access to the bus. A read-modify-write through
//! [`RegisterBus::modify32`] is therefore never observed half-done. Any port to
//! a concurrent environment must wrap each such group in a critical section.

/// Register read/write primitive.
///
/// Implementations:
/// - the board crate's MMIO bus (volatile pointer access)
/// - [`crate::mocks::MockRegisterBus`] in host tests (write log, scripted reads)
///
/// Reads take `&mut self`: status registers change under the caller's feet and
/// the mock advances its read script on every access.
pub trait RegisterBus {
    /// Read the 32-bit register at physical address `addr`.
    fn read32(&mut self, addr: u32) -> u32;

    /// Write `value` to the 32-bit register at physical address `addr`.
    fn write32(&mut self, addr: u32, value: u32);

    /// Read-modify-write the register at `addr`.
    fn modify32<F>(&mut self, addr: u32, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read32(addr);
        self.write32(addr, f(value));
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read32(&mut self, addr: u32) -> u32 {
        (**self).read32(addr)
    }

    fn write32(&mut self, addr: u32, value: u32) {
        (**self).write32(addr, value);
    }
}

/// A register block at a fixed physical base address.
///
/// Offsets are byte offsets within the block. Address arithmetic wraps rather
/// than panics; all blocks used by this workspace sit far from `u32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterBlock {
    base: u32,
}

impl RegisterBlock {
    /// Register block starting at physical address `base`.
    pub const fn new(base: u32) -> Self {
        Self { base }
    }

    /// Physical base address of the block.
    pub const fn base(self) -> u32 {
        self.base
    }

    /// Physical address of the register at byte `offset`.
    pub const fn at(self, offset: u32) -> u32 {
        self.base.wrapping_add(offset)
    }
}
