//! System configuration registers touched during bring-up: the unlock key,
//! the peripheral module disable bit gating the DDR2 controller, and the
//! memory PLL that clocks it.

/// Physical base address of the system configuration block.
pub const SYSCFG_BASE: u32 = 0x1F80_0000;

/// Offset of `SYSKEY`.
pub const SYSKEY: u32 = 0x30;

/// Offset of `PMD7`.
pub const PMD7: u32 = 0xA0;

/// Offset of the `PMD7CLR` alias: writing ones clears those bits in `PMD7`.
pub const PMD7_CLR: u32 = 0xA4;

/// Offset of `CFGMPLL`.
pub const CFGMPLL: u32 = 0x100;

/// Values written to `SYSKEY`, in order, to unlock protected registers.
/// The leading zero resets the unlock state machine.
pub const UNLOCK_SEQUENCE: [u32; 3] = [0, 0xAA99_6655, 0x5566_99AA];

/// Value written to `SYSKEY` to relock.
pub const LOCK: u32 = 0;

register! {
    /// Peripheral module disable 7.
    pub struct Pmd7: "PMD7" @ 0xA0 {
        /// DDR2 controller clock gated off.
        ddr2_disabled: bool => DDR2_DISABLED [28, 1],
    }
}

register! {
    /// Memory PLL configuration and status.
    pub struct CfgMpll: "CFGMPLL" @ 0x100 {
        /// Reference input divider.
        input_divider: u32 => IDIV [0, 6],
        /// Internal reference voltage selection.
        vref_control: u32 => INTVREFCON [6, 2],
        /// Feedback multiplier.
        multiplier: u32 => MULT [8, 8],
        /// PLL voltage regulator disabled.
        vreg_disable: bool => VREG_DIS [22, 1],
        /// PLL voltage regulator ready (read-only).
        vreg_ready: bool => VREG_RDY [23, 1],
        /// First output divider.
        output_divider1: u32 => ODIV1 [24, 3],
        /// Second output divider.
        output_divider2: u32 => ODIV2 [27, 3],
        /// PLL disabled.
        disable: bool => DIS [30, 1],
        /// PLL locked (read-only).
        ready: bool => RDY [31, 1],
    }
}

impl CfgMpll {
    /// PLL locked with its regulator up.
    pub const fn locked(&self) -> bool {
        self.ready && self.vreg_ready
    }
}
