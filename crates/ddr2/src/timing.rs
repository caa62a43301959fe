//! DRAM timing table.
//!
//! One [`TimingSpec`] describes one DDR2 part at one speed grade. Values are
//! copied from the part datasheet; conversion to cycles happens later against
//! the actual clocks (see [`crate::convert`]).

use crate::convert::TimingParam;

/// Timing parameters of a DDR2 part.
///
/// Field names follow JEDEC symbol names with the leading `t` dropped.
/// Latencies are in DRAM clocks; `burst_cycles` is in controller cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingSpec {
    /// Average periodic refresh interval (tREFI).
    pub refresh_interval: TimingParam,
    /// Refresh to active/refresh (tRFC).
    pub refresh_cycle: TimingParam,
    /// Write recovery (tWR).
    pub write_recovery: TimingParam,
    /// Precharge period (tRP).
    pub precharge: TimingParam,
    /// Activate to read/write (tRCD).
    pub ras_to_cas: TimingParam,
    /// Activate to activate, different bank (tRRD).
    pub ras_to_ras: TimingParam,
    /// Internal write to read (tWTR).
    pub write_to_read: TimingParam,
    /// Internal read to precharge (tRTP).
    pub read_to_precharge: TimingParam,
    /// Activate to precharge (tRAS).
    pub ras_min: TimingParam,
    /// Activate to activate, same bank (tRC).
    pub row_cycle: TimingParam,
    /// Four-activate window (tFAW).
    pub four_activate_window: TimingParam,
    /// Mode register set cycle (tMRD).
    pub mode_register_delay: TimingParam,
    /// DLL lock time (tDLLK), in DRAM clocks.
    pub dll_lock: TimingParam,
    /// Minimum CKE pulse width (tCKE).
    pub cke_min: TimingParam,
    /// Power-down exit (tXP).
    pub power_down_exit: TimingParam,
    /// Stable-power CKE-low hold before the first command (400 ns).
    pub cke_init: TimingParam,
    /// Data burst length in controller cycles.
    pub burst_cycles: u32,
    /// CAS read latency in DRAM clocks.
    pub cas_latency: u32,
}

impl TimingSpec {
    /// Micron MT47H64M16HR-3 (DDR2-667 part run at 400 MHz, CL5).
    pub const fn mt47h64m16hr_3() -> Self {
        Self {
            refresh_interval: TimingParam::ps(7_800_000),
            refresh_cycle: TimingParam::ps(127_500),
            write_recovery: TimingParam::ps(15_000),
            precharge: TimingParam::ps(12_500),
            ras_to_cas: TimingParam::ps(12_500),
            ras_to_ras: TimingParam::ps_or_clocks(7_500, 2),
            write_to_read: TimingParam::ps_or_clocks(7_500, 2),
            read_to_precharge: TimingParam::ps_or_clocks(7_500, 1), // BL/2 clocks
            ras_min: TimingParam::ps(45_000),
            row_cycle: TimingParam::ps(57_500),
            four_activate_window: TimingParam::ps(35_000),
            mode_register_delay: TimingParam::clocks(2),
            dll_lock: TimingParam::clocks(200),
            cke_min: TimingParam::clocks(3),
            power_down_exit: TimingParam::clocks(2),
            cke_init: TimingParam::ps(400_000),
            burst_cycles: 2,
            cas_latency: 5,
        }
    }

    /// Read latency (RL) in DRAM clocks. No additive latency is used.
    pub const fn read_latency(&self) -> u32 {
        self.cas_latency
    }

    /// Write latency (WL = RL - 1) in DRAM clocks.
    pub const fn write_latency(&self) -> u32 {
        self.read_latency().saturating_sub(1)
    }
}

impl Default for TimingSpec {
    fn default() -> Self {
        Self::mt47h64m16hr_3()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_latency_is_one_below_read_latency() {
        let t = TimingSpec::mt47h64m16hr_3();
        assert_eq!(t.read_latency(), 5);
        assert_eq!(t.write_latency(), 4);
    }

    #[test]
    fn write_latency_saturates() {
        let t = TimingSpec {
            cas_latency: 0,
            ..TimingSpec::mt47h64m16hr_3()
        };
        assert_eq!(t.write_latency(), 0);
    }
}
