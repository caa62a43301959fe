//! DRAM boot sequence for the PIC32MZ DA.
//!
//! Initialization order (MUST be respected):
//!   1. Memory PLL: program `CFGMPLL`, wait for lock
//!   2. DDR2: ungate, PHY static setup, controller registers, JEDEC power-up
//!      commands, PHY self-calibration
//!
//! Runs once, from boot SRAM, before anything is placed in DRAM.

use ddr2::{
    initialize_dram, Ddr2Blocks, Ddr2Error, DramInitReport, MemoryClocks, TimeoutPolicy, WaitStage,
};
use platform::{Monotonic, PollOutcome, RegisterBus};
use thiserror_no_std::Error;

use crate::board::BoardProfile;
use crate::mpll::{MemoryPll, MpllError};

/// Ordered list of boot sequence steps for documentation and testing.
///
/// # Correctness Invariants
///
/// - The memory PLL must be locked before the controller is ungated: the
///   controller and PHY have no other clock.
/// - The PHY must be configured before the host command table is issued, or
///   the first commands go out with reset-default pad drive and ODT.
/// - `MEMCON.INIT_DONE` must not be set before the table drains; the
///   controller would start refreshing mid-sequence.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. MPLL: program CFGMPLL (IDIV 3, MULT 50, ODIV1 2, ODIV2 1) for a 200 MHz controller clock",
    "2. MPLL: wait for MPLLRDY and MPLLVREGRDY",
    "3. PMD7: unlock SYSKEY, ungate the DDR2 controller, relock",
    "4. PHY: DLL recalibration, pad control, SCL framing and latency",
    "5. Controller: MEMWIDTH, arbiter, address decode, refresh, power, delays, ODT, transfer",
    "6. Host commands: load the 12-entry JEDEC power-up table, issue, wait for drain",
    "7. PHY: self-calibration on both byte lanes",
];

/// Errors from DRAM boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootError {
    /// Memory PLL settings rejected before anything was written.
    #[error(transparent)]
    Mpll(#[from] MpllError),
    /// DDR2 bring-up failed.
    #[error(transparent)]
    Ddr2(#[from] Ddr2Error),
    /// The core timer runs too slowly to time hardware waits.
    #[error("core timer below 1 MHz")]
    CoreTimer,
}

/// What DRAM boot achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootReport {
    /// Clocks the memory PLL was programmed for.
    pub clocks: MemoryClocks,
    /// Memory PLL lock wait.
    pub mpll_lock: PollOutcome,
    /// DDR2 bring-up result.
    pub dram: DramInitReport,
}

impl BootReport {
    /// `true` if any hardware wait timed out.
    pub fn is_degraded(&self) -> bool {
        !self.mpll_lock.is_ready() || self.dram.is_degraded()
    }
}

/// Start the memory PLL and bring DRAM up for `profile`.
pub fn bring_up_dram<B, C>(
    bus: &mut B,
    clock: &C,
    profile: &BoardProfile,
) -> Result<BootReport, BootError>
where
    B: RegisterBus,
    C: Monotonic + ?Sized,
{
    let pll = MemoryPll::new(Ddr2Blocks::PIC32MZDA.syscfg);
    let clocks = pll.start(bus, &profile.mpll)?;
    let mpll_lock = pll.await_lock(bus, clock, profile.poll_policy());

    if let PollOutcome::TimedOut { polls, .. } = mpll_lock {
        if profile.timeout_policy == TimeoutPolicy::FailFast {
            return Err(Ddr2Error::HardwareTimeout {
                stage: WaitStage::MemoryPllLock,
                polls,
            }
            .into());
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("memory PLL not locked after {=u32} polls; continuing", polls);
        #[cfg(feature = "tracing")]
        tracing::warn!(polls, "memory PLL not locked; continuing");
    }

    let ctx = profile.boot_context(clocks);
    let dram = initialize_dram(bus, clock, &ctx)?;

    Ok(BootReport {
        clocks,
        mpll_lock,
        dram,
    })
}

// ── Hardware-only init ────────────────────────────────────────────────────────
//
// Only compiled for the MIPS target. Host tests never compile or link this
// module.

#[cfg(all(feature = "hardware", any(target_arch = "mips", target_arch = "mips32r6")))]
pub mod hardware {
    //! Entry point for the start-up code.

    use super::{bring_up_dram, BootError, BootReport};
    use crate::board::BoardProfile;
    use crate::core_timer::{Cp0Count, CoreTimer, CORE_TIMER_HZ};
    use crate::mmio::Kseg1Bus;

    /// Bring DRAM up on the starter kit using the real register file and
    /// core timer.
    ///
    /// # Safety
    ///
    /// - Must run in kernel mode, once, before anything is placed in DRAM.
    /// - No other code may touch SYSCFG, the DDR2 controller or the PHY while
    ///   this runs.
    pub unsafe fn bring_up_starter_kit_dram() -> Result<BootReport, BootError> {
        // SAFETY: forwarded from this function's contract.
        let mut bus = unsafe { Kseg1Bus::new() };
        let clock = CoreTimer::new(Cp0Count, CORE_TIMER_HZ).ok_or(BootError::CoreTimer)?;
        let profile = BoardProfile::pic32mzda_starter_kit();

        defmt::info!("DRAM boot: {=str}", profile.name.as_str());
        let report = bring_up_dram(&mut bus, &clock, &profile)?;
        if report.is_degraded() {
            defmt::warn!("DRAM up degraded: {=u64} bytes", report.dram.size_bytes);
        } else {
            defmt::info!("DRAM up: {=u64} bytes", report.dram.size_bytes);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_sequence_has_seven_steps_in_order() {
        assert_eq!(BOOT_SEQUENCE_STEPS.len(), 7);
        for (n, step) in (1..).zip(BOOT_SEQUENCE_STEPS) {
            assert!(step.starts_with(&format!("{n}. ")), "{step}");
        }
    }

    #[test]
    fn mpll_precedes_ddr2() {
        let pos = |needle: &str| BOOT_SEQUENCE_STEPS.iter().position(|s| s.contains(needle));
        assert!(pos("CFGMPLL") < pos("PMD7"));
        assert!(pos("PMD7") < pos("Host commands"));
        assert!(pos("Host commands") < pos("self-calibration"));
    }
}
