//! PHY static configuration and self-calibration.

use platform::{poll_until, Monotonic, PollOutcome, PollPolicy, RegisterBlock, RegisterBus};

use crate::error::FieldOverflow;
use crate::log::{ddr_warn, debug};
use crate::regs::phy::{DllRecalib, PadCtrl, SclConfig0, SclConfig1, SclLatency, SclStart};
use crate::regs::Register;
use crate::timing::TimingSpec;

/// Board-level PHY tuning.
///
/// Drive and termination codes depend on the board layout; the defaults
/// suit the PIC32MZ DA starter kit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhyConfig {
    /// Delay-line start value.
    pub dll_delay_start: u32,
    /// Periodic recalibration interval.
    pub recalib_count: u32,
    /// ODT pull-down strength code.
    pub odt_pulldown: u32,
    /// ODT pull-up strength code.
    pub odt_pullup: u32,
    /// PFET drive strength code.
    pub drive_strength_pfet: u32,
    /// NFET drive strength code.
    pub drive_strength_nfet: u32,
    /// DQS preamble delay.
    pub preamble_delay: u32,
    /// Capture clock alignment delay.
    pub capture_clock_delay: u32,
    /// DDR clock alignment delay.
    pub ddr_clock_delay: u32,
}

impl PhyConfig {
    /// Starter kit tuning.
    pub const fn pic32mzda_starter_kit() -> Self {
        Self {
            dll_delay_start: 3,
            recalib_count: 0x10,
            odt_pulldown: 2,
            odt_pullup: 3,
            drive_strength_pfet: 0xE,
            drive_strength_nfet: 0xE,
            preamble_delay: 2,
            capture_clock_delay: 3,
            ddr_clock_delay: 4,
        }
    }
}

impl Default for PhyConfig {
    fn default() -> Self {
        Self::pic32mzda_starter_kit()
    }
}

/// Typed PHY register set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhyImage {
    /// Delay-line recalibration.
    pub dll_recalib: DllRecalib,
    /// Pads.
    pub pad_ctrl: PadCtrl,
    /// Calibration framing, read side.
    pub scl_config0: SclConfig0,
    /// Calibration framing, write side.
    pub scl_config1: SclConfig1,
    /// Calibration clock alignment.
    pub scl_latency: SclLatency,
}

impl PhyImage {
    /// PHY registers for `config` and the latencies in `timing`.
    pub fn compute(config: &PhyConfig, timing: &TimingSpec) -> Self {
        Self {
            dll_recalib: DllRecalib {
                recalib_count: config.recalib_count,
                disable_recalib: false,
                delay_start: config.dll_delay_start,
            },
            pad_ctrl: PadCtrl {
                odt_select: true,
                odt_enable: true,
                drive_select: 0,
                odt_pulldown: config.odt_pulldown,
                odt_pullup: config.odt_pullup,
                extra_oen_clk: false,
                no_external_dll: true,
                dlr_dft_write_cmd: true,
                half_rate: true,
                drive_strength_pfet: config.drive_strength_pfet,
                drive_strength_nfet: config.drive_strength_nfet,
                receiver_enable: true,
                preamble_delay: config.preamble_delay,
            },
            scl_config0: SclConfig0 {
                burst8: true,
                ddr_connected: true,
                read_cas_latency: timing.read_latency(),
                odt_cs_on_write: true,
            },
            scl_config1: SclConfig1 {
                cs0_enable: true,
                write_cas_latency: timing.write_latency(),
            },
            scl_latency: SclLatency {
                capture_clock_delay: config.capture_clock_delay,
                ddr_clock_delay: config.ddr_clock_delay,
            },
        }
    }

    /// Pack every register, in programming order.
    pub fn encode(&self) -> Result<[(u32, u32); 5], FieldOverflow> {
        Ok([
            (DllRecalib::OFFSET, self.dll_recalib.encode()?),
            (PadCtrl::OFFSET, self.pad_ctrl.encode()?),
            (SclConfig0::OFFSET, self.scl_config0.encode()?),
            (SclConfig1::OFFSET, self.scl_config1.encode()?),
            (SclLatency::OFFSET, self.scl_latency.encode()?),
        ])
    }
}

/// Write packed PHY registers.
pub fn program_static<B: RegisterBus>(bus: &mut B, phy: RegisterBlock, words: &[(u32, u32)]) {
    for &(offset, value) in words {
        bus.write32(phy.at(offset), value);
    }
    debug!("PHY static configuration written");
}

/// Result of a calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationOutcome {
    /// Both byte lanes passed.
    Passed {
        /// Status reads made.
        polls: u32,
    },
    /// The pass bits never both came up.
    TimedOut {
        /// Status reads made.
        polls: u32,
        /// Last status word read, for diagnosing which lane failed.
        last_status: u32,
    },
}

impl CalibrationOutcome {
    /// `true` if calibration passed.
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}

/// Triggers PHY self-calibration and waits for the result.
#[derive(Debug, Clone, Copy)]
pub struct PhyCalibrator {
    phy: RegisterBlock,
}

impl PhyCalibrator {
    /// Calibrator for the PHY at `phy`.
    pub const fn new(phy: RegisterBlock) -> Self {
        Self { phy }
    }

    /// Start calibration and poll for both lanes to pass.
    ///
    /// A timeout is reported, not raised; memory may still work with the
    /// reset-default delays.
    pub fn calibrate<B, C>(
        &self,
        bus: &mut B,
        clock: &C,
        policy: PollPolicy,
    ) -> Result<CalibrationOutcome, FieldOverflow>
    where
        B: RegisterBus,
        C: Monotonic + ?Sized,
    {
        let addr = self.phy.at(SclStart::OFFSET);
        let start = SclStart {
            enable: true,
            start: true,
            ..SclStart::default()
        }
        .encode()?;
        bus.write32(addr, start);

        let mut last_status = 0;
        let outcome = poll_until(clock, policy, || {
            last_status = bus.read32(addr);
            SclStart::decode(last_status).passed()
        });

        Ok(match outcome {
            PollOutcome::Ready { polls } => {
                debug!("PHY calibration passed after {} polls", polls);
                CalibrationOutcome::Passed { polls }
            }
            PollOutcome::TimedOut { polls, .. } => {
                ddr_warn!(
                    "PHY calibration did not pass after {} polls (status {})",
                    polls, last_status
                );
                CalibrationOutcome::TimedOut { polls, last_status }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use embassy_time::{Duration, Instant};
    use platform::mocks::{FakeClock, MockRegisterBus};

    const PHY: RegisterBlock = RegisterBlock::new(0x1F8E_9100);

    fn words() -> [(u32, u32); 5] {
        PhyImage::compute(&PhyConfig::default(), &TimingSpec::mt47h64m16hr_3())
            .encode()
            .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn static_words_for_starter_kit() {
        assert_eq!(
            words(),
            [
                (0x24, 0x3000_1000),
                (0x20, 0x50EE_62E3),
                (0x18, 0x0100_0053),
                (0x1C, 0x0000_0401),
                (0x0C, 0x0000_0043),
            ]
        );
    }

    #[test]
    fn calibration_passes_when_both_lanes_report() {
        let mut bus = MockRegisterBus::new();
        bus.script_reads(0x1F8E_9100, &[0x1, 0x2, 0x3]);
        let clock = FakeClock::stepping(Duration::from_micros(1));
        let outcome = PhyCalibrator::new(PHY).calibrate(&mut bus, &clock, PollPolicy::default());
        assert_eq!(outcome, Ok(CalibrationOutcome::Passed { polls: 3 }));
        assert_eq!(bus.writes_to(0x1F8E_9100), vec![0x1400_0000]);
    }

    #[test]
    fn calibration_timeout_with_frozen_clock_is_bounded() {
        let mut bus = MockRegisterBus::new();
        bus.script_reads(0x1F8E_9100, &[0x1]);
        let clock = FakeClock::frozen(Instant::from_ticks(0));
        let policy = PollPolicy::default().max_polls(64);
        let outcome = PhyCalibrator::new(PHY).calibrate(&mut bus, &clock, policy);
        assert_eq!(
            outcome,
            Ok(CalibrationOutcome::TimedOut {
                polls: 64,
                last_status: 0x1,
            })
        );
        assert_eq!(bus.read_count(0x1F8E_9100), 64);
    }
}
