//! One-shot DRAM bring-up.
//!
//! [`initialize_dram`] runs the whole sequence in a fixed order:
//!
//! 1. ungate the controller clock (`PMD7`),
//! 2. PHY static configuration,
//! 3. `MEMWIDTH`, then the arbiter,
//! 4. address decode, refresh, power, delay, ODT and transfer registers,
//! 5. host command script (load, issue, drain),
//! 6. PHY self-calibration,
//! 7. capacity from the geometry.
//!
//! Every register value is computed and range-checked before step 1, so a
//! configuration error never leaves the controller half-programmed.

use platform::{Monotonic, PollOutcome, PollPolicy, RegisterBlock, RegisterBus};

use crate::address::{ControllerImage, ControllerWords};
use crate::arbiter::{ArbiterImage, ArbiterParamsSource, DefaultArbiter};
use crate::convert::MemoryClocks;
use crate::error::{Ddr2Error, WaitStage};
use crate::geometry::AddressGeometry;
use crate::host_cmd::{HostCommandScript, HostCommandSequencer, SequencerState};
use crate::log::{ddr_warn, info};
use crate::phy::{program_static, CalibrationOutcome, PhyCalibrator, PhyConfig, PhyImage};
use crate::regs::ctrl::CONTROLLER_BASE;
use crate::regs::phy::PHY_BASE;
use crate::regs::syscfg::{Pmd7, LOCK, PMD7_CLR, SYSCFG_BASE, SYSKEY, UNLOCK_SEQUENCE};
use crate::regs::Register;
use crate::timing::TimingSpec;

/// What to do when a hardware wait gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeoutPolicy {
    /// Log, finish bring-up, flag the report as degraded.
    #[default]
    BestEffort,
    /// Stop and return [`Ddr2Error::HardwareTimeout`].
    FailFast,
}

/// Register block base addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ddr2Blocks {
    /// System configuration (`SYSKEY`, `PMD7`).
    pub syscfg: RegisterBlock,
    /// DDR2 controller.
    pub controller: RegisterBlock,
    /// DDR2 PHY.
    pub phy: RegisterBlock,
}

impl Ddr2Blocks {
    /// Physical addresses on PIC32MZ DA.
    pub const PIC32MZDA: Self = Self {
        syscfg: RegisterBlock::new(SYSCFG_BASE),
        controller: RegisterBlock::new(CONTROLLER_BASE),
        phy: RegisterBlock::new(PHY_BASE),
    };

    /// The same blocks seen through a fixed address window (e.g. KSEG1).
    #[must_use]
    pub const fn offset_by(self, window: u32) -> Self {
        Self {
            syscfg: RegisterBlock::new(self.syscfg.base() | window),
            controller: RegisterBlock::new(self.controller.base() | window),
            phy: RegisterBlock::new(self.phy.base() | window),
        }
    }
}

/// Everything bring-up needs to know about the board.
///
/// Built once per boot and passed by reference; there is no global board
/// state.
#[derive(Clone, Copy)]
pub struct BootContext<'a> {
    /// DRAM part timing.
    pub timing: TimingSpec,
    /// Address geometry.
    pub geometry: AddressGeometry,
    /// DRAM and controller clocks, from the memory PLL.
    pub clocks: MemoryClocks,
    /// PHY tuning.
    pub phy: PhyConfig,
    /// Arbiter table override. `None` uses the built-in table.
    pub arbiter: Option<&'a dyn ArbiterParamsSource>,
    /// Bounds for every hardware wait.
    pub poll: PollPolicy,
    /// Reaction to a wait giving up.
    pub timeout_policy: TimeoutPolicy,
    /// Register block addresses.
    pub blocks: Ddr2Blocks,
}

impl<'a> BootContext<'a> {
    /// PIC32MZ DA starter kit: MT47H64M16HR-3 at 400 MHz, default arbiter,
    /// best-effort timeouts, physical addresses.
    pub fn pic32mzda_starter_kit() -> Self {
        Self {
            timing: TimingSpec::mt47h64m16hr_3(),
            geometry: AddressGeometry::pic32mzda_starter_kit(),
            clocks: MemoryClocks::pic32mzda(),
            phy: PhyConfig::pic32mzda_starter_kit(),
            arbiter: None,
            poll: PollPolicy::default(),
            timeout_policy: TimeoutPolicy::BestEffort,
            blocks: Ddr2Blocks::PIC32MZDA,
        }
    }

    /// Replace the arbiter table.
    #[must_use]
    pub fn with_arbiter(mut self, source: &'a dyn ArbiterParamsSource) -> Self {
        self.arbiter = Some(source);
        self
    }

    /// Set the timeout policy.
    #[must_use]
    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    /// Set the poll bounds.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

/// What bring-up achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DramInitReport {
    /// Usable bytes.
    pub size_bytes: u64,
    /// Final host-command sequencer state.
    pub sequencer: SequencerState,
    /// Host command drain wait.
    pub drain: PollOutcome,
    /// PHY calibration result.
    pub calibration: CalibrationOutcome,
}

impl DramInitReport {
    /// `true` if any hardware wait timed out.
    pub fn is_degraded(&self) -> bool {
        !self.drain.is_ready() || !self.calibration.passed()
    }
}

/// Register images computed up front.
struct Images {
    phy: [(u32, u32); 5],
    arbiter: ArbiterImage,
    controller: ControllerWords,
    script: HostCommandScript,
}

impl Images {
    fn compute(ctx: &BootContext<'_>) -> Result<Self, Ddr2Error> {
        let arbiter = match ctx.arbiter {
            Some(source) => source.arbiter_params(),
            None => DefaultArbiter.arbiter_params(),
        };
        Ok(Self {
            phy: PhyImage::compute(&ctx.phy, &ctx.timing).encode()?,
            arbiter: ArbiterImage::compute(&arbiter)?,
            controller: ControllerImage::compute(&ctx.timing, &ctx.geometry, ctx.clocks)?
                .encode()?,
            script: HostCommandScript::power_up(&ctx.timing, ctx.clocks)?,
        })
    }
}

/// Clear the DDR2 module-disable bit so the controller gets a clock.
///
/// `PMD7` is write-protected: unlock through `SYSKEY`, clear the bit via the
/// `CLR` alias, relock.
pub fn ungate_controller<B: RegisterBus>(
    bus: &mut B,
    syscfg: RegisterBlock,
) -> Result<(), Ddr2Error> {
    let mask = Pmd7 {
        ddr2_disabled: true,
    }
    .encode()?;
    for key in UNLOCK_SEQUENCE {
        bus.write32(syscfg.at(SYSKEY), key);
    }
    bus.write32(syscfg.at(PMD7_CLR), mask);
    bus.write32(syscfg.at(SYSKEY), LOCK);
    Ok(())
}

/// Bring the DDR2 controller and PHY up and return what was achieved.
///
/// Must run exactly once per boot, before anything lives in DRAM.
pub fn initialize_dram<B, C>(
    bus: &mut B,
    clock: &C,
    ctx: &BootContext<'_>,
) -> Result<DramInitReport, Ddr2Error>
where
    B: RegisterBus,
    C: Monotonic + ?Sized,
{
    let images = Images::compute(ctx)?;
    let blocks = ctx.blocks;
    info!(
        "DDR2 bring-up: tCK {} ps, CL {}, {} host commands",
        ctx.clocks.dram().period.as_ps(),
        ctx.timing.cas_latency,
        images.script.len()
    );

    ungate_controller(bus, blocks.syscfg)?;
    program_static(bus, blocks.phy, &images.phy);

    images.controller.program_width(bus, blocks.controller);
    images.arbiter.program(bus, blocks.controller);
    images.controller.program_address_and_timing(bus, blocks.controller);

    let mut sequencer = HostCommandSequencer::new(blocks.controller);
    let drain = sequencer.run(bus, clock, ctx.poll, &images.script)?;
    if let PollOutcome::TimedOut { polls, .. } = drain {
        if ctx.timeout_policy == TimeoutPolicy::FailFast {
            return Err(Ddr2Error::HardwareTimeout {
                stage: WaitStage::HostCommandDrain,
                polls,
            });
        }
    }

    let calibration = PhyCalibrator::new(blocks.phy).calibrate(bus, clock, ctx.poll)?;
    if let CalibrationOutcome::TimedOut { polls, .. } = calibration {
        if ctx.timeout_policy == TimeoutPolicy::FailFast {
            return Err(Ddr2Error::HardwareTimeout {
                stage: WaitStage::PhyCalibration,
                polls,
            });
        }
    }

    let report = DramInitReport {
        size_bytes: ctx.geometry.size_bytes(),
        sequencer: sequencer.state(),
        drain,
        calibration,
    };
    if report.is_degraded() {
        ddr_warn!("DDR2 up in degraded state: {} bytes", report.size_bytes);
    } else {
        info!("DDR2 up: {} bytes", report.size_bytes);
    }
    Ok(report)
}
