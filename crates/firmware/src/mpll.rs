//! Memory PLL.
//!
//! The DDR2 controller and PHY are clocked by the dedicated memory PLL, not
//! the system PLL. Boot programs `CFGMPLL`, waits for lock, and hands the
//! resulting clock periods to the DDR2 bring-up.
//!
//! # Clock tree (starter kit)
//!
//! ```text
//! POSC 24 MHz / IDIV 3 = 8 MHz → × MULT 50 = 400 MHz VCO
//! VCO / (ODIV1 2 × ODIV2 1) = 200 MHz → controller clock
//! controller × 2 (half-rate PHY)   = 400 MHz → DRAM clock, tCK 2500 ps
//! ```

use ddr2::regs::syscfg::CfgMpll;
use ddr2::regs::Register;
use ddr2::{ClockPeriod, FieldOverflow, MemoryClocks};
use platform::{poll_until, Monotonic, PollOutcome, PollPolicy, RegisterBlock, RegisterBus};
use thiserror_no_std::Error;

/// Primary oscillator on the PIC32MZ DA starter kit.
pub const POSC_HZ: u32 = 24_000_000;

const PS_PER_SECOND: u64 = 1_000_000_000_000;

/// Why a memory PLL setting was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MpllError {
    /// A divider of zero.
    #[error("memory PLL {0} is zero")]
    ZeroDivider(&'static str),
    /// The settings produce a frequency that does not fit 32 bits, or a
    /// DRAM period under 1 ps.
    #[error("memory PLL frequency out of range")]
    FrequencyOutOfRange,
    /// A divider or multiplier is wider than its `CFGMPLL` field.
    #[error("memory PLL register: {0}")]
    Encode(#[from] FieldOverflow),
}

/// Memory PLL divider chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MpllConfig {
    /// Reference clock feeding the PLL.
    pub reference_hz: u32,
    /// Reference input divider (IDIV).
    pub input_divider: u32,
    /// Feedback multiplier (MULT).
    pub multiplier: u32,
    /// First output divider (ODIV1).
    pub output_divider1: u32,
    /// Second output divider (ODIV2).
    pub output_divider2: u32,
}

impl MpllConfig {
    /// 200 MHz controller / 400 MHz DRAM from the 24 MHz POSC.
    pub const fn pic32mzda_starter_kit() -> Self {
        Self {
            reference_hz: POSC_HZ,
            input_divider: 3,
            multiplier: 50,
            output_divider1: 2,
            output_divider2: 1,
        }
    }

    /// The divider chain held in a `CFGMPLL` value.
    pub const fn from_register(reference_hz: u32, reg: &CfgMpll) -> Self {
        Self {
            reference_hz,
            input_divider: reg.input_divider,
            multiplier: reg.multiplier,
            output_divider1: reg.output_divider1,
            output_divider2: reg.output_divider2,
        }
    }

    /// `CFGMPLL` value selecting this chain, PLL and regulator enabled.
    pub fn register(&self) -> CfgMpll {
        CfgMpll {
            input_divider: self.input_divider,
            multiplier: self.multiplier,
            output_divider1: self.output_divider1,
            output_divider2: self.output_divider2,
            ..CfgMpll::default()
        }
    }

    /// VCO frequency.
    pub fn vco_hz(&self) -> Result<u32, MpllError> {
        let divided = self
            .reference_hz
            .checked_div(self.input_divider)
            .ok_or(MpllError::ZeroDivider("input divider"))?;
        divided
            .checked_mul(self.multiplier)
            .ok_or(MpllError::FrequencyOutOfRange)
    }

    /// PLL output, which clocks the DDR2 controller.
    pub fn output_hz(&self) -> Result<u32, MpllError> {
        let vco = self.vco_hz()?;
        let odiv1 = vco
            .checked_div(self.output_divider1)
            .ok_or(MpllError::ZeroDivider("output divider 1"))?;
        odiv1
            .checked_div(self.output_divider2)
            .ok_or(MpllError::ZeroDivider("output divider 2"))
    }

    /// DRAM and controller clocks this chain produces.
    pub fn memory_clocks(&self) -> Result<MemoryClocks, MpllError> {
        let dram_hz = u64::from(self.output_hz()?)
            .checked_mul(u64::from(MemoryClocks::HALF_RATE))
            .ok_or(MpllError::FrequencyOutOfRange)?;
        let period_ps = match PS_PER_SECOND.checked_div(dram_hz) {
            // Round up: a period that errs long keeps every converted delay
            // on the safe side.
            Some(whole) if PS_PER_SECOND.checked_rem(dram_hz) == Some(0) => whole,
            Some(whole) => whole.saturating_add(1),
            None => return Err(MpllError::ZeroDivider("output")),
        };
        let period = u32::try_from(period_ps)
            .ok()
            .and_then(ClockPeriod::from_ps)
            .ok_or(MpllError::FrequencyOutOfRange)?;
        Ok(MemoryClocks::from_dram_period(period))
    }
}

impl Default for MpllConfig {
    fn default() -> Self {
        Self::pic32mzda_starter_kit()
    }
}

/// Memory PLL in the system configuration block.
#[derive(Debug, Clone, Copy)]
pub struct MemoryPll {
    syscfg: RegisterBlock,
}

impl MemoryPll {
    /// PLL whose `CFGMPLL` lives in `syscfg`.
    pub const fn new(syscfg: RegisterBlock) -> Self {
        Self { syscfg }
    }

    /// Program the divider chain and return the clocks it will produce once
    /// locked. Nothing is written if the chain is invalid.
    pub fn start<B: RegisterBus>(
        &self,
        bus: &mut B,
        config: &MpllConfig,
    ) -> Result<MemoryClocks, MpllError> {
        let clocks = config.memory_clocks()?;
        let raw = config.register().encode()?;
        bus.write32(self.syscfg.at(CfgMpll::OFFSET), raw);
        Ok(clocks)
    }

    /// Wait for `MPLLRDY` and `MPLLVREGRDY`.
    pub fn await_lock<B, C>(&self, bus: &mut B, clock: &C, policy: PollPolicy) -> PollOutcome
    where
        B: RegisterBus,
        C: Monotonic + ?Sized,
    {
        let addr = self.syscfg.at(CfgMpll::OFFSET);
        poll_until(clock, policy, || CfgMpll::decode(bus.read32(addr)).locked())
    }
}
