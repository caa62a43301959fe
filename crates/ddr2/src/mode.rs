//! DDR2 mode register payloads (JEDEC JESD79-2).
//!
//! These are the address-bus values carried by a load-mode command; the bank
//! address selects which register they land in.

use crate::error::FieldOverflow;
use crate::regs::{Field, Packer};

/// Mode register addressed by a load-mode command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeRegisterSelect {
    /// MR: burst, CAS latency, DLL reset, write recovery.
    Mr,
    /// EMR(1): DLL enable, drive, ODT, additive latency, OCD.
    Emr1,
    /// EMR(2): self-refresh temperature options.
    Emr2,
    /// EMR(3): reserved.
    Emr3,
}

impl ModeRegisterSelect {
    /// Bank address selecting this register.
    pub const fn bank(self) -> u32 {
        match self {
            Self::Mr => 0,
            Self::Emr1 => 1,
            Self::Emr2 => 2,
            Self::Emr3 => 3,
        }
    }
}

/// Burst length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BurstLength {
    /// Four beats.
    Four,
    /// Eight beats.
    Eight,
}

/// Base mode register (MR).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeRegister {
    /// Burst length (sequential bursts only).
    pub burst_length: BurstLength,
    /// CAS latency in clocks (2..=7).
    pub cas_latency: u32,
    /// Reset the DLL. Self-clearing in the device.
    pub dll_reset: bool,
    /// Write recovery in clocks (2..=8).
    pub write_recovery: u32,
    /// Slow-exit active power-down.
    pub slow_power_down_exit: bool,
}

impl ModeRegister {
    const BL: Field = Field::new("burst_length", 0, 3);
    const CL: Field = Field::new("cas_latency", 4, 3);
    const DLL_RESET: Field = Field::bit("dll_reset", 8);
    const WR: Field = Field::new("write_recovery", 9, 3);
    const PD: Field = Field::bit("power_down_exit", 12);

    /// Address bits A12..A0.
    pub fn address(&self) -> Result<u32, FieldOverflow> {
        let bl = match self.burst_length {
            BurstLength::Four => 0b010,
            BurstLength::Eight => 0b011,
        };
        // WR is stored as clocks - 1 (001 = 2 clocks … 111 = 8 clocks).
        let wr = self.write_recovery.checked_sub(1).ok_or(FieldOverflow {
            register: "MR",
            field: Self::WR.name,
            value: self.write_recovery,
        })?;
        Ok(Packer::new("MR")
            .put(Self::BL, bl)?
            .put(Self::CL, self.cas_latency)?
            .flag(Self::DLL_RESET, self.dll_reset)
            .put(Self::WR, wr)?
            .flag(Self::PD, self.slow_power_down_exit)
            .finish())
    }
}

/// On-die termination value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OdtTermination {
    /// ODT off.
    Disabled,
    /// 75 Ω.
    Ohm75,
    /// 150 Ω.
    Ohm150,
    /// 50 Ω.
    Ohm50,
}

/// Off-chip driver impedance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OcdMode {
    /// Exit calibration mode, keep current settings.
    Exit,
    /// Load default drive impedance.
    Default,
}

/// Extended mode register 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExtendedModeRegister1 {
    /// DLL enabled.
    pub dll_enable: bool,
    /// Reduced output drive strength.
    pub reduced_drive: bool,
    /// Device-side termination.
    pub odt: OdtTermination,
    /// Additive latency in clocks (0..=5).
    pub additive_latency: u32,
    /// OCD operation to perform.
    pub ocd: OcdMode,
    /// Differential DQS (DQS# enabled).
    pub dqs_bar_enable: bool,
    /// Redundant DQS enabled.
    pub rdqs_enable: bool,
    /// Output buffers enabled.
    pub outputs_enable: bool,
}

impl ExtendedModeRegister1 {
    const DLL_DISABLE: Field = Field::bit("dll_disable", 0);
    const REDUCED_DRIVE: Field = Field::bit("reduced_drive", 1);
    const RTT0: Field = Field::bit("rtt0", 2);
    const AL: Field = Field::new("additive_latency", 3, 3);
    const RTT1: Field = Field::bit("rtt1", 6);
    const OCD: Field = Field::new("ocd", 7, 3);
    const DQS_BAR_DISABLE: Field = Field::bit("dqs_bar_disable", 10);
    const RDQS_ENABLE: Field = Field::bit("rdqs_enable", 11);
    const QOFF: Field = Field::bit("outputs_disable", 12);

    /// Bring-up settings: DLL on, full drive, 150 Ω ODT, no additive
    /// latency, differential DQS, no RDQS.
    pub const fn bring_up(ocd: OcdMode) -> Self {
        Self {
            dll_enable: true,
            reduced_drive: false,
            odt: OdtTermination::Ohm150,
            additive_latency: 0,
            ocd,
            dqs_bar_enable: true,
            rdqs_enable: false,
            outputs_enable: true,
        }
    }

    /// Address bits A12..A0.
    pub fn address(&self) -> Result<u32, FieldOverflow> {
        let (rtt0, rtt1) = match self.odt {
            OdtTermination::Disabled => (false, false),
            OdtTermination::Ohm75 => (true, false),
            OdtTermination::Ohm150 => (false, true),
            OdtTermination::Ohm50 => (true, true),
        };
        let ocd = match self.ocd {
            OcdMode::Exit => 0b000,
            OcdMode::Default => 0b111,
        };
        Ok(Packer::new("EMR1")
            .flag(Self::DLL_DISABLE, !self.dll_enable)
            .flag(Self::REDUCED_DRIVE, self.reduced_drive)
            .flag(Self::RTT0, rtt0)
            .put(Self::AL, self.additive_latency)?
            .flag(Self::RTT1, rtt1)
            .put(Self::OCD, ocd)?
            .flag(Self::DQS_BAR_DISABLE, !self.dqs_bar_enable)
            .flag(Self::RDQS_ENABLE, self.rdqs_enable)
            .flag(Self::QOFF, !self.outputs_enable)
            .finish())
    }
}
