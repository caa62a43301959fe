//! Bring-up error types.

use core::fmt;

use thiserror_no_std::Error;

use crate::host_cmd::SequencerState;

/// A computed value did not fit the register field it was destined for.
///
/// Raised while building a register image, before anything is written, so a
/// timing table that does not fit the controller never reaches the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("value {value} does not fit {register}.{field}")]
pub struct FieldOverflow {
    /// Register name, e.g. `"DLYCFG2"`.
    pub register: &'static str,
    /// Field name, e.g. `"ras2cas"`.
    pub field: &'static str,
    /// Offending value, unshifted.
    pub value: u32,
}

/// Hardware condition a bounded wait was watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitStage {
    /// Memory PLL lock (`CFGMPLL` ready bits).
    MemoryPllLock,
    /// Controller draining the host command queue (`CMDISSUE.VALID` clear).
    HostCommandDrain,
    /// PHY self-calibration on both byte lanes.
    PhyCalibration,
}

impl WaitStage {
    /// Short human-readable name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MemoryPllLock => "memory PLL lock",
            Self::HostCommandDrain => "host command drain",
            Self::PhyCalibration => "PHY calibration",
        }
    }
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DDR2 bring-up error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ddr2Error {
    /// A register image could not be built.
    #[error("register image: {0}")]
    FieldOverflow(#[from] FieldOverflow),

    /// A bounded hardware wait gave up and the caller asked for fail-fast
    /// behaviour.
    #[error("timed out waiting for {stage} after {polls} polls")]
    HardwareTimeout {
        /// What was being waited for.
        stage: WaitStage,
        /// Register reads made before giving up.
        polls: u32,
    },

    /// A host command script does not fit the hardware command table.
    #[error("host command table holds {capacity} commands")]
    HostTableFull {
        /// Table capacity.
        capacity: usize,
    },

    /// A host-command sequencer step was invoked in the wrong state.
    #[error("sequencer step `{step}` not allowed in state {found}")]
    SequencerOutOfOrder {
        /// Step that was attempted.
        step: &'static str,
        /// State the sequencer was in.
        found: SequencerState,
    },
}
