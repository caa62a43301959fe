//! Board profiles.
//!
//! A profile is everything that differs between PIC32MZ DA boards as far as
//! DRAM is concerned: the part's timing, its geometry, PHY tuning, the memory
//! PLL chain and, optionally, a replacement arbiter table. Profiles are plain
//! data; with the `serde` feature they load from JSON (see `xtask image`).

use ddr2::{
    AddressGeometry, ArbiterParams, BootContext, MemoryClocks, PhyConfig, TimeoutPolicy, TimingSpec,
};
use embassy_time::Duration;
use platform::PollPolicy;

use crate::mpll::MpllConfig;

/// Longest board name a profile may carry.
pub const BOARD_NAME_LEN: usize = 32;

/// DRAM-related description of one board.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardProfile {
    /// Human-readable board name.
    pub name: heapless::String<BOARD_NAME_LEN>,
    /// DRAM part timing.
    pub timing: TimingSpec,
    /// DRAM address geometry.
    pub geometry: AddressGeometry,
    /// PHY drive, termination and delay-line tuning.
    #[cfg_attr(feature = "serde", serde(default))]
    pub phy: PhyConfig,
    /// Memory PLL divider chain.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mpll: MpllConfig,
    /// Replacement arbiter table. `None` keeps the built-in one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub arbiter: Option<ArbiterParams>,
    /// Reaction to a hardware wait giving up.
    #[cfg_attr(feature = "serde", serde(default))]
    pub timeout_policy: TimeoutPolicy,
    /// Bound on each hardware wait, in milliseconds.
    #[cfg_attr(feature = "serde", serde(default = "default_poll_timeout_ms"))]
    pub poll_timeout_ms: u32,
}

#[cfg(feature = "serde")]
fn default_poll_timeout_ms() -> u32 {
    DEFAULT_POLL_TIMEOUT_MS
}

/// Name of the built-in starter kit profile.
pub const STARTER_KIT_NAME: &str = "pic32mzda-starter-kit";
const _: () = assert!(STARTER_KIT_NAME.len() <= BOARD_NAME_LEN);

/// One second, matching the boot ROM's own PLL wait.
pub const DEFAULT_POLL_TIMEOUT_MS: u32 = 1_000;

impl BoardProfile {
    /// PIC32MZ DA starter kit: MT47H64M16HR-3 (128 MiB, x16) at 400 MHz.
    pub fn pic32mzda_starter_kit() -> Self {
        // Fits BOARD_NAME_LEN, asserted at compile time.
        let name = heapless::String::try_from(STARTER_KIT_NAME).unwrap_or_default();
        Self {
            name,
            timing: TimingSpec::mt47h64m16hr_3(),
            geometry: AddressGeometry::pic32mzda_starter_kit(),
            phy: PhyConfig::pic32mzda_starter_kit(),
            mpll: MpllConfig::pic32mzda_starter_kit(),
            arbiter: None,
            timeout_policy: TimeoutPolicy::BestEffort,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
        }
    }

    /// Poll bounds for every hardware wait on this board.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::with_timeout(Duration::from_millis(u64::from(self.poll_timeout_ms)))
    }

    /// Bring-up context for this board once the memory PLL runs at `clocks`.
    ///
    /// The arbiter override, if any, is borrowed from the profile.
    pub fn boot_context(&self, clocks: MemoryClocks) -> BootContext<'_> {
        let mut ctx = BootContext {
            timing: self.timing,
            geometry: self.geometry,
            clocks,
            phy: self.phy,
            ..BootContext::pic32mzda_starter_kit()
        }
        .with_poll_policy(self.poll_policy())
        .with_timeout_policy(self.timeout_policy);
        if let Some(table) = &self.arbiter {
            ctx = ctx.with_arbiter(table);
        }
        ctx
    }
}

impl Default for BoardProfile {
    fn default() -> Self {
        Self::pic32mzda_starter_kit()
    }
}
