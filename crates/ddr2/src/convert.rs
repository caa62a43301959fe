//! Picoseconds → clock cycles.
//!
//! Every delay field in the controller is a cycle count in some clock domain.
//! DDR2 datasheets give timings as "at least X ps" and often additionally
//! "and at least N clocks", so the conversion always rounds *up* and then
//! takes the clock floor into account.
//!
//! The controller runs at half the DRAM clock. A floor expressed in DRAM
//! clocks is therefore divided (rounding up) by the domain's
//! [`ClockDomain::dram_clocks_per_cycle`] before the maximum is taken.
//!
//! Field encodings then subtract a small fixed offset ("minus one", "minus
//! two"); those offsets are named by [`FieldBias`] at every use site.

use core::num::NonZeroU32;

/// A duration in picoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Picoseconds(pub u32);

impl Picoseconds {
    /// Zero duration.
    pub const ZERO: Self = Self(0);

    /// From nanoseconds, saturating.
    pub const fn from_ns(ns: u32) -> Self {
        Self(ns.saturating_mul(1_000))
    }

    /// Raw picosecond count.
    pub const fn as_ps(self) -> u32 {
        self.0
    }

    /// Saturating sum.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

/// Period of a clock, in picoseconds. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockPeriod(NonZeroU32);

impl ClockPeriod {
    /// `None` for a zero period.
    pub const fn from_ps(ps: u32) -> Option<Self> {
        match NonZeroU32::new(ps) {
            Some(p) => Some(Self(p)),
            None => None,
        }
    }

    /// Like [`Self::from_ps`], with zero clamped to 1 ps.
    pub const fn from_ps_clamped(ps: u32) -> Self {
        match NonZeroU32::new(ps) {
            Some(p) => Self(p),
            None => Self(NonZeroU32::MIN),
        }
    }

    /// Period in picoseconds.
    pub const fn as_ps(self) -> u32 {
        self.0.get()
    }

    /// Frequency in Hz, rounded down.
    pub const fn hz(self) -> u32 {
        // 1e12 ps per second does not fit u32; go through u64.
        match 1_000_000_000_000u64.checked_div(self.0.get() as u64) {
            Some(hz) if hz <= u32::MAX as u64 => hz as u32,
            _ => u32::MAX,
        }
    }
}

/// `ceil(duration / period)`.
///
/// Zero for a zero duration, at least one for any positive duration.
pub const fn cycles(duration: Picoseconds, period: ClockPeriod) -> u32 {
    duration.0.div_ceil(period.as_ps())
}

/// A timing parameter as datasheets state it: a minimum duration and a
/// minimum clock count (in DRAM clocks). Either part may be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingParam {
    /// Minimum duration.
    #[cfg_attr(feature = "serde", serde(default = "zero_ps"))]
    pub min: Picoseconds,
    /// Minimum number of DRAM clocks.
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_clocks: u32,
}

#[cfg(feature = "serde")]
const fn zero_ps() -> Picoseconds {
    Picoseconds::ZERO
}

impl TimingParam {
    /// Duration only.
    pub const fn ps(ps: u32) -> Self {
        Self {
            min: Picoseconds(ps),
            min_clocks: 0,
        }
    }

    /// Clock count only.
    pub const fn clocks(n: u32) -> Self {
        Self {
            min: Picoseconds::ZERO,
            min_clocks: n,
        }
    }

    /// Whichever of `ps` and `n` clocks is longer.
    pub const fn ps_or_clocks(ps: u32, n: u32) -> Self {
        Self {
            min: Picoseconds(ps),
            min_clocks: n,
        }
    }
}

/// A clock domain that delay fields are counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockDomain {
    /// Period of one cycle of this domain.
    pub period: ClockPeriod,
    /// DRAM clocks per cycle of this domain (1 for the DRAM clock itself,
    /// 2 for the half-rate controller).
    pub dram_clocks_per_cycle: u32,
}

impl ClockDomain {
    /// Cycles of this domain needed to satisfy `param`.
    pub const fn cycles(&self, param: TimingParam) -> u32 {
        let from_ps = cycles(param.min, self.period);
        let ratio = if self.dram_clocks_per_cycle == 0 {
            1
        } else {
            self.dram_clocks_per_cycle
        };
        let from_clocks = param.min_clocks.div_ceil(ratio);
        if from_ps > from_clocks {
            from_ps
        } else {
            from_clocks
        }
    }
}

/// The two clocks bring-up timing is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryClocks {
    dram: ClockPeriod,
}

impl MemoryClocks {
    /// DRAM clocks per controller clock.
    pub const HALF_RATE: u32 = 2;

    /// Clocks for a DRAM running at `dram` with the controller at half rate.
    pub const fn from_dram_period(dram: ClockPeriod) -> Self {
        Self { dram }
    }

    /// 400 MHz DRAM clock (tCK = 2500 ps), 200 MHz controller clock.
    pub const fn pic32mzda() -> Self {
        Self {
            dram: ClockPeriod::from_ps_clamped(2_500),
        }
    }

    /// DRAM clock domain (host command delays, mode register values).
    pub const fn dram(&self) -> ClockDomain {
        ClockDomain {
            period: self.dram,
            dram_clocks_per_cycle: 1,
        }
    }

    /// Controller clock domain (refresh and inter-command delay fields).
    pub const fn controller(&self) -> ClockDomain {
        let ps = self.dram.as_ps().saturating_mul(Self::HALF_RATE);
        ClockDomain {
            period: ClockPeriod::from_ps_clamped(ps),
            dram_clocks_per_cycle: Self::HALF_RATE,
        }
    }
}

/// Fixed offset a register field encoding subtracts from a cycle count.
///
/// The controller stores many delays as "cycles minus N"; the subtraction
/// saturates at zero, so a bias of `MinusTwo` on a count of 1 encodes as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldBias {
    /// Stored as-is.
    Exact,
    /// Stored as `cycles - 1`.
    MinusOne,
    /// Stored as `cycles - 2`.
    MinusTwo,
}

impl FieldBias {
    /// Encode `cycles` for a field with this bias.
    pub const fn apply(self, cycles: u32) -> u32 {
        match self {
            Self::Exact => cycles,
            Self::MinusOne => cycles.saturating_sub(1),
            Self::MinusTwo => cycles.saturating_sub(2),
        }
    }
}
