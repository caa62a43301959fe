//! Arbiter configuration.
//!
//! The controller rate-limits each bus agent with three values stored in
//! packed per-agent arrays. An array element is written by first selecting
//! its bit offset through `TSEL`, then writing the value register.
//!
//! Boards may replace the limit table wholesale by passing their own
//! [`ArbiterParamsSource`]; tables are never merged.

use platform::{RegisterBlock, RegisterBus};

use crate::error::FieldOverflow;
use crate::log::debug;
use crate::regs::ctrl::{MinCommands, MinLimit, RequestPeriod, TargetSelect, ARBITER_AGENTS};
use crate::regs::Register;

/// Admission limits for one bus agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentLimits {
    /// Minimum burst limit.
    pub min_limit: u8,
    /// Request period.
    pub request_period: u8,
    /// Minimum accepted commands.
    pub min_commands: u8,
}

impl AgentLimits {
    /// Limits from `(min_limit, request_period, min_commands)`.
    pub const fn new(min_limit: u8, request_period: u8, min_commands: u8) -> Self {
        Self {
            min_limit,
            request_period,
            min_commands,
        }
    }
}

/// Limits for every agent, indexed by agent number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArbiterParams {
    /// One entry per agent.
    pub agents: [AgentLimits; ARBITER_AGENTS],
}

impl ArbiterParams {
    /// Built-in table: agents 0 to 2 get long bursts, agents 3 and 4 short
    /// ones.
    pub const DEFAULT: Self = Self {
        agents: [
            AgentLimits::new(0x1f, 0xff, 0x04),
            AgentLimits::new(0x1f, 0xff, 0x10),
            AgentLimits::new(0x1f, 0xff, 0x10),
            AgentLimits::new(0x04, 0xff, 0x04),
            AgentLimits::new(0x04, 0xff, 0x04),
        ],
    };
}

impl Default for ArbiterParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Supplies the arbiter table for a board.
pub trait ArbiterParamsSource {
    /// The complete table to program.
    fn arbiter_params(&self) -> ArbiterParams;
}

/// The built-in table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultArbiter;

impl ArbiterParamsSource for DefaultArbiter {
    fn arbiter_params(&self) -> ArbiterParams {
        ArbiterParams::DEFAULT
    }
}

impl ArbiterParamsSource for ArbiterParams {
    fn arbiter_params(&self) -> ArbiterParams {
        *self
    }
}

/// One `TSEL` + value pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArbiterWrite {
    select: u32,
    offset: u32,
    value: u32,
}

/// Encoded arbiter programming: three selected writes per agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbiterImage {
    writes: [[ArbiterWrite; 3]; ARBITER_AGENTS],
}

impl ArbiterImage {
    /// Encode `params`, rejecting values wider than their hardware field.
    pub fn compute(params: &ArbiterParams) -> Result<Self, FieldOverflow> {
        let empty = ArbiterWrite {
            select: 0,
            offset: 0,
            value: 0,
        };
        let mut writes = [[empty; 3]; ARBITER_AGENTS];

        for ((agent, limits), slot) in (0u32..).zip(params.agents.iter()).zip(writes.iter_mut()) {
            *slot = [
                ArbiterWrite {
                    select: select(agent, TargetSelect::MIN_LIMIT_STRIDE)?,
                    offset: MinLimit::OFFSET,
                    value: MinLimit {
                        limit: limits.min_limit.into(),
                    }
                    .encode()?,
                },
                ArbiterWrite {
                    select: select(agent, TargetSelect::REQUEST_PERIOD_STRIDE)?,
                    offset: RequestPeriod::OFFSET,
                    value: RequestPeriod {
                        period: limits.request_period.into(),
                    }
                    .encode()?,
                },
                ArbiterWrite {
                    select: select(agent, TargetSelect::MIN_COMMANDS_STRIDE)?,
                    offset: MinCommands::OFFSET,
                    value: MinCommands {
                        count: limits.min_commands.into(),
                    }
                    .encode()?,
                },
            ];
        }

        Ok(Self { writes })
    }

    /// Write every `TSEL`/value pair, agent by agent.
    pub fn program<B: RegisterBus>(&self, bus: &mut B, ctrl: RegisterBlock) {
        for (agent, group) in self.writes.iter().enumerate() {
            for w in group {
                bus.write32(ctrl.at(TargetSelect::OFFSET), w.select);
                bus.write32(ctrl.at(w.offset), w.value);
            }
            debug!("arbiter agent {} programmed", agent);
        }
    }
}

fn select(agent: u32, stride: u32) -> Result<u32, FieldOverflow> {
    TargetSelect {
        bit_offset: agent.saturating_mul(stride),
    }
    .encode()
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects, clippy::unreachable)]
mod tests {
    use super::*;
    use platform::mocks::MockRegisterBus;

    const CTRL: RegisterBlock = RegisterBlock::new(0x1000);

    #[test]
    fn default_table_write_order() {
        let image = ArbiterImage::compute(&ArbiterParams::DEFAULT);
        let Ok(image) = image else {
            unreachable!("default table fits");
        };
        let mut bus = MockRegisterBus::new();
        image.program(&mut bus, CTRL);

        let writes = bus.writes();
        assert_eq!(writes.len(), ARBITER_AGENTS * 6);
        // Agent 1: TSEL=5, MINLIM=0x1f, TSEL=8, RQPER=0xff, TSEL=8, MINCMD=0x10.
        assert_eq!(
            &writes[6..12],
            &[
                (0x1000, 5),
                (0x1004, 0x1f),
                (0x1000, 8),
                (0x1008, 0xff),
                (0x1000, 8),
                (0x100C, 0x10),
            ]
        );
        // Agent 4 selects the last element of each array.
        assert_eq!(writes[24], (0x1000, 20));
        assert_eq!(writes[26], (0x1000, 32));
    }

    #[test]
    fn board_table_replaces_default_wholesale() {
        let board = ArbiterParams {
            agents: [AgentLimits::new(1, 2, 3); ARBITER_AGENTS],
        };
        let source: &dyn ArbiterParamsSource = &board;
        assert_eq!(source.arbiter_params(), board);
        assert_eq!(DefaultArbiter.arbiter_params(), ArbiterParams::DEFAULT);
    }

    #[test]
    fn min_limit_wider_than_five_bits_is_rejected() {
        let mut params = ArbiterParams::DEFAULT;
        params.agents[2].min_limit = 0x20;
        let err = ArbiterImage::compute(&params);
        assert_eq!(
            err.err(),
            Some(FieldOverflow {
                register: "MINLIM",
                field: "limit",
                value: 0x20,
            })
        );
    }
}
