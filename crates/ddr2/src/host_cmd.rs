//! Host command script and sequencer.
//!
//! The controller owns a 16-slot table of raw DRAM commands. Bring-up fills
//! it with the JEDEC DDR2 power-up sequence, sets the issue register, and
//! lets the hardware walk the table on its own, waiting each entry's delay
//! before the next. Software only waits for the "valid" flag to drop.
//!
//! ```text
//!  Idle ──load──▶ Building ──issue──▶ Issued ──await_drain──▶ AwaitingDrain
//!                                                                  │
//!                                     Complete ◀── drained ────────┤
//!                     CompleteWithTimeoutWarning ◀── timed out ────┘
//! ```
//!
//! A drain timeout still ends in a terminal state and still sets
//! `MEMCON.INIT_DONE`: once the batch is issued the JEDEC ordering is in the
//! hardware's hands, and there is nothing to retry against.

use core::fmt;

use heapless::Vec;
use platform::{poll_until, Monotonic, PollOutcome, PollPolicy, RegisterBlock, RegisterBus};

use crate::convert::{FieldBias, MemoryClocks};
use crate::error::{Ddr2Error, FieldOverflow};
use crate::log::{ddr_warn, debug, info};
use crate::mode::{BurstLength, ExtendedModeRegister1, ModeRegister, ModeRegisterSelect, OcdMode};
use crate::regs::ctrl::{
    cmd1_offset, cmd2_offset, CmdIssue, HostCmd1, HostCmd2, MemCon, HOST_COMMAND_SLOTS,
};
use crate::regs::{Field, Register};
use crate::timing::TimingSpec;

/// Commands in the power-up script.
pub const POWER_UP_COMMANDS: usize = 12;

/// Wait after leaving OCD calibration, DRAM clocks.
pub const OCD_EXIT_CLOCKS: u32 = 140;

/// Command pin patterns (CS#, RAS#, CAS#, WE# and the clock enables) as
/// stored in `CMD1[23:0]`.
mod pins {
    pub const NOP: u32 = 0x00FF_FFFF;
    pub const PRECHARGE_ALL: u32 = 0x00FF_F401;
    pub const REFRESH: u32 = 0x00FF_F801;
    pub const LOAD_MODE: u32 = 0x00FF_F001;
}

/// A10 set: precharge applies to all banks.
const A10: u32 = 0x400;

/// What a host command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostOpcode {
    /// No operation (CKE high).
    Nop,
    /// Precharge all banks.
    PrechargeAll,
    /// Write `address` into a mode register.
    LoadMode {
        /// Target register.
        register: ModeRegisterSelect,
        /// Address-bus payload.
        address: u32,
    },
    /// Auto-refresh.
    Refresh,
}

impl HostOpcode {
    const fn pins(self) -> u32 {
        match self {
            Self::Nop => pins::NOP,
            Self::PrechargeAll => pins::PRECHARGE_ALL,
            Self::LoadMode { .. } => pins::LOAD_MODE,
            Self::Refresh => pins::REFRESH,
        }
    }

    const fn address(self) -> u32 {
        match self {
            Self::PrechargeAll => A10,
            Self::LoadMode { address, .. } => address,
            Self::Nop | Self::Refresh => 0,
        }
    }

    const fn bank(self) -> u32 {
        match self {
            Self::LoadMode { register, .. } => register.bank(),
            _ => 0,
        }
    }
}

/// One entry of the host command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostCommand {
    /// Table slot.
    pub slot: u8,
    /// Command.
    pub opcode: HostOpcode,
    /// DRAM clocks the controller waits before the next slot.
    pub delay_clocks: u32,
}

impl HostCommand {
    const ADDRESS_LO: Field = Field::new("address", 0, 8);
    const ADDRESS_HI: Field = Field::new("address", 8, 8);

    /// `CMD1`/`CMD2` words.
    pub fn encode(&self) -> Result<(u32, u32), FieldOverflow> {
        let address = self.opcode.address();
        let cmd1 = HostCmd1 {
            pins: self.opcode.pins(),
            address_lo: Self::ADDRESS_LO.extract(address),
        }
        .encode()?;
        let cmd2 = HostCmd2 {
            address_hi: Self::ADDRESS_HI.extract(address),
            bank: self.opcode.bank(),
            delay: FieldBias::MinusTwo.apply(self.delay_clocks),
        }
        .encode()?;
        Ok((cmd1, cmd2))
    }
}

/// An ordered host command batch that fits the hardware table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommandScript {
    commands: Vec<HostCommand, HOST_COMMAND_SLOTS>,
}

impl HostCommandScript {
    /// Empty script.
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Append a command in the next free slot.
    pub fn push(&mut self, opcode: HostOpcode, delay_clocks: u32) -> Result<(), Ddr2Error> {
        let full = Ddr2Error::HostTableFull {
            capacity: HOST_COMMAND_SLOTS,
        };
        let slot = u8::try_from(self.commands.len()).map_err(|_| full)?;
        self.commands
            .push(HostCommand {
                slot,
                opcode,
                delay_clocks,
            })
            .map_err(|_| full)
    }

    /// Commands in slot order.
    pub fn commands(&self) -> &[HostCommand] {
        &self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// `true` if no command has been pushed.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The JEDEC DDR2 power-up sequence.
    ///
    /// Opcodes and payloads are fixed; only the delays depend on `timing` and
    /// `clocks`.
    pub fn power_up(timing: &TimingSpec, clocks: MemoryClocks) -> Result<Self, Ddr2Error> {
        let dram = clocks.dram();
        let cke = dram.cycles(timing.cke_init);
        let precharge = dram.cycles(timing.precharge).saturating_add(1);
        let mrd = dram.cycles(timing.mode_register_delay);
        let rfc = dram.cycles(timing.refresh_cycle);

        let mr = |dll_reset| ModeRegister {
            burst_length: BurstLength::Four,
            cas_latency: timing.cas_latency,
            dll_reset,
            write_recovery: dram.cycles(timing.write_recovery),
            slow_power_down_exit: false,
        };
        let load = |register, address| HostOpcode::LoadMode { register, address };

        let mut script = Self::new();
        script.push(HostOpcode::Nop, cke)?;
        script.push(HostOpcode::PrechargeAll, precharge)?;
        script.push(load(ModeRegisterSelect::Emr2, 0), mrd)?;
        script.push(load(ModeRegisterSelect::Emr3, 0), mrd)?;
        script.push(
            load(
                ModeRegisterSelect::Emr1,
                ExtendedModeRegister1::bring_up(OcdMode::Exit).address()?,
            ),
            mrd,
        )?;
        script.push(load(ModeRegisterSelect::Mr, mr(true).address()?), mrd)?;
        script.push(HostOpcode::PrechargeAll, precharge)?;
        script.push(HostOpcode::Refresh, rfc)?;
        script.push(HostOpcode::Refresh, rfc)?;
        script.push(load(ModeRegisterSelect::Mr, mr(false).address()?), mrd)?;
        script.push(
            load(
                ModeRegisterSelect::Emr1,
                ExtendedModeRegister1::bring_up(OcdMode::Default).address()?,
            ),
            mrd,
        )?;
        script.push(
            load(
                ModeRegisterSelect::Emr1,
                ExtendedModeRegister1::bring_up(OcdMode::Exit).address()?,
            ),
            OCD_EXIT_CLOCKS,
        )?;
        Ok(script)
    }
}

impl Default for HostCommandScript {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerState {
    /// Nothing written yet.
    Idle,
    /// Table written, not yet issued.
    Building {
        /// Slots written.
        loaded: u8,
    },
    /// Issue register set, controller started.
    Issued,
    /// Polling for the table to drain.
    AwaitingDrain,
    /// Table drained; normal traffic enabled.
    Complete,
    /// Drain never confirmed; normal traffic enabled anyway.
    CompleteWithTimeoutWarning,
}

impl SequencerState {
    /// `true` in either terminal state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::CompleteWithTimeoutWarning)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Building { .. } => "building",
            Self::Issued => "issued",
            Self::AwaitingDrain => "awaiting drain",
            Self::Complete => "complete",
            Self::CompleteWithTimeoutWarning => "complete (drain timed out)",
        }
    }
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives the host command table through one bring-up.
#[derive(Debug)]
pub struct HostCommandSequencer {
    ctrl: RegisterBlock,
    state: SequencerState,
}

impl HostCommandSequencer {
    /// Sequencer for the controller at `ctrl`.
    pub const fn new(ctrl: RegisterBlock) -> Self {
        Self {
            ctrl,
            state: SequencerState::Idle,
        }
    }

    /// Current state.
    pub const fn state(&self) -> SequencerState {
        self.state
    }

    fn out_of_order(&self, step: &'static str) -> Ddr2Error {
        Ddr2Error::SequencerOutOfOrder {
            step,
            found: self.state,
        }
    }

    /// Write every script entry into the table. Nothing is issued.
    ///
    /// All entries are encoded before the first write, so an encoding error
    /// leaves the table untouched and the sequencer `Idle`.
    pub fn load<B: RegisterBus>(
        &mut self,
        bus: &mut B,
        script: &HostCommandScript,
    ) -> Result<(), Ddr2Error> {
        if self.state != SequencerState::Idle {
            return Err(self.out_of_order("load"));
        }
        if script.is_empty() {
            return Ok(());
        }

        let mut words: Vec<(u32, u32, u32, u32), HOST_COMMAND_SLOTS> = Vec::new();
        let full = Ddr2Error::HostTableFull {
            capacity: HOST_COMMAND_SLOTS,
        };
        for cmd in script.commands() {
            let (cmd1, cmd2) = cmd.encode()?;
            let slot = usize::from(cmd.slot);
            let (Some(at1), Some(at2)) = (cmd1_offset(slot), cmd2_offset(slot)) else {
                return Err(full);
            };
            words.push((at1, cmd1, at2, cmd2)).map_err(|_| full)?;
        }

        self.state = SequencerState::Building { loaded: 0 };
        for (n, &(at1, cmd1, at2, cmd2)) in (1u8..).zip(words.iter()) {
            bus.write32(self.ctrl.at(at1), cmd1);
            bus.write32(self.ctrl.at(at2), cmd2);
            self.state = SequencerState::Building { loaded: n };
        }
        debug!("host command table loaded: {} entries", words.len());
        Ok(())
    }

    /// Mark the loaded entries valid and start the controller.
    pub fn issue<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), Ddr2Error> {
        let SequencerState::Building { loaded } = self.state else {
            return Err(self.out_of_order("issue"));
        };
        let last_slot = u32::from(loaded).checked_sub(1).ok_or(Ddr2Error::SequencerOutOfOrder {
            step: "issue",
            found: self.state,
        })?;
        let issue = CmdIssue {
            last_slot,
            valid: true,
        }
        .encode()?;
        let start = MemCon {
            init_start: true,
            init_done: false,
        }
        .encode()?;

        bus.write32(self.ctrl.at(CmdIssue::OFFSET), issue);
        bus.write32(self.ctrl.at(MemCon::OFFSET), start);
        self.state = SequencerState::Issued;
        info!("host command table issued ({} commands)", loaded);
        Ok(())
    }

    /// Wait for the controller to finish the table, then enable traffic.
    ///
    /// Returns the poll outcome. A timeout is not an error here: the state
    /// becomes [`SequencerState::CompleteWithTimeoutWarning`] and the caller
    /// decides whether that is acceptable.
    pub fn await_drain<B, C>(
        &mut self,
        bus: &mut B,
        clock: &C,
        policy: PollPolicy,
    ) -> Result<PollOutcome, Ddr2Error>
    where
        B: RegisterBus,
        C: Monotonic + ?Sized,
    {
        if self.state != SequencerState::Issued {
            return Err(self.out_of_order("await_drain"));
        }
        self.state = SequencerState::AwaitingDrain;

        let ctrl = self.ctrl;
        let outcome = poll_until(clock, policy, || {
            !CmdIssue::decode(bus.read32(ctrl.at(CmdIssue::OFFSET))).valid
        });

        let done = MemCon {
            init_start: true,
            init_done: true,
        }
        .encode()?;
        bus.write32(ctrl.at(MemCon::OFFSET), done);

        self.state = match outcome {
            PollOutcome::Ready { polls } => {
                debug!("host command table drained after {} polls", polls);
                SequencerState::Complete
            }
            PollOutcome::TimedOut { polls, .. } => {
                ddr_warn!(
                    "host command table did not drain after {} polls; enabling traffic anyway",
                    polls
                );
                SequencerState::CompleteWithTimeoutWarning
            }
        };
        Ok(outcome)
    }

    /// `load`, `issue` and `await_drain` in one go.
    pub fn run<B, C>(
        &mut self,
        bus: &mut B,
        clock: &C,
        policy: PollPolicy,
        script: &HostCommandScript,
    ) -> Result<PollOutcome, Ddr2Error>
    where
        B: RegisterBus,
        C: Monotonic + ?Sized,
    {
        self.load(bus, script)?;
        self.issue(bus)?;
        self.await_drain(bus, clock, policy)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use embassy_time::{Duration, Instant};
    use platform::mocks::{FakeClock, MockRegisterBus};

    const CTRL: RegisterBlock = RegisterBlock::new(0x1F8E_8000);
    const CMDISSUE: u32 = 0x1F8E_8048;
    const MEMCON: u32 = 0x1F8E_8010;

    fn script() -> HostCommandScript {
        HostCommandScript::power_up(&TimingSpec::mt47h64m16hr_3(), MemoryClocks::pic32mzda())
            .unwrap_or_else(|e| panic!("power-up script: {e}"))
    }

    #[test]
    fn power_up_script_words() {
        let words: std::vec::Vec<(u32, u32)> = script()
            .commands()
            .iter()
            .map(|c| c.encode().unwrap_or_else(|e| panic!("{e}")))
            .collect();
        let expected = [
            (0x00FF_FFFF, 158 << 11),
            (0x00FF_F401, 0x04 | (4 << 11)),
            (0x00FF_F001, 0x200),
            (0x00FF_F001, 0x300),
            (0x40FF_F001, 0x100),
            (0x52FF_F001, 0x0B),
            (0x00FF_F401, 0x04 | (4 << 11)),
            (0x00FF_F801, 49 << 11),
            (0x00FF_F801, 49 << 11),
            (0x52FF_F001, 0x0A),
            (0xC0FF_F001, 0x103),
            (0x40FF_F001, 0x100 | (138 << 11)),
        ];
        assert_eq!(words, expected);
    }

    #[test]
    fn mode_register_selects_burst_of_four() {
        let s = script();
        let mr: std::vec::Vec<u32> = s
            .commands()
            .iter()
            .filter_map(|c| match c.opcode {
                HostOpcode::LoadMode {
                    register: ModeRegisterSelect::Mr,
                    address,
                } => Some(address),
                _ => None,
            })
            .collect();
        // With and without DLL reset; BL field 0b010.
        assert_eq!(mr, [0xB52, 0xA52]);
    }

    #[test]
    fn slots_are_sequential() {
        let s = script();
        assert_eq!(s.len(), POWER_UP_COMMANDS);
        for (i, c) in s.commands().iter().enumerate() {
            assert_eq!(usize::from(c.slot), i);
        }
    }

    #[test]
    fn table_rejects_seventeenth_command() {
        let mut s = HostCommandScript::new();
        for _ in 0..HOST_COMMAND_SLOTS {
            assert!(s.push(HostOpcode::Nop, 2).is_ok());
        }
        assert_eq!(
            s.push(HostOpcode::Nop, 2),
            Err(Ddr2Error::HostTableFull { capacity: 16 })
        );
    }

    #[test]
    fn full_run_drains_and_sets_init_done() {
        let mut bus = MockRegisterBus::new();
        bus.script_reads(CMDISSUE, &[0x1B, 0x1B, 0x0B]);
        let clock = FakeClock::stepping(Duration::from_micros(10));
        let mut seq = HostCommandSequencer::new(CTRL);

        let outcome = seq.run(&mut bus, &clock, PollPolicy::default(), &script());
        assert_eq!(outcome, Ok(PollOutcome::Ready { polls: 3 }));
        assert_eq!(seq.state(), SequencerState::Complete);

        // Table fully written before the issue register.
        let last_table_write = bus.last_write_index(0x1F8E_80EC).unwrap_or(usize::MAX);
        let issue = bus.first_write_index(CMDISSUE).unwrap_or(0);
        assert!(last_table_write < issue);
        assert_eq!(bus.writes_to(CMDISSUE), vec![0x1B]);
        assert_eq!(bus.writes_to(MEMCON), vec![0x1, 0x3]);
    }

    #[test]
    fn drain_timeout_is_degraded_not_fatal() {
        let mut bus = MockRegisterBus::new();
        bus.preset(CMDISSUE, 0x1B);
        let clock = FakeClock::frozen(Instant::from_ticks(0));
        let mut seq = HostCommandSequencer::new(CTRL);

        let policy = PollPolicy::default().max_polls(1_000);
        let outcome = seq.run(&mut bus, &clock, policy, &script());
        let Ok(outcome) = outcome else {
            panic!("timeout must not be an error: {outcome:?}");
        };
        assert!(!outcome.is_ready());
        assert_eq!(outcome.polls(), 1_000);
        assert_eq!(seq.state(), SequencerState::CompleteWithTimeoutWarning);
        assert_eq!(bus.last_write(MEMCON), Some(0x3));
    }

    #[test]
    fn steps_out_of_order_are_rejected() {
        let mut bus = MockRegisterBus::new();
        let clock = FakeClock::frozen(Instant::from_ticks(0));
        let mut seq = HostCommandSequencer::new(CTRL);

        assert_eq!(
            seq.issue(&mut bus),
            Err(Ddr2Error::SequencerOutOfOrder {
                step: "issue",
                found: SequencerState::Idle,
            })
        );
        assert!(seq.await_drain(&mut bus, &clock, PollPolicy::default()).is_err());
        assert!(bus.writes().is_empty());

        assert!(seq.load(&mut bus, &script()).is_ok());
        assert_eq!(seq.state(), SequencerState::Building { loaded: 12 });
        assert!(matches!(
            seq.load(&mut bus, &script()),
            Err(Ddr2Error::SequencerOutOfOrder { step: "load", .. })
        ));
    }

    #[test]
    fn empty_script_cannot_be_issued() {
        let mut bus = MockRegisterBus::new();
        let mut seq = HostCommandSequencer::new(CTRL);
        assert!(seq.load(&mut bus, &HostCommandScript::new()).is_ok());
        assert!(seq.issue(&mut bus).is_err());
        assert!(bus.writes().is_empty());
    }
}
