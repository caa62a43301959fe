//! Mock implementations for testing
//!
//! Host-side stand-ins for the register bus and the monotonic clock, used by
//! unit and integration tests across the workspace and by `xtask image` to
//! capture a register image without hardware.

use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::vec::Vec;

use embassy_time::{Duration, Instant};

use crate::{Monotonic, RegisterBus};

/// Recording register bus.
///
/// - Every write is appended to an ordered log and stored as the register's
///   current value.
/// - Reads return, in priority order: the next scripted value for that
///   address (the last scripted value sticks once the script is drained),
///   otherwise the current value, otherwise `0`.
#[derive(Debug, Default)]
pub struct MockRegisterBus {
    values: BTreeMap<u32, u32>,
    scripts: BTreeMap<u32, VecDeque<u32>>,
    writes: Vec<(u32, u32)>,
    reads: Vec<u32>,
}

impl MockRegisterBus {
    /// Create an empty bus: every register reads as zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register's current value without logging a write.
    pub fn preset(&mut self, addr: u32, value: u32) {
        self.values.insert(addr, value);
    }

    /// Script the values successive reads of `addr` return.
    ///
    /// Models status bits that the hardware changes on its own, e.g. a
    /// "command valid" flag that clears once the controller drains its queue.
    pub fn script_reads(&mut self, addr: u32, values: &[u32]) {
        self.scripts.insert(addr, values.iter().copied().collect());
    }

    /// Ordered log of `(address, value)` writes.
    pub fn writes(&self) -> &[(u32, u32)] {
        &self.writes
    }

    /// All values written to `addr`, in order.
    pub fn writes_to(&self, addr: u32) -> Vec<u32> {
        self.writes
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Most recent value written to `addr`.
    pub fn last_write(&self, addr: u32) -> Option<u32> {
        self.writes
            .iter()
            .rev()
            .find(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
    }

    /// Position of the first write to `addr` in the write log.
    pub fn first_write_index(&self, addr: u32) -> Option<usize> {
        self.writes.iter().position(|(a, _)| *a == addr)
    }

    /// Position of the last write to `addr` in the write log.
    pub fn last_write_index(&self, addr: u32) -> Option<usize> {
        self.writes.iter().rposition(|(a, _)| *a == addr)
    }

    /// Current value of `addr` (last write or preset), `0` if never touched.
    pub fn value(&self, addr: u32) -> u32 {
        self.values.get(&addr).copied().unwrap_or(0)
    }

    /// Number of reads issued to `addr`.
    pub fn read_count(&self, addr: u32) -> usize {
        self.reads.iter().filter(|a| **a == addr).count()
    }
}

impl RegisterBus for MockRegisterBus {
    fn read32(&mut self, addr: u32) -> u32 {
        self.reads.push(addr);
        if let Some(script) = self.scripts.get_mut(&addr) {
            let next = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().copied()
            };
            if let Some(value) = next {
                return value;
            }
        }
        self.value(addr)
    }

    fn write32(&mut self, addr: u32, value: u32) {
        self.writes.push((addr, value));
        self.values.insert(addr, value);
    }
}

/// Deterministic monotonic clock.
///
/// Each call to [`Monotonic::now`] returns the current instant and then
/// advances it by `step`. A zero step gives a frozen clock, which models a
/// core timer that was never started.
#[derive(Debug)]
pub struct FakeClock {
    ticks: Cell<u64>,
    step: Duration,
    calls: Cell<u64>,
}

impl FakeClock {
    /// Clock stuck at `at`.
    pub fn frozen(at: Instant) -> Self {
        Self {
            ticks: Cell::new(at.as_ticks()),
            step: Duration::from_ticks(0),
            calls: Cell::new(0),
        }
    }

    /// Clock starting at zero that advances by `step` on every read.
    pub fn stepping(step: Duration) -> Self {
        Self {
            ticks: Cell::new(0),
            step,
            calls: Cell::new(0),
        }
    }

    /// Number of times the clock has been read.
    pub fn reads(&self) -> u64 {
        self.calls.get()
    }
}

impl Monotonic for FakeClock {
    fn now(&self) -> Instant {
        let current = self.ticks.get();
        self.ticks.set(current.saturating_add(self.step.as_ticks()));
        self.calls.set(self.calls.get().saturating_add(1));
        Instant::from_ticks(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_reads_stick_on_last_value() {
        let mut bus = MockRegisterBus::new();
        bus.script_reads(0x48, &[0x10, 0x10, 0x00]);
        assert_eq!(bus.read32(0x48), 0x10);
        assert_eq!(bus.read32(0x48), 0x10);
        assert_eq!(bus.read32(0x48), 0x00);
        assert_eq!(bus.read32(0x48), 0x00);
        assert_eq!(bus.read_count(0x48), 4);
    }

    #[test]
    fn unscripted_reads_return_last_write() {
        let mut bus = MockRegisterBus::new();
        assert_eq!(bus.read32(0x0), 0);
        bus.write32(0x0, 0xdead_beef);
        assert_eq!(bus.read32(0x0), 0xdead_beef);
    }

    #[test]
    fn write_log_tracks_order() {
        let mut bus = MockRegisterBus::new();
        bus.write32(0x4, 1);
        bus.write32(0x8, 2);
        bus.write32(0x4, 3);
        assert_eq!(bus.writes_to(0x4), vec![1, 3]);
        assert_eq!(bus.first_write_index(0x4), Some(0));
        assert_eq!(bus.last_write_index(0x4), Some(2));
        assert_eq!(bus.last_write(0x8), Some(2));
        assert_eq!(bus.last_write(0xC), None);
    }

    #[test]
    fn stepping_clock_advances_per_read() {
        let clock = FakeClock::stepping(Duration::from_ticks(5));
        assert_eq!(clock.now().as_ticks(), 0);
        assert_eq!(clock.now().as_ticks(), 5);
        assert_eq!(clock.reads(), 2);
    }

    #[test]
    fn frozen_clock_never_moves() {
        let clock = FakeClock::frozen(Instant::from_ticks(99));
        for _ in 0..10 {
            assert_eq!(clock.now().as_ticks(), 99);
        }
    }
}
