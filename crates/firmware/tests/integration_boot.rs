//! Integration test: simulates DRAM boot on the starter kit using mock peripherals.
//!
//! Tests that:
//!   1. The memory PLL is programmed and locked before the DDR2 controller is ungated
//!   2. Clocks decoded from the PLL settings reach the controller timing registers
//!   3. A PLL that never locks is survivable under best effort and fatal under fail-fast
//!   4. A bad PLL chain is rejected before any register is written
//!   5. A board profile's arbiter table reaches the hardware
//!
//! Does NOT require physical hardware.
//!
//! Run with: cargo test -p firmware --test integration_boot

// Integration test file -- intentional test patterns permitted.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use ddr2::{AgentLimits, ArbiterParams, Ddr2Error, TimeoutPolicy, WaitStage};
use embassy_time::Duration;
use firmware::{bring_up_dram, BoardProfile, BootError, MpllConfig, MpllError};
use platform::mocks::{FakeClock, MockRegisterBus};

const CFGMPLL: u32 = 0x1F80_0100;
const PMD7_CLR: u32 = 0x1F80_00A4;
const MINLIM: u32 = 0x1F8E_8004;
const REFCFG: u32 = 0x1F8E_8028;
const CMDISSUE: u32 = 0x1F8E_8048;
const SCL_START: u32 = 0x1F8E_9100;

/// Board whose PLL locks on the second poll, whose controller drains at
/// once and whose PHY calibrates at once.
fn healthy_board() -> MockRegisterBus {
    let mut bus = MockRegisterBus::new();
    bus.script_reads(CFGMPLL, &[0x0A00_3203, 0x8A80_3203]);
    bus.script_reads(CMDISSUE, &[0x0B]);
    bus.script_reads(SCL_START, &[0x3]);
    bus
}

fn clock() -> FakeClock {
    FakeClock::stepping(Duration::from_micros(1))
}

#[test]
fn starter_kit_boot_is_clean() {
    let mut bus = healthy_board();
    let report = bring_up_dram(&mut bus, &clock(), &BoardProfile::pic32mzda_starter_kit()).unwrap();

    assert!(!report.is_degraded());
    assert_eq!(report.mpll_lock.polls(), 2);
    assert_eq!(report.clocks.dram().period.as_ps(), 2_500);
    assert_eq!(report.dram.size_bytes, 128 * 1024 * 1024);
}

#[test]
fn mpll_locks_before_controller_is_ungated() {
    let mut bus = healthy_board();
    bring_up_dram(&mut bus, &clock(), &BoardProfile::pic32mzda_starter_kit()).unwrap();

    assert_eq!(bus.writes()[0], (CFGMPLL, 0x0A00_3203));
    assert_eq!(bus.writes_to(CFGMPLL).len(), 1);
    assert_eq!(bus.read_count(CFGMPLL), 2);
    assert!(bus.first_write_index(CFGMPLL) < bus.first_write_index(PMD7_CLR));
}

#[test]
fn slower_pll_changes_refresh_timing() {
    // 24 MHz / 3 × 40 / 2 = 160 MHz controller, 320 MHz DRAM (3125 ps).
    let profile = BoardProfile {
        mpll: MpllConfig {
            multiplier: 40,
            ..MpllConfig::pic32mzda_starter_kit()
        },
        ..BoardProfile::pic32mzda_starter_kit()
    };

    let mut fast = healthy_board();
    bring_up_dram(&mut fast, &clock(), &BoardProfile::pic32mzda_starter_kit()).unwrap();
    let mut slow = healthy_board();
    let report = bring_up_dram(&mut slow, &clock(), &profile).unwrap();

    assert_eq!(report.clocks.dram().period.as_ps(), 3_125);
    // Fewer controller clocks per refresh interval at the slower clock.
    let count = |bus: &MockRegisterBus| bus.last_write(REFCFG).unwrap() & 0xFFFF;
    assert!(count(&slow) < count(&fast), "{} !< {}", count(&slow), count(&fast));
}

#[test]
fn unlocked_pll_is_degraded_under_best_effort() {
    let mut bus = MockRegisterBus::new();
    bus.script_reads(CMDISSUE, &[0x0B]);
    bus.script_reads(SCL_START, &[0x3]);
    let profile = BoardProfile {
        poll_timeout_ms: 1,
        ..BoardProfile::pic32mzda_starter_kit()
    };

    let report = bring_up_dram(&mut bus, &clock(), &profile).unwrap();

    assert!(report.is_degraded());
    assert!(!report.mpll_lock.is_ready());
    assert!(!report.dram.is_degraded());
}

#[test]
fn unlocked_pll_is_fatal_under_fail_fast() {
    let mut bus = MockRegisterBus::new();
    let profile = BoardProfile {
        timeout_policy: TimeoutPolicy::FailFast,
        poll_timeout_ms: 1,
        ..BoardProfile::pic32mzda_starter_kit()
    };

    let err = bring_up_dram(&mut bus, &clock(), &profile).unwrap_err();

    assert!(matches!(
        err,
        BootError::Ddr2(Ddr2Error::HardwareTimeout {
            stage: WaitStage::MemoryPllLock,
            ..
        })
    ));
    assert!(bus.writes_to(PMD7_CLR).is_empty());
}

#[test]
fn invalid_pll_chain_writes_nothing() {
    let mut bus = healthy_board();
    let profile = BoardProfile {
        mpll: MpllConfig {
            input_divider: 0,
            ..MpllConfig::pic32mzda_starter_kit()
        },
        ..BoardProfile::pic32mzda_starter_kit()
    };

    let err = bring_up_dram(&mut bus, &clock(), &profile).unwrap_err();

    assert_eq!(err, BootError::Mpll(MpllError::ZeroDivider("input divider")));
    assert!(bus.writes().is_empty());
}

#[test]
fn profile_arbiter_table_is_programmed() {
    let mut bus = healthy_board();
    let profile = BoardProfile {
        arbiter: Some(ArbiterParams {
            agents: [AgentLimits::new(0x0A, 0x80, 0x08); 5],
        }),
        ..BoardProfile::pic32mzda_starter_kit()
    };

    bring_up_dram(&mut bus, &clock(), &profile).unwrap();

    assert_eq!(bus.writes_to(MINLIM), vec![0x0A; 5]);
}
