//! Property-based tests for the memory PLL divider chain.
//!
//! Run with: cargo test -p firmware --test mpll_proptest

// Integration test file -- intentional test patterns permitted.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::arithmetic_side_effects
)]

use firmware::{MpllConfig, POSC_HZ};
use proptest::prelude::*;

fn chain() -> impl Strategy<Value = MpllConfig> {
    (1u32..=63, 16u32..=160, 1u32..=7, 1u32..=7).prop_map(|(idiv, mult, odiv1, odiv2)| {
        MpllConfig {
            reference_hz: POSC_HZ,
            input_divider: idiv,
            multiplier: mult,
            output_divider1: odiv1,
            output_divider2: odiv2,
        }
    })
}

proptest! {
    /// The DRAM period is the shortest whole-picosecond period not faster
    /// than the PLL actually runs.
    #[test]
    fn dram_period_rounds_up(cfg in chain()) {
        let dram_hz = u64::from(cfg.output_hz().unwrap()) * 2;
        prop_assume!(dram_hz > 0);
        let period = u64::from(cfg.memory_clocks().unwrap().dram().period.as_ps());
        prop_assert!(period * dram_hz >= 1_000_000_000_000);
        prop_assert!((period - 1) * dram_hz < 1_000_000_000_000);
    }

    /// The controller runs at half the DRAM clock.
    #[test]
    fn controller_is_half_rate(cfg in chain()) {
        prop_assume!(cfg.output_hz().unwrap() > 0);
        let clocks = cfg.memory_clocks().unwrap();
        prop_assert_eq!(
            clocks.controller().period.as_ps(),
            clocks.dram().period.as_ps() * 2
        );
    }

    /// Every chain that fits the register reads back unchanged.
    #[test]
    fn register_preserves_chain(cfg in chain()) {
        use ddr2::regs::Register;
        let raw = cfg.register().encode().unwrap();
        let back = MpllConfig::from_register(POSC_HZ, &ddr2::regs::syscfg::CfgMpll::decode(raw));
        prop_assert_eq!(back, cfg);
    }
}
