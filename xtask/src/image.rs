//! `cargo xtask image`: render the register writes DRAM boot performs.
//!
//! Boot runs against a recording bus whose ready bits are scripted to come
//! up at once, so the output is the exact write sequence the target issues
//! for a board profile, in order, with register names resolved.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use ddr2::regs::ctrl::{
    CmdIssue, DlyCfg0, DlyCfg1, DlyCfg2, DlyCfg3, MemCfg0, MemCfg1, MemCfg2, MemCfg3, MemCfg4,
    MemCon, MemWidth, MinCommands, MinLimit, OdtCfg, OdtEnCfg, PwrCfg, RefCfg, RequestPeriod,
    TargetSelect, XferCfg, CMD1_TABLE, CMD2_TABLE, CONTROLLER_BASE, HOST_COMMAND_SLOTS,
};
use ddr2::regs::phy::{
    DllRecalib, PadCtrl, SclConfig0, SclConfig1, SclLatency, SclStart, PHY_BASE,
};
use ddr2::regs::syscfg::{CfgMpll, Pmd7, PMD7_CLR, SYSCFG_BASE, SYSKEY};
use ddr2::regs::Register;
use embassy_time::Duration;
use firmware::{bring_up_dram, BoardProfile};
use platform::mocks::{FakeClock, MockRegisterBus};

/// Output layout for `image`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Coloured address / value / register table.
    Table,
    /// JSON array of `{ "addr", "value", "register" }` objects.
    Json,
}

pub fn run(profile: Option<&Path>, format: Format) -> Result<()> {
    let profile = match profile {
        Some(path) => load_profile(path)?,
        None => BoardProfile::pic32mzda_starter_kit(),
    };
    tracing::info!(board = profile.name.as_str(), "rendering boot image");

    let mut bus = ready_board();
    let clock = FakeClock::stepping(Duration::from_micros(1));
    let report = bring_up_dram(&mut bus, &clock, &profile)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("boot rejected profile '{}'", profile.name))?;

    match format {
        Format::Table => {
            println!();
            println!("{}", format!("DRAM boot image: {}", profile.name).cyan().bold());
            println!(
                "{}",
                format!(
                    "  DRAM tCK {} ps, {} MiB",
                    report.clocks.dram().period.as_ps(),
                    report.dram.size_bytes / (1024 * 1024)
                )
                .dimmed()
            );
            println!();
            for (n, (addr, value)) in bus.writes().iter().enumerate() {
                println!(
                    "  {:>3}  {}  {}  {}",
                    n,
                    format!("{addr:#010x}").yellow(),
                    format!("{value:#010x}").green(),
                    register_name(*addr)
                );
            }
            println!();
            println!("{}", format!("{} writes", bus.writes().len()).bold());
            println!();
        }
        Format::Json => {
            let rows: Vec<_> = bus
                .writes()
                .iter()
                .map(|&(addr, value)| {
                    serde_json::json!({
                        "addr": format!("{addr:#010x}"),
                        "value": format!("{value:#010x}"),
                        "register": register_name(addr),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}

fn load_profile(path: &Path) -> Result<BoardProfile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid board profile {}", path.display()))
}

/// A bus on which the PLL locks, the command table drains and calibration
/// passes on the first poll.
fn ready_board() -> MockRegisterBus {
    let mut bus = MockRegisterBus::new();
    // RDY and VREG_RDY.
    bus.script_reads(SYSCFG_BASE + CfgMpll::OFFSET, &[0x8080_0000]);
    bus.script_reads(CONTROLLER_BASE + CmdIssue::OFFSET, &[0]);
    bus.script_reads(PHY_BASE + SclStart::OFFSET, &[0x3]);
    bus
}

/// Register name for a physical address written during boot.
pub fn register_name(addr: u32) -> String {
    let named: [(u32, u32, &str); 31] = [
        (SYSCFG_BASE, SYSKEY, "SYSKEY"),
        (SYSCFG_BASE, PMD7_CLR, "PMD7CLR"),
        (SYSCFG_BASE, Pmd7::OFFSET, Pmd7::NAME),
        (SYSCFG_BASE, CfgMpll::OFFSET, CfgMpll::NAME),
        (CONTROLLER_BASE, TargetSelect::OFFSET, TargetSelect::NAME),
        (CONTROLLER_BASE, MinLimit::OFFSET, MinLimit::NAME),
        (CONTROLLER_BASE, RequestPeriod::OFFSET, RequestPeriod::NAME),
        (CONTROLLER_BASE, MinCommands::OFFSET, MinCommands::NAME),
        (CONTROLLER_BASE, MemCon::OFFSET, MemCon::NAME),
        (CONTROLLER_BASE, MemCfg0::OFFSET, MemCfg0::NAME),
        (CONTROLLER_BASE, MemCfg1::OFFSET, MemCfg1::NAME),
        (CONTROLLER_BASE, MemCfg2::OFFSET, MemCfg2::NAME),
        (CONTROLLER_BASE, MemCfg3::OFFSET, MemCfg3::NAME),
        (CONTROLLER_BASE, MemCfg4::OFFSET, MemCfg4::NAME),
        (CONTROLLER_BASE, RefCfg::OFFSET, RefCfg::NAME),
        (CONTROLLER_BASE, PwrCfg::OFFSET, PwrCfg::NAME),
        (CONTROLLER_BASE, DlyCfg0::OFFSET, DlyCfg0::NAME),
        (CONTROLLER_BASE, DlyCfg1::OFFSET, DlyCfg1::NAME),
        (CONTROLLER_BASE, DlyCfg2::OFFSET, DlyCfg2::NAME),
        (CONTROLLER_BASE, DlyCfg3::OFFSET, DlyCfg3::NAME),
        (CONTROLLER_BASE, OdtCfg::OFFSET, OdtCfg::NAME),
        (CONTROLLER_BASE, XferCfg::OFFSET, XferCfg::NAME),
        (CONTROLLER_BASE, CmdIssue::OFFSET, CmdIssue::NAME),
        (CONTROLLER_BASE, OdtEnCfg::OFFSET, OdtEnCfg::NAME),
        (CONTROLLER_BASE, MemWidth::OFFSET, MemWidth::NAME),
        (PHY_BASE, SclStart::OFFSET, SclStart::NAME),
        (PHY_BASE, SclLatency::OFFSET, SclLatency::NAME),
        (PHY_BASE, SclConfig0::OFFSET, SclConfig0::NAME),
        (PHY_BASE, SclConfig1::OFFSET, SclConfig1::NAME),
        (PHY_BASE, PadCtrl::OFFSET, PadCtrl::NAME),
        (PHY_BASE, DllRecalib::OFFSET, DllRecalib::NAME),
    ];
    if let Some((_, _, name)) = named.iter().find(|(base, off, _)| base + off == addr) {
        return (*name).to_string();
    }

    let slot_bytes = 4 * HOST_COMMAND_SLOTS as u32;
    for (table, prefix) in [(CMD1_TABLE, "CMD1"), (CMD2_TABLE, "CMD2")] {
        let start = CONTROLLER_BASE + table;
        if (start..start + slot_bytes).contains(&addr) {
            return format!("{prefix}{:X}", (addr - start) / 4);
        }
    }
    "?".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_across_blocks() {
        assert_eq!(register_name(0x1F80_0030), "SYSKEY");
        assert_eq!(register_name(0x1F80_0100), "CFGMPLL");
        assert_eq!(register_name(0x1F8E_8010), "MEMCON");
        assert_eq!(register_name(0x1F8E_9124), "DLL_RECALIB");
    }

    #[test]
    fn host_command_slots_are_numbered_in_hex() {
        assert_eq!(register_name(0x1F8E_8080), "CMD10");
        assert_eq!(register_name(0x1F8E_80AC), "CMD1B");
        assert_eq!(register_name(0x1F8E_80EC), "CMD2B");
        assert_eq!(register_name(0x1F8E_8100), "?");
    }

    #[test]
    fn starter_kit_image_renders() {
        let mut bus = ready_board();
        let clock = FakeClock::stepping(Duration::from_micros(1));
        let report =
            bring_up_dram(&mut bus, &clock, &BoardProfile::pic32mzda_starter_kit()).unwrap();
        assert!(!report.is_degraded());
        assert!(bus.writes().iter().all(|(addr, _)| register_name(*addr) != "?"));
    }
}
