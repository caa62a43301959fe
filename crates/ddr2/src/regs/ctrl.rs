//! DDR2 controller register block (`DDR2TSEL` … `DDR2MEMWIDTH`, host command
//! table).
//!
//! Offsets are relative to [`CONTROLLER_BASE`]. Field positions follow the
//! PIC32MZ DA family reference manual, DDR SDRAM controller chapter.

/// Physical base address of the controller register block.
pub const CONTROLLER_BASE: u32 = 0x1F8E_8000;

/// Bus agents with their own arbitration limits.
pub const ARBITER_AGENTS: usize = 5;

/// Host command table slots.
pub const HOST_COMMAND_SLOTS: usize = 16;

/// Offset of host command table word 1, slot 0.
pub const CMD1_TABLE: u32 = 0x80;

/// Offset of host command table word 2, slot 0.
pub const CMD2_TABLE: u32 = 0xC0;

/// Offset of `CMD1` for `slot`, `None` past the table end.
pub const fn cmd1_offset(slot: usize) -> Option<u32> {
    slot_offset(CMD1_TABLE, slot)
}

/// Offset of `CMD2` for `slot`, `None` past the table end.
pub const fn cmd2_offset(slot: usize) -> Option<u32> {
    slot_offset(CMD2_TABLE, slot)
}

#[allow(clippy::cast_possible_truncation)]
const fn slot_offset(table: u32, slot: usize) -> Option<u32> {
    if slot >= HOST_COMMAND_SLOTS {
        return None;
    }
    match (slot as u32).checked_mul(4) {
        Some(step) => table.checked_add(step),
        None => None,
    }
}

register! {
    /// Arbiter target select: bit offset of the agent whose limit the next
    /// `MINLIM`/`RQPER`/`MINCMD` write updates.
    pub struct TargetSelect: "TSEL" @ 0x00 {
        /// Agent index × field width of the register about to be written.
        bit_offset: u32 => BIT_OFFSET [0, 8],
    }
}

register! {
    /// Minimum burst limit of the selected agent.
    pub struct MinLimit: "MINLIM" @ 0x04 {
        /// Bursts the agent may issue before losing the bus.
        limit: u32 => LIMIT [0, 5],
    }
}

register! {
    /// Request period of the selected agent.
    pub struct RequestPeriod: "RQPER" @ 0x08 {
        /// Controller cycles between forced grants.
        period: u32 => PERIOD [0, 8],
    }
}

register! {
    /// Minimum accepted commands of the selected agent.
    pub struct MinCommands: "MINCMD" @ 0x0C {
        /// Commands accepted per grant.
        count: u32 => COUNT [0, 8],
    }
}

impl TargetSelect {
    /// Width of `MINLIM` per agent in the packed hardware array.
    pub const MIN_LIMIT_STRIDE: u32 = 5;
    /// Width of `RQPER` per agent.
    pub const REQUEST_PERIOD_STRIDE: u32 = 8;
    /// Width of `MINCMD` per agent.
    pub const MIN_COMMANDS_STRIDE: u32 = 8;
}

register! {
    /// Memory controller control.
    pub struct MemCon: "MEMCON" @ 0x10 {
        /// Start executing the host command table.
        init_start: bool => INIT_START [0, 1],
        /// Initialisation finished; normal traffic allowed.
        init_done: bool => INIT_DONE [1, 1],
    }
}

register! {
    /// Address decode shifts.
    pub struct MemCfg0: "MEMCFG0" @ 0x14 {
        /// Right shift applied before masking the row address.
        row_shift: u32 => ROW_SHIFT [0, 5],
        /// Right shift applied before masking the bank address.
        bank_shift: u32 => BANK_SHIFT [8, 5],
        /// Right shift applied before masking the chip-select bits.
        cs_shift: u32 => CS_SHIFT [16, 5],
        /// Right shift applied before masking the high column bits.
        col_hi_shift: u32 => COL_HI_SHIFT [24, 5],
        /// Serve same-bank requests before row misses.
        same_bank_priority: bool => SAME_BANK_PRIORITY [29, 1],
        /// Close the row after every access.
        auto_precharge: bool => AUTO_PRECHARGE [30, 1],
    }
}

register! {
    /// Row address mask.
    pub struct MemCfg1: "MEMCFG1" @ 0x18 {
        /// Mask applied after `row_shift`.
        row_mask: u32 => ROW_MASK [0, 16],
    }
}

register! {
    /// High column address mask.
    pub struct MemCfg2: "MEMCFG2" @ 0x1C {
        /// Mask applied after `col_hi_shift`.
        col_hi_mask: u32 => COL_HI_MASK [0, 16],
    }
}

register! {
    /// Low column address mask.
    pub struct MemCfg3: "MEMCFG3" @ 0x20 {
        /// Mask applied to the unshifted address.
        col_lo_mask: u32 => COL_LO_MASK [0, 16],
    }
}

register! {
    /// Bank and chip-select masks.
    pub struct MemCfg4: "MEMCFG4" @ 0x24 {
        /// Mask applied after `bank_shift`.
        bank_mask: u32 => BANK_MASK [0, 3],
        /// Mask applied after `cs_shift`.
        cs_mask: u32 => CS_MASK [8, 8],
    }
}

register! {
    /// Refresh configuration.
    pub struct RefCfg: "REFCFG" @ 0x28 {
        /// Controller cycles between refreshes, minus two.
        refresh_count: u32 => REFRESH_COUNT [0, 16],
        /// Refresh command duration in controller cycles, minus two.
        refresh_delay: u32 => REFRESH_DELAY [16, 8],
        /// Refreshes the controller may postpone.
        max_pending: u32 => MAX_PENDING [24, 3],
    }
}

register! {
    /// Power management.
    pub struct PwrCfg: "PWRCFG" @ 0x2C {
        /// ECC generation.
        ecc: bool => ECC [0, 1],
        /// Single-bit error correction.
        error_correction: bool => ERROR_CORRECTION [1, 1],
        /// Enter power-down after `power_down_delay` idle cycles.
        auto_power_down: bool => AUTO_POWER_DOWN [2, 1],
        /// Enter self-refresh after `self_refresh_delay` idle cycles.
        auto_self_refresh: bool => AUTO_SELF_REFRESH [3, 1],
        /// Idle controller cycles before power-down.
        power_down_delay: u32 => POWER_DOWN_DELAY [4, 8],
        /// Idle controller cycles before self-refresh.
        self_refresh_delay: u32 => SELF_REFRESH_DELAY [12, 10],
        /// Only power down with all banks precharged.
        precharge_power_down_only: bool => PRECHARGE_POWER_DOWN_ONLY [22, 1],
    }
}

register! {
    /// Command-to-command delays, part 0 (controller cycles).
    pub struct DlyCfg0: "DLYCFG0" @ 0x30 {
        /// Write to read, same chip select (low 4 bits).
        wr2rd: u32 => WR2RD [0, 4],
        /// Write to read, different chip select (low 4 bits).
        wr2rd_cs: u32 => WR2RD_CS [4, 4],
        /// Read to read, same chip select.
        rd2rd: u32 => RD2RD [8, 4],
        /// Read to read, different chip select.
        rd2rd_cs: u32 => RD2RD_CS [12, 4],
        /// Write to write, same chip select.
        wr2wr: u32 => WR2WR [16, 4],
        /// Write to write, different chip select.
        wr2wr_cs: u32 => WR2WR_CS [20, 4],
        /// Read to write.
        rd2wr: u32 => RD2WR [24, 4],
        /// Read-modify-write turnaround.
        rmw: u32 => RMW [28, 4],
    }
}

register! {
    /// Command-to-command delays, part 1, plus the high bits of fields that
    /// do not fit their 4-bit slots elsewhere.
    pub struct DlyCfg1: "DLYCFG1" @ 0x34 {
        /// Minimum self-refresh residency.
        self_refresh_min: u32 => SELF_REFRESH_MIN [0, 8],
        /// Self-refresh exit delay (low 8 bits).
        self_refresh_exit: u32 => SELF_REFRESH_EXIT [8, 8],
        /// Minimum power-down residency.
        power_down_min: u32 => POWER_DOWN_MIN [16, 4],
        /// Power-down exit delay.
        power_down_exit: u32 => POWER_DOWN_EXIT [20, 4],
        /// Bit 4 of `DLYCFG2.wr2prech`.
        wr2prech_hi: u32 => WR2PRECH_HI [26, 1],
        /// Bit 4 of `DLYCFG0.wr2rd`.
        wr2rd_hi: u32 => WR2RD_HI [27, 1],
        /// Bit 4 of `DLYCFG0.wr2rd_cs`.
        wr2rd_cs_hi: u32 => WR2RD_CS_HI [28, 1],
        /// Bit 4 of the next-data-available delay.
        data_avail_hi: u32 => DATA_AVAIL_HI [29, 1],
        /// Bit 8 of `self_refresh_exit`.
        self_refresh_exit_hi: u32 => SELF_REFRESH_EXIT_HI [30, 1],
    }
}

register! {
    /// Command-to-command delays, part 2.
    pub struct DlyCfg2: "DLYCFG2" @ 0x38 {
        /// Precharge-all period.
        prech_all: u32 => PRECH_ALL [0, 4],
        /// Read to precharge.
        rd2prech: u32 => RD2PRECH [8, 4],
        /// Write to precharge (low 4 bits).
        wr2prech: u32 => WR2PRECH [12, 4],
        /// Activate to activate, different bank.
        ras2ras: u32 => RAS2RAS [16, 4],
        /// Activate to read/write.
        ras2cas: u32 => RAS2CAS [20, 4],
        /// Precharge to activate.
        prech2ras: u32 => PRECH2RAS [24, 4],
        /// Read burst end.
        read_burst_end: u32 => READ_BURST_END [28, 4],
    }
}

register! {
    /// Command-to-command delays, part 3.
    pub struct DlyCfg3: "DLYCFG3" @ 0x3C {
        /// Activate to precharge.
        ras_min: u32 => RAS_MIN [0, 5],
        /// Activate to activate, same bank.
        row_cycle: u32 => ROW_CYCLE [8, 6],
        /// Four-activate window.
        faw: u32 => FAW [16, 6],
    }
}

register! {
    /// On-die termination timing.
    pub struct OdtCfg: "ODTCFG" @ 0x40 {
        /// Read command to ODT assert.
        read_delay: u32 => READ_DELAY [8, 4],
        /// Write command to ODT assert.
        write_delay: u32 => WRITE_DELAY [12, 4],
        /// ODT assertion length on reads.
        read_length: u32 => READ_LENGTH [16, 3],
        /// ODT assertion length on writes.
        write_length: u32 => WRITE_LENGTH [20, 3],
    }
}

register! {
    /// Data transfer timing.
    pub struct XferCfg: "XFERCFG" @ 0x44 {
        /// Next data request delay.
        next_data_request: u32 => NEXT_DATA_REQUEST [0, 4],
        /// Next data available delay (low 4 bits).
        next_data_available: u32 => NEXT_DATA_AVAILABLE [4, 4],
        /// Read data enable delay.
        read_enable_delay: u32 => READ_ENABLE_DELAY [16, 4],
        /// Maximum burst length on the agent bus.
        max_burst: u32 => MAX_BURST [24, 4],
        /// Write data return hold-off.
        return_delay: u32 => RETURN_DELAY [28, 3],
        /// Big-endian data path.
        big_endian: bool => BIG_ENDIAN [31, 1],
    }
}

register! {
    /// Host command issue.
    pub struct CmdIssue: "CMDISSUE" @ 0x48 {
        /// Index of the last valid table slot (command count - 1).
        last_slot: u32 => LAST_SLOT [0, 4],
        /// Table valid; cleared by hardware once every command has run.
        valid: bool => VALID [4, 1],
    }
}

register! {
    /// On-die termination enable per chip select.
    pub struct OdtEnCfg: "ODTENCFG" @ 0x4C {
        /// Assert ODT on chip select 0 during writes.
        write_cs0: bool => WRITE_CS0 [16, 1],
    }
}

register! {
    /// Data path width.
    pub struct MemWidth: "MEMWIDTH" @ 0x50 {
        /// Controller runs at half the DRAM clock.
        half_rate: bool => HALF_RATE [3, 1],
    }
}

register! {
    /// Host command table word 1. Offset is slot 0; see [`cmd1_offset`].
    pub struct HostCmd1: "CMD10" @ 0x80 {
        /// RAS/CAS/WE/CS pin pattern of the command.
        pins: u32 => PINS [0, 24],
        /// Address bits A7..A0.
        address_lo: u32 => ADDRESS_LO [24, 8],
    }
}

register! {
    /// Host command table word 2. Offset is slot 0; see [`cmd2_offset`].
    pub struct HostCmd2: "CMD20" @ 0xC0 {
        /// Address bits A15..A8.
        address_hi: u32 => ADDRESS_HI [0, 8],
        /// Bank address.
        bank: u32 => BANK [8, 3],
        /// DRAM clocks to wait after this command, minus two.
        delay: u32 => DELAY [11, 21],
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::regs::{fields_are_disjoint, Register};

    #[test]
    fn no_register_has_overlapping_fields() {
        let tables: &[(&str, &[crate::regs::Field])] = &[
            (TargetSelect::NAME, TargetSelect::FIELDS),
            (MinLimit::NAME, MinLimit::FIELDS),
            (RequestPeriod::NAME, RequestPeriod::FIELDS),
            (MinCommands::NAME, MinCommands::FIELDS),
            (MemCon::NAME, MemCon::FIELDS),
            (MemCfg0::NAME, MemCfg0::FIELDS),
            (MemCfg1::NAME, MemCfg1::FIELDS),
            (MemCfg2::NAME, MemCfg2::FIELDS),
            (MemCfg3::NAME, MemCfg3::FIELDS),
            (MemCfg4::NAME, MemCfg4::FIELDS),
            (RefCfg::NAME, RefCfg::FIELDS),
            (PwrCfg::NAME, PwrCfg::FIELDS),
            (DlyCfg0::NAME, DlyCfg0::FIELDS),
            (DlyCfg1::NAME, DlyCfg1::FIELDS),
            (DlyCfg2::NAME, DlyCfg2::FIELDS),
            (DlyCfg3::NAME, DlyCfg3::FIELDS),
            (OdtCfg::NAME, OdtCfg::FIELDS),
            (XferCfg::NAME, XferCfg::FIELDS),
            (CmdIssue::NAME, CmdIssue::FIELDS),
            (OdtEnCfg::NAME, OdtEnCfg::FIELDS),
            (MemWidth::NAME, MemWidth::FIELDS),
            (HostCmd1::NAME, HostCmd1::FIELDS),
            (HostCmd2::NAME, HostCmd2::FIELDS),
        ];
        for (name, fields) in tables {
            assert!(fields_are_disjoint(fields), "{name} has overlapping fields");
        }
    }

    #[test]
    fn register_offsets_are_unique_and_word_aligned() {
        let offsets = [
            TargetSelect::OFFSET,
            MinLimit::OFFSET,
            RequestPeriod::OFFSET,
            MinCommands::OFFSET,
            MemCon::OFFSET,
            MemCfg0::OFFSET,
            MemCfg1::OFFSET,
            MemCfg2::OFFSET,
            MemCfg3::OFFSET,
            MemCfg4::OFFSET,
            RefCfg::OFFSET,
            PwrCfg::OFFSET,
            DlyCfg0::OFFSET,
            DlyCfg1::OFFSET,
            DlyCfg2::OFFSET,
            DlyCfg3::OFFSET,
            OdtCfg::OFFSET,
            XferCfg::OFFSET,
            CmdIssue::OFFSET,
            OdtEnCfg::OFFSET,
            MemWidth::OFFSET,
        ];
        for (i, a) in offsets.iter().enumerate() {
            assert_eq!(a % 4, 0);
            assert!(offsets.iter().skip(i + 1).all(|b| b != a), "duplicate offset {a:#x}");
        }
    }

    #[test]
    fn host_command_table_bounds() {
        assert_eq!(cmd1_offset(0), Some(0x80));
        assert_eq!(cmd1_offset(15), Some(0xBC));
        assert_eq!(cmd2_offset(11), Some(0xEC));
        assert_eq!(cmd1_offset(16), None);
        assert_eq!(cmd2_offset(usize::MAX), None);
    }

    #[test]
    fn memcfg0_starter_kit_word() {
        let reg = MemCfg0 {
            row_shift: 13,
            bank_shift: 10,
            cs_shift: 0,
            col_hi_shift: 0,
            same_bank_priority: true,
            auto_precharge: true,
        };
        assert_eq!(reg.encode(), Ok(0x6000_0A0D));
        assert_eq!(MemCfg0::decode(0x6000_0A0D), reg);
    }

    #[test]
    fn cmdissue_valid_is_bit_four() {
        let reg = CmdIssue {
            last_slot: 11,
            valid: true,
        };
        assert_eq!(reg.encode(), Ok(0x1B));
        assert!(!CmdIssue::decode(0x0B).valid);
    }

    #[test]
    fn host_cmd2_delay_overflow_is_reported() {
        let reg = HostCmd2 {
            address_hi: 0,
            bank: 8,
            delay: 0,
        };
        let err = reg.encode().err().unwrap_or_else(|| panic!("bank 8 must overflow"));
        assert_eq!(err.register, "CMD20");
        assert_eq!(err.field, "bank");
    }
}
