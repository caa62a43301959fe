//! Address decode, refresh, power and delay configuration.
//!
//! [`ControllerImage::compute`] derives every controller register from the
//! timing table, the geometry and the clocks; [`ControllerImage::encode`]
//! packs them. Nothing touches the bus until both have succeeded.
//!
//! Address decode model, most significant first: chip select, row, bank,
//! column.

use platform::{RegisterBlock, RegisterBus};

use crate::convert::{FieldBias, MemoryClocks};
use crate::error::FieldOverflow;
use crate::geometry::AddressGeometry;
use crate::log::debug;
use crate::regs::ctrl::{
    DlyCfg0, DlyCfg1, DlyCfg2, DlyCfg3, MemCfg0, MemCfg1, MemCfg2, MemCfg3, MemCfg4, MemWidth,
    OdtCfg, OdtEnCfg, PwrCfg, RefCfg, XferCfg,
};
use crate::regs::{Field, Register};
use crate::timing::TimingSpec;

/// Refreshes the controller may postpone.
const MAX_PENDING_REFRESH: u32 = 7;

/// Idle cycles before power-down (power-down itself stays disabled).
const POWER_DOWN_DELAY: u32 = 8;

/// Idle cycles before automatic self-refresh.
const SELF_REFRESH_DELAY: u32 = 17;

/// Lower bound on the cross-chip-select write-to-read turnaround.
const MIN_WR2RD_CS: u32 = 3;

/// ODT assertion length on reads and writes, controller cycles.
const ODT_READ_LENGTH: u32 = 2;
const ODT_WRITE_LENGTH: u32 = 3;

/// Typed register set for one controller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerImage {
    /// Data path width / rate.
    pub memwidth: MemWidth,
    /// Address decode shifts.
    pub memcfg0: MemCfg0,
    /// Row mask.
    pub memcfg1: MemCfg1,
    /// High column mask.
    pub memcfg2: MemCfg2,
    /// Low column mask.
    pub memcfg3: MemCfg3,
    /// Bank / chip-select masks.
    pub memcfg4: MemCfg4,
    /// Refresh.
    pub refcfg: RefCfg,
    /// Power management.
    pub pwrcfg: PwrCfg,
    /// Delays, part 0.
    pub dlycfg0: DlyCfg0,
    /// Delays, part 1.
    pub dlycfg1: DlyCfg1,
    /// Delays, part 2.
    pub dlycfg2: DlyCfg2,
    /// Delays, part 3.
    pub dlycfg3: DlyCfg3,
    /// ODT timing.
    pub odtcfg: OdtCfg,
    /// ODT enables.
    pub odtencfg: OdtEnCfg,
    /// Transfer timing.
    pub xfercfg: XferCfg,
}

impl ControllerImage {
    /// Derive the controller configuration.
    ///
    /// Delay fields are in controller cycles unless noted; the fixed offset
    /// each field subtracts is spelled out with a [`FieldBias`].
    pub fn compute(
        timing: &TimingSpec,
        geometry: &AddressGeometry,
        clocks: MemoryClocks,
    ) -> Result<Self, FieldOverflow> {
        let ctl = clocks.controller();
        let dram = clocks.dram();
        let bl = timing.burst_cycles;
        let rl = timing.read_latency();
        let wl = timing.write_latency();

        // Address decode.
        let col = u32::from(geometry.column_bits());
        let bank = u32::from(geometry.bank_bits());
        let row = u32::from(geometry.row_bits());
        let cs = u32::from(geometry.chip_select_bits());
        let memcfg0 = MemCfg0 {
            row_shift: col.saturating_add(bank),
            bank_shift: col,
            cs_shift: if cs == 0 {
                0
            } else {
                col.saturating_add(bank).saturating_add(row)
            },
            col_hi_shift: 0,
            same_bank_priority: true,
            auto_precharge: true,
        };

        // Refresh.
        let refcfg = RefCfg {
            refresh_count: FieldBias::MinusTwo.apply(ctl.cycles(timing.refresh_interval)),
            refresh_delay: FieldBias::MinusTwo.apply(ctl.cycles(timing.refresh_cycle)),
            max_pending: MAX_PENDING_REFRESH,
        };

        // Turnarounds that carry a fifth bit in DLYCFG1.
        let wr2rd = ctl.cycles(timing.write_to_read).saturating_add(wl).saturating_add(bl);
        let wr2rd_cs = FieldBias::MinusOne.apply(wr2rd).max(MIN_WR2RD_CS);
        let wr2prech = ctl.cycles(timing.write_recovery).saturating_add(wl).saturating_add(bl);
        let data_avail = rl.saturating_add(5);
        let (wr2rd_lo, wr2rd_hi) = split(DlyCfg0::NAME, "wr2rd", wr2rd, 4)?;
        let (wr2rd_cs_lo, wr2rd_cs_hi) = split(DlyCfg0::NAME, "wr2rd_cs", wr2rd_cs, 4)?;
        let (wr2prech_lo, wr2prech_hi) = split(DlyCfg2::NAME, "wr2prech", wr2prech, 4)?;
        let (_, data_avail_hi) = split(DlyCfg1::NAME, "data_avail", data_avail, 4)?;

        // Self-refresh exit waits out DLL lock. The low byte holds the
        // count minus two, the ninth bit comes from the unbiased count.
        let dll_lock = ctl.cycles(timing.dll_lock);
        let (_, sr_exit_hi) = split(DlyCfg1::NAME, "self_refresh_exit", dll_lock, 8)?;
        let sr_exit_lo =
            Field::new("self_refresh_exit", 0, 8).extract(FieldBias::MinusTwo.apply(dll_lock));

        let dlycfg0 = DlyCfg0 {
            wr2rd: wr2rd_lo,
            wr2rd_cs: wr2rd_cs_lo,
            rd2rd: FieldBias::MinusOne.apply(bl),
            rd2rd_cs: bl,
            wr2wr: FieldBias::MinusOne.apply(bl),
            wr2wr_cs: FieldBias::MinusOne.apply(bl),
            rd2wr: bl.saturating_add(2),
            rmw: rl.saturating_sub(wl).saturating_add(3),
        };

        // CKE and power-down exit residencies count DRAM clocks.
        let cke = dram.cycles(timing.cke_min);
        let xp = dram.cycles(timing.power_down_exit).max(cke);
        let dlycfg1 = DlyCfg1 {
            self_refresh_min: FieldBias::MinusOne.apply(cke),
            self_refresh_exit: sr_exit_lo,
            power_down_min: FieldBias::MinusOne.apply(cke),
            power_down_exit: FieldBias::MinusOne.apply(xp),
            wr2prech_hi,
            wr2rd_hi,
            wr2rd_cs_hi,
            data_avail_hi,
            self_refresh_exit_hi: sr_exit_hi,
        };

        let dlycfg2 = DlyCfg2 {
            prech_all: FieldBias::Exact.apply(ctl.cycles(timing.precharge)),
            rd2prech: ctl
                .cycles(timing.read_to_precharge)
                .saturating_add(bl)
                .saturating_sub(2),
            wr2prech: wr2prech_lo,
            ras2ras: FieldBias::MinusOne.apply(ctl.cycles(timing.ras_to_ras)),
            ras2cas: FieldBias::MinusOne.apply(ctl.cycles(timing.ras_to_cas)),
            prech2ras: FieldBias::MinusOne.apply(ctl.cycles(timing.precharge)),
            read_burst_end: rl.saturating_add(3),
        };

        let dlycfg3 = DlyCfg3 {
            ras_min: FieldBias::MinusOne.apply(ctl.cycles(timing.ras_min)),
            row_cycle: FieldBias::MinusOne.apply(ctl.cycles(timing.row_cycle)),
            faw: FieldBias::MinusOne.apply(ctl.cycles(timing.four_activate_window)),
        };

        Ok(Self {
            memwidth: MemWidth { half_rate: true },
            memcfg0,
            memcfg1: MemCfg1 {
                row_mask: low_mask(row),
            },
            memcfg2: MemCfg2 { col_hi_mask: 0 },
            memcfg3: MemCfg3 {
                col_lo_mask: low_mask(col),
            },
            memcfg4: MemCfg4 {
                bank_mask: low_mask(bank),
                cs_mask: low_mask(cs),
            },
            refcfg,
            pwrcfg: PwrCfg {
                auto_self_refresh: true,
                power_down_delay: POWER_DOWN_DELAY,
                self_refresh_delay: SELF_REFRESH_DELAY,
                ..PwrCfg::default()
            },
            dlycfg0,
            dlycfg1,
            dlycfg2,
            dlycfg3,
            odtcfg: OdtCfg {
                read_delay: rl.saturating_sub(3),
                write_delay: wl.saturating_sub(3),
                read_length: ODT_READ_LENGTH,
                write_length: ODT_WRITE_LENGTH,
            },
            odtencfg: OdtEnCfg { write_cs0: true },
            xfercfg: XferCfg {
                next_data_request: 2,
                next_data_available: 4,
                read_enable_delay: 2,
                max_burst: 3,
                return_delay: 7,
                big_endian: false,
            },
        })
    }

    /// Pack every register.
    pub fn encode(&self) -> Result<ControllerWords, FieldOverflow> {
        Ok(ControllerWords {
            memwidth: (MemWidth::OFFSET, self.memwidth.encode()?),
            body: [
                (MemCfg0::OFFSET, self.memcfg0.encode()?),
                (MemCfg1::OFFSET, self.memcfg1.encode()?),
                (MemCfg2::OFFSET, self.memcfg2.encode()?),
                (MemCfg3::OFFSET, self.memcfg3.encode()?),
                (MemCfg4::OFFSET, self.memcfg4.encode()?),
                (RefCfg::OFFSET, self.refcfg.encode()?),
                (PwrCfg::OFFSET, self.pwrcfg.encode()?),
                (DlyCfg0::OFFSET, self.dlycfg0.encode()?),
                (DlyCfg1::OFFSET, self.dlycfg1.encode()?),
                (DlyCfg2::OFFSET, self.dlycfg2.encode()?),
                (DlyCfg3::OFFSET, self.dlycfg3.encode()?),
                // ODT timing is cleared while the enables change.
                (OdtCfg::OFFSET, 0),
                (OdtEnCfg::OFFSET, self.odtencfg.encode()?),
                (OdtCfg::OFFSET, self.odtcfg.encode()?),
                (XferCfg::OFFSET, self.xfercfg.encode()?),
            ],
        })
    }
}

/// Packed controller configuration as `(offset, value)` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerWords {
    memwidth: (u32, u32),
    body: [(u32, u32); 15],
}

impl ControllerWords {
    /// Write `MEMWIDTH`. Goes before the arbiter.
    pub fn program_width<B: RegisterBus>(&self, bus: &mut B, ctrl: RegisterBlock) {
        let (offset, value) = self.memwidth;
        bus.write32(ctrl.at(offset), value);
    }

    /// Write address decode, refresh, power, delay, ODT and transfer
    /// registers, in that order. Goes after the arbiter.
    pub fn program_address_and_timing<B: RegisterBus>(&self, bus: &mut B, ctrl: RegisterBlock) {
        for &(offset, value) in &self.body {
            bus.write32(ctrl.at(offset), value);
        }
        debug!("controller address/timing registers programmed");
    }

    /// Every write, in programming order, arbiter excluded.
    pub fn writes(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        core::iter::once(self.memwidth).chain(self.body.iter().copied())
    }
}

/// All-ones mask of `bits` bits.
fn low_mask(bits: u32) -> u32 {
    let width = u8::try_from(bits).unwrap_or(32).min(32);
    Field::new("mask", 0, width).max()
}

/// Split `value` into its low `low_bits` and the single bit above them.
fn split(
    register: &'static str,
    field: &'static str,
    value: u32,
    low_bits: u8,
) -> Result<(u32, u32), FieldOverflow> {
    let whole = Field::new(field, 0, low_bits.saturating_add(1));
    if value > whole.max() {
        return Err(FieldOverflow {
            register,
            field,
            value,
        });
    }
    Ok((
        Field::new(field, 0, low_bits).extract(value),
        Field::bit(field, low_bits).extract(value),
    ))
}
