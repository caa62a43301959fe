//! DDR2 PHY register block (self-calibration logic and pad control).

/// Physical base address of the PHY register block.
pub const PHY_BASE: u32 = 0x1F8E_9100;

register! {
    /// Self-calibration start and per-lane result.
    pub struct SclStart: "SCL_START" @ 0x00 {
        /// Byte lane 0 calibrated.
        lane0_pass: bool => LANE0_PASS [0, 1],
        /// Byte lane 1 calibrated.
        lane1_pass: bool => LANE1_PASS [1, 1],
        /// Calibration logic enabled.
        enable: bool => ENABLE [26, 1],
        /// Start a calibration run.
        start: bool => START [28, 1],
    }
}

impl SclStart {
    /// Both byte lanes of the 16-bit bus passed.
    pub const fn passed(&self) -> bool {
        self.lane0_pass && self.lane1_pass
    }
}

register! {
    /// Clock alignment delays used during calibration.
    pub struct SclLatency: "SCL_LAT" @ 0x0C {
        /// Capture clock delay.
        capture_clock_delay: u32 => CAPTURE_CLOCK_DELAY [0, 4],
        /// DDR clock delay.
        ddr_clock_delay: u32 => DDR_CLOCK_DELAY [4, 4],
    }
}

register! {
    /// Calibration framing, read side.
    pub struct SclConfig0: "SCL_CONFIG_0" @ 0x18 {
        /// Calibrate with eight-beat bursts.
        burst8: bool => BURST8 [0, 1],
        /// A DRAM device is attached.
        ddr_connected: bool => DDR_CONNECTED [1, 1],
        /// Read CAS latency in DRAM clocks.
        read_cas_latency: u32 => READ_CAS_LATENCY [4, 4],
        /// Assert ODT on writes during calibration.
        odt_cs_on_write: bool => ODT_CS_ON_WRITE [24, 1],
    }
}

register! {
    /// Calibration framing, write side.
    pub struct SclConfig1: "SCL_CONFIG_1" @ 0x1C {
        /// Chip select 0 takes part in calibration.
        cs0_enable: bool => CS0_ENABLE [0, 1],
        /// Write CAS latency in DRAM clocks.
        write_cas_latency: u32 => WRITE_CAS_LATENCY [8, 4],
    }
}

register! {
    /// Pad termination and drive strength.
    pub struct PadCtrl: "PAD_CTRL" @ 0x20 {
        /// Use ODT on the PHY side.
        odt_select: bool => ODT_SELECT [0, 1],
        /// PHY-side ODT enabled.
        odt_enable: bool => ODT_ENABLE [1, 1],
        /// Output drive select.
        drive_select: u32 => DRIVE_SELECT [2, 2],
        /// ODT pull-down strength code.
        odt_pulldown: u32 => ODT_PULLDOWN [4, 2],
        /// ODT pull-up strength code.
        odt_pullup: u32 => ODT_PULLUP [6, 2],
        /// Extra output enable on the clock pad.
        extra_oen_clk: bool => EXTRA_OEN_CLK [8, 1],
        /// Bypass the external DLL.
        no_external_dll: bool => NO_EXTERNAL_DLL [9, 1],
        /// Write command framing for the DLR test logic.
        dlr_dft_write_cmd: bool => DLR_DFT_WRITE_CMD [13, 1],
        /// PHY runs at half rate.
        half_rate: bool => HALF_RATE [14, 1],
        /// PFET drive strength code.
        drive_strength_pfet: u32 => DRIVE_STRENGTH_PFET [16, 4],
        /// NFET drive strength code.
        drive_strength_nfet: u32 => DRIVE_STRENGTH_NFET [20, 4],
        /// Input receivers enabled.
        receiver_enable: bool => RECEIVER_ENABLE [28, 1],
        /// DQS preamble delay.
        preamble_delay: u32 => PREAMBLE_DELAY [29, 2],
    }
}

register! {
    /// Delay-line recalibration.
    pub struct DllRecalib: "DLL_RECALIB" @ 0x24 {
        /// Controller cycles between periodic recalibrations.
        recalib_count: u32 => RECALIB_COUNT [8, 18],
        /// Suppress periodic recalibration.
        disable_recalib: bool => DISABLE_RECALIB [26, 1],
        /// Delay-line start value.
        delay_start: u32 => DELAY_START [28, 4],
    }
}
