//! DRAM address geometry and capacity.

use core::fmt;

/// Why an [`AddressGeometry`] was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeometryError {
    /// Column bits outside 8..=12.
    ColumnBits(u8),
    /// Bank bits outside 2..=3.
    BankBits(u8),
    /// Row bits outside 12..=16.
    RowBits(u8),
    /// Chip-select count not 1, 2 or 4.
    ChipSelects(u8),
    /// Bus width not 8, 16 or 32 bits.
    BusWidth(u8),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ColumnBits(n) => write!(f, "unsupported column address width {n}"),
            Self::BankBits(n) => write!(f, "unsupported bank address width {n}"),
            Self::RowBits(n) => write!(f, "unsupported row address width {n}"),
            Self::ChipSelects(n) => write!(f, "unsupported chip-select count {n}"),
            Self::BusWidth(n) => write!(f, "unsupported data bus width {n}"),
        }
    }
}

/// How a linear address splits into column, bank, row and chip select.
///
/// Construction validates the ranges DDR2 parts actually use, which keeps
/// every shift and mask computed from a geometry in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AddressGeometry {
    column_bits: u8,
    bank_bits: u8,
    row_bits: u8,
    chip_selects: u8,
    bus_width_bits: u8,
}

impl AddressGeometry {
    /// Validate and build a geometry.
    pub const fn new(
        column_bits: u8,
        bank_bits: u8,
        row_bits: u8,
        chip_selects: u8,
        bus_width_bits: u8,
    ) -> Result<Self, GeometryError> {
        if column_bits < 8 || column_bits > 12 {
            return Err(GeometryError::ColumnBits(column_bits));
        }
        if bank_bits < 2 || bank_bits > 3 {
            return Err(GeometryError::BankBits(bank_bits));
        }
        if row_bits < 12 || row_bits > 16 {
            return Err(GeometryError::RowBits(row_bits));
        }
        if !matches!(chip_selects, 1 | 2 | 4) {
            return Err(GeometryError::ChipSelects(chip_selects));
        }
        if !matches!(bus_width_bits, 8 | 16 | 32) {
            return Err(GeometryError::BusWidth(bus_width_bits));
        }
        Ok(Self {
            column_bits,
            bank_bits,
            row_bits,
            chip_selects,
            bus_width_bits,
        })
    }

    /// The single 16-bit MT47H64M16 on the PIC32MZ DA starter kit
    /// (10 column, 3 bank, 13 row bits, one chip select).
    pub const fn pic32mzda_starter_kit() -> Self {
        Self {
            column_bits: 10,
            bank_bits: 3,
            row_bits: 13,
            chip_selects: 1,
            bus_width_bits: 16,
        }
    }

    /// Column address bits.
    pub const fn column_bits(&self) -> u8 {
        self.column_bits
    }

    /// Bank address bits.
    pub const fn bank_bits(&self) -> u8 {
        self.bank_bits
    }

    /// Row address bits.
    pub const fn row_bits(&self) -> u8 {
        self.row_bits
    }

    /// Number of chip selects.
    pub const fn chip_selects(&self) -> u8 {
        self.chip_selects
    }

    /// Address bits consumed by chip select (log2 of the count).
    pub const fn chip_select_bits(&self) -> u8 {
        self.chip_selects.trailing_zeros() as u8
    }

    /// Data bus width in bits.
    pub const fn bus_width_bits(&self) -> u8 {
        self.bus_width_bits
    }

    /// Total addressable bytes:
    /// `2^(column + bank + row) × chip_selects × bus_width / 8`.
    // Bounded by `new`: at most 2^31 words × 4 selects × 4 bytes.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn size_bytes(&self) -> u64 {
        let address_bits = self.column_bits as u32 + self.bank_bits as u32 + self.row_bits as u32;
        (1u64 << address_bits) * self.chip_selects as u64 * (self.bus_width_bits as u64 / 8)
    }
}

impl Default for AddressGeometry {
    fn default() -> Self {
        Self::pic32mzda_starter_kit()
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for AddressGeometry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Raw {
            column_bits: u8,
            bank_bits: u8,
            row_bits: u8,
            chip_selects: u8,
            bus_width_bits: u8,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(
            raw.column_bits,
            raw.bank_bits,
            raw.row_bits,
            raw.chip_selects,
            raw.bus_width_bits,
        )
        .map_err(serde::de::Error::custom)
    }
}
