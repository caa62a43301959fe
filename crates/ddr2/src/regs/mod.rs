//! Register layouts.
//!
//! Every packed hardware register is a plain struct with one named member per
//! field, plus an `encode`/`decode` pair built on [`Field`]. Encoding is
//! checked: a value wider than its field is a [`FieldOverflow`], never a
//! silent truncation into a neighbouring field.
//!
//! Each register's field list is also exported as a `FIELDS` table so tests
//! can verify, per register, that no two fields overlap.

use crate::error::FieldOverflow;

/// Declare a register struct with its field table and encode/decode pair.
///
/// Fields are `u32` (multi-bit) or `bool` (single bit); each names the
/// associated [`Field`] constant it is stored through.
macro_rules! register {
    (
        $(#[$meta:meta])*
        pub struct $name:ident : $reg:literal @ $offset:literal {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty => $konst:ident [$lsb:literal, $width:literal]
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )*
        }

        impl $name {
            $(
                #[doc = concat!("Layout of `", stringify!($field), "`.")]
                pub const $konst: $crate::regs::Field =
                    $crate::regs::Field::new(stringify!($field), $lsb, $width);
            )*
        }

        impl $crate::regs::Register for $name {
            const NAME: &'static str = $reg;
            const OFFSET: u32 = $offset;
            const FIELDS: &'static [$crate::regs::Field] = &[$(Self::$konst),*];

            fn encode(&self) -> Result<u32, $crate::error::FieldOverflow> {
                let packer = $crate::regs::Packer::new(Self::NAME);
                $(
                    let packer = packer.put(
                        Self::$konst,
                        $crate::regs::FieldValue::to_raw(self.$field),
                    )?;
                )*
                Ok(packer.finish())
            }

            fn decode(raw: u32) -> Self {
                Self {
                    $(
                        $field: $crate::regs::FieldValue::from_raw(Self::$konst.extract(raw)),
                    )*
                }
            }
        }
    };
}

pub mod ctrl;
pub mod phy;
pub mod syscfg;

/// Rust types a register field may be declared as.
pub trait FieldValue: Copy {
    /// Unshifted raw value.
    fn to_raw(self) -> u32;
    /// From an unshifted raw value already masked to the field width.
    fn from_raw(raw: u32) -> Self;
}

impl FieldValue for u32 {
    fn to_raw(self) -> u32 {
        self
    }

    fn from_raw(raw: u32) -> Self {
        raw
    }
}

impl FieldValue for bool {
    fn to_raw(self) -> u32 {
        u32::from(self)
    }

    fn from_raw(raw: u32) -> Self {
        raw != 0
    }
}

/// One bit field of a 32-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Field name as used in error reports.
    pub name: &'static str,
    /// Bit position of the least significant bit.
    pub lsb: u8,
    /// Width in bits (1..=32).
    pub width: u8,
}

impl Field {
    /// Field of `width` bits starting at `lsb`.
    pub const fn new(name: &'static str, lsb: u8, width: u8) -> Self {
        Self { name, lsb, width }
    }

    /// Single-bit flag at `bit`.
    pub const fn bit(name: &'static str, bit: u8) -> Self {
        Self::new(name, bit, 1)
    }

    /// Largest value the field can hold.
    pub const fn max(self) -> u32 {
        match 1u32.checked_shl(self.width as u32) {
            Some(v) => v.wrapping_sub(1),
            None => u32::MAX,
        }
    }

    /// Mask of the field in register position.
    pub const fn mask(self) -> u32 {
        match self.max().checked_shl(self.lsb as u32) {
            Some(m) => m,
            None => 0,
        }
    }

    /// Field value extracted from a raw register word.
    pub const fn extract(self, raw: u32) -> u32 {
        match (raw & self.mask()).checked_shr(self.lsb as u32) {
            Some(v) => v,
            None => 0,
        }
    }

    /// `raw` with this field replaced by `value`, or `None` if it does not fit.
    pub const fn insert(self, raw: u32, value: u32) -> Option<u32> {
        if value > self.max() {
            return None;
        }
        let shifted = match value.checked_shl(self.lsb as u32) {
            Some(v) => v,
            None => return None,
        };
        Some((raw & !self.mask()) | shifted)
    }
}

/// Fallible builder for one register word.
///
/// ```
/// use ddr2::regs::{Field, Packer};
///
/// const LOW: Field = Field::new("low", 0, 4);
/// const FLAG: Field = Field::bit("flag", 7);
///
/// let raw = Packer::new("DEMO").put(LOW, 0xA)?.flag(FLAG, true).finish();
/// assert_eq!(raw, 0x8A);
/// assert!(Packer::new("DEMO").put(LOW, 0x10).is_err());
/// # Ok::<(), ddr2::FieldOverflow>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Packer {
    register: &'static str,
    raw: u32,
}

impl Packer {
    /// Start from an all-zero word.
    pub const fn new(register: &'static str) -> Self {
        Self { register, raw: 0 }
    }

    /// Store `value` in `field`.
    pub fn put(self, field: Field, value: u32) -> Result<Self, FieldOverflow> {
        match field.insert(self.raw, value) {
            Some(raw) => Ok(Self { raw, ..self }),
            None => Err(FieldOverflow {
                register: self.register,
                field: field.name,
                value,
            }),
        }
    }

    /// Store a single-bit flag. Infallible: a bool always fits.
    #[must_use]
    pub fn flag(self, field: Field, set: bool) -> Self {
        let raw = if set {
            self.raw | field.mask()
        } else {
            self.raw & !field.mask()
        };
        Self { raw, ..self }
    }

    /// The assembled word.
    pub const fn finish(self) -> u32 {
        self.raw
    }
}

/// A register with a fixed offset inside its block.
pub trait Register: Sized {
    /// Name used in error reports and logs.
    const NAME: &'static str;
    /// Byte offset from the block base.
    const OFFSET: u32;
    /// Every field of the register.
    const FIELDS: &'static [Field];

    /// Pack into a raw word.
    fn encode(&self) -> Result<u32, FieldOverflow>;

    /// Unpack a raw word. Bits outside [`Self::FIELDS`] are ignored.
    fn decode(raw: u32) -> Self;
}

/// `true` if no two fields in `fields` share a bit and none runs past bit 31.
pub fn fields_are_disjoint(fields: &[Field]) -> bool {
    let mut seen = 0u32;
    for f in fields {
        if u32::from(f.lsb).saturating_add(u32::from(f.width)) > 32 || f.width == 0 {
            return false;
        }
        if seen & f.mask() != 0 {
            return false;
        }
        seen |= f.mask();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const NIBBLE: Field = Field::new("nibble", 4, 4);

    #[test]
    fn mask_and_max() {
        assert_eq!(NIBBLE.max(), 0xF);
        assert_eq!(NIBBLE.mask(), 0xF0);
        assert_eq!(Field::new("all", 0, 32).max(), u32::MAX);
        assert_eq!(Field::new("all", 0, 32).mask(), u32::MAX);
        assert_eq!(Field::bit("top", 31).mask(), 0x8000_0000);
    }

    #[test]
    fn insert_leaves_neighbours_alone() {
        assert_eq!(NIBBLE.insert(0xFFFF_FF0F, 0x5), Some(0xFFFF_FF5F));
        assert_eq!(NIBBLE.insert(0xFFFF_FFFF, 0x0), Some(0xFFFF_FF0F));
    }

    #[test]
    fn insert_rejects_overflow() {
        assert_eq!(NIBBLE.insert(0, 0x10), None);
    }

    #[test]
    fn extract_ignores_other_bits() {
        assert_eq!(NIBBLE.extract(0xABCD_EF5A), 0x5);
    }

    #[test]
    fn packer_reports_register_and_field() {
        let err = Packer::new("DLYCFG2").put(NIBBLE, 99);
        assert_eq!(
            err.map(Packer::finish),
            Err(FieldOverflow {
                register: "DLYCFG2",
                field: "nibble",
                value: 99,
            })
        );
    }

    #[test]
    fn overlap_detection() {
        assert!(fields_are_disjoint(&[Field::new("a", 0, 4), Field::new("b", 4, 4)]));
        assert!(!fields_are_disjoint(&[Field::new("a", 0, 4), Field::new("b", 3, 4)]));
        assert!(!fields_are_disjoint(&[Field::new("a", 30, 4)]));
    }
}
