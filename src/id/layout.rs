//! Handle Bit Layout
//!
//! A handle is a fixed-width unsigned integer split into two fields:
//!
//! ```text
//! [ generation (G bits) ][ index (N - G bits) ]
//!   high                   low
//! ```
//!
//! Two values are reserved:
//! - index == index_mask: never a real slot, so the all-ones word stays an
//!   unambiguous invalid sentinel
//! - generation == generation_mask: never reached by bumping, so a
//!   generation can't silently wrap back onto an old handle

use crate::error::LayoutError;

/// Unsigned type used to store a generation of a given width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationType {
    U8,
    U16,
    U32,
    U64,
}

impl GenerationType {
    /// Smallest unsigned type holding `bits` bits.
    pub const fn for_bits(bits: u32) -> Self {
        if bits <= 8 {
            GenerationType::U8
        } else if bits <= 16 {
            GenerationType::U16
        } else if bits <= 32 {
            GenerationType::U32
        } else {
            GenerationType::U64
        }
    }

    /// Width of the type in bits.
    pub const fn bits(self) -> u32 {
        match self {
            GenerationType::U8 => 8,
            GenerationType::U16 => 16,
            GenerationType::U32 => 32,
            GenerationType::U64 => 64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GenerationType::U8 => "u8",
            GenerationType::U16 => "u16",
            GenerationType::U32 => "u32",
            GenerationType::U64 => "u64",
        }
    }
}

/// Bit widths of a handle type. Masks are derived from these two numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleLayout {
    total_bits: u32,
    generation_bits: u32,
}

impl HandleLayout {
    /// Build a layout in const context.
    ///
    /// Panics on an invalid layout, which turns into a compile error when
    /// used to initialize a constant.
    pub const fn new(total_bits: u32, generation_bits: u32) -> Self {
        match Self::check(total_bits, generation_bits) {
            Ok(layout) => layout,
            Err(LayoutError::UnsupportedWidth(_)) => panic!("handle width must be 32 or 64 bits"),
            Err(LayoutError::GenerationBits { .. }) => {
                panic!("generation bits must be in 1..total_bits")
            }
            Err(LayoutError::IndexTooWide(_)) => panic!("index field wider than 32 bits"),
        }
    }

    /// Build a layout from runtime values.
    pub fn try_new(total_bits: u32, generation_bits: u32) -> Result<Self, LayoutError> {
        Self::check(total_bits, generation_bits)
    }

    const fn check(total_bits: u32, generation_bits: u32) -> Result<Self, LayoutError> {
        if total_bits != 32 && total_bits != 64 {
            return Err(LayoutError::UnsupportedWidth(total_bits));
        }
        if generation_bits == 0 || generation_bits >= total_bits {
            return Err(LayoutError::GenerationBits { total_bits, generation_bits });
        }
        if total_bits - generation_bits > 32 {
            return Err(LayoutError::IndexTooWide(total_bits - generation_bits));
        }
        Ok(Self { total_bits, generation_bits })
    }

    pub const fn total_bits(&self) -> u32 {
        self.total_bits
    }

    pub const fn generation_bits(&self) -> u32 {
        self.generation_bits
    }

    pub const fn index_bits(&self) -> u32 {
        self.total_bits - self.generation_bits
    }

    pub const fn index_mask(&self) -> u64 {
        low_bits(self.index_bits())
    }

    pub const fn generation_mask(&self) -> u64 {
        low_bits(self.generation_bits)
    }

    /// Largest index a live slot may have. The mask value itself is reserved.
    pub const fn max_index(&self) -> u64 {
        self.index_mask() - 1
    }

    /// Largest generation a handle may carry. The mask value itself is reserved.
    pub const fn max_generation(&self) -> u64 {
        self.generation_mask() - 1
    }

    /// Raw value of the invalid sentinel (all ones).
    pub const fn invalid_bits(&self) -> u64 {
        low_bits(self.total_bits)
    }

    pub const fn generation_type(&self) -> GenerationType {
        GenerationType::for_bits(self.generation_bits)
    }

    /// Pack fields without range checks.
    pub const fn pack(&self, index: u64, generation: u64) -> u64 {
        (index & self.index_mask()) | ((generation & self.generation_mask()) << self.index_bits())
    }
}

const fn low_bits(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_32_8() {
        let layout = HandleLayout::new(32, 8);
        assert_eq!(layout.index_bits(), 24);
        assert_eq!(layout.index_mask(), 0x00FF_FFFF);
        assert_eq!(layout.generation_mask(), 0xFF);
        assert_eq!(layout.max_generation(), 254);
        assert_eq!(layout.invalid_bits(), 0xFFFF_FFFF);
        assert_eq!(layout.generation_type(), GenerationType::U8);
    }

    #[test]
    fn test_masks_64_32() {
        let layout = HandleLayout::new(64, 32);
        assert_eq!(layout.index_mask(), 0xFFFF_FFFF);
        assert_eq!(layout.generation_mask(), 0xFFFF_FFFF);
        assert_eq!(layout.invalid_bits(), u64::MAX);
        assert_eq!(layout.generation_type(), GenerationType::U32);
    }

    #[test]
    fn test_pack() {
        let layout = HandleLayout::new(32, 8);
        assert_eq!(layout.pack(5, 3), 0x0300_0005);
    }

    #[test]
    fn test_rejects_bad_layouts() {
        assert_eq!(HandleLayout::try_new(16, 4), Err(LayoutError::UnsupportedWidth(16)));
        assert!(matches!(
            HandleLayout::try_new(32, 0),
            Err(LayoutError::GenerationBits { .. })
        ));
        assert!(matches!(
            HandleLayout::try_new(32, 32),
            Err(LayoutError::GenerationBits { .. })
        ));
        assert_eq!(HandleLayout::try_new(64, 8), Err(LayoutError::IndexTooWide(56)));
    }

    #[test]
    fn test_generation_type_widths() {
        assert_eq!(GenerationType::for_bits(12), GenerationType::U16);
        assert_eq!(GenerationType::for_bits(17).name(), "u32");
        assert_eq!(GenerationType::for_bits(12).bits(), 16);
        assert_eq!(GenerationType::for_bits(8).bits(), 8);
        assert_eq!(HandleLayout::new(64, 32).generation_type().bits(), 32);
        assert_eq!(HandleLayout::new(32, 28).generation_type().bits(), 32);
    }
}
