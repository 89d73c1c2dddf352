//! Generational Handles
//!
//! A handle names a slot (index) and which occupant of that slot it refers
//! to (generation). When a slot is freed and reused, its generation moves
//! on, so a handle kept from the previous occupant no longer matches:
//! - `index()` addresses the slot
//! - `generation()` disambiguates reuse of that slot
//! - `INVALID` (all bits set) means "no object"
//!
//! Handle types are declared with [`define_handle!`]; `Id32` and `Id64` cover
//! the common widths.

use std::fmt;
use std::hash::Hash;

use super::layout::HandleLayout;

/// Operations shared by every handle type produced by [`define_handle!`].
///
/// Tables and stores are generic over this trait so a subsystem can pick
/// its own handle width.
pub trait GenerationalHandle: Copy + Eq + Hash + fmt::Debug + 'static {
    /// Smallest unsigned type that holds the generation field.
    type Generation: Copy + Eq + Ord + Default + fmt::Debug + Into<u64>;

    /// Bit layout of this handle type.
    const LAYOUT: HandleLayout;

    /// The reserved "no object" handle.
    const INVALID: Self;

    /// Pack an index and generation.
    ///
    /// Panics if `index` is the reserved index value or beyond the index
    /// field, or if `generation` doesn't fit the generation field.
    fn encode(index: u32, generation: Self::Generation) -> Self;

    /// Slot index. Must not be called on the invalid handle.
    fn index(self) -> u32;

    fn generation(self) -> Self::Generation;

    /// Same index, generation + 1.
    ///
    /// Panics when the generation space is exhausted. Wrapping around
    /// would alias an old handle, so there is no fallback.
    fn bump_generation(self) -> Self;

    fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Declare a handle type with a fixed bit layout.
///
/// ```
/// slotgen::define_handle! {
///     /// Handle to an open window.
///     pub struct WindowId(u32) { generation: u16, generation_bits: 12 }
/// }
///
/// let id = WindowId::encode(7, 2);
/// assert_eq!(id.index(), 7);
/// assert_eq!(id.generation(), 2);
/// assert_eq!(id.bump_generation().generation(), 3);
/// assert!(!WindowId::INVALID.is_valid());
/// ```
///
/// The generation type has to be the smallest unsigned type that holds the
/// generation field. Anything wider is rejected at compile time:
///
/// ```compile_fail
/// slotgen::define_handle! {
///     pub struct LooseId(u32) { generation: u32, generation_bits: 8 }
/// }
/// ```
#[macro_export]
macro_rules! define_handle {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($raw:ty) { generation: $gen:ty, generation_bits: $gbits:expr $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        $vis struct $name($raw);

        const _: () = {
            let layout = $crate::HandleLayout::new(<$raw>::BITS, $gbits);
            assert!(
                <$gen>::BITS == layout.generation_type().bits(),
                "generation type must be the smallest unsigned type holding the generation field"
            );
        };

        #[allow(dead_code)]
        impl $name {
            pub const LAYOUT: $crate::HandleLayout = $crate::HandleLayout::new(<$raw>::BITS, $gbits);
            pub const INVALID: Self = Self(<$raw>::MAX);

            pub const fn encode(index: u32, generation: $gen) -> Self {
                assert!(
                    (index as u64) < Self::LAYOUT.index_mask(),
                    "handle index space exhausted"
                );
                assert!(
                    (generation as u64) <= Self::LAYOUT.generation_mask(),
                    "generation does not fit the handle layout"
                );
                Self(Self::LAYOUT.pack(index as u64, generation as u64) as $raw)
            }

            pub const fn index(self) -> u32 {
                let index = (self.0 as u64) & Self::LAYOUT.index_mask();
                debug_assert!(index != Self::LAYOUT.index_mask(), "index of an invalid handle");
                index as u32
            }

            pub const fn generation(self) -> $gen {
                (((self.0 as u64) >> Self::LAYOUT.index_bits()) & Self::LAYOUT.generation_mask()) as $gen
            }

            pub fn bump_generation(self) -> Self {
                let next = self.generation() as u64 + 1;
                assert!(
                    next <= Self::LAYOUT.max_generation(),
                    "generation space exhausted for slot {}",
                    self.index()
                );
                Self::encode(self.index(), next as $gen)
            }

            pub const fn is_valid(self) -> bool {
                self.0 != <$raw>::MAX
            }

            /// Opaque integer form, for handing across API boundaries.
            pub const fn to_raw(self) -> $raw {
                self.0
            }

            pub const fn from_raw(raw: $raw) -> Self {
                Self(raw)
            }
        }

        impl $crate::GenerationalHandle for $name {
            type Generation = $gen;
            const LAYOUT: $crate::HandleLayout = $name::LAYOUT;
            const INVALID: Self = $name::INVALID;

            fn encode(index: u32, generation: $gen) -> Self {
                $name::encode(index, generation)
            }

            fn index(self) -> u32 {
                $name::index(self)
            }

            fn generation(self) -> $gen {
                $name::generation(self)
            }

            fn bump_generation(self) -> Self {
                $name::bump_generation(self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}(", stringify!($name))?;
                ::std::fmt::Display::fmt(self, f)?;
                write!(f, ")")
            }
        }

        // Formatting reads the raw bits so a corrupt handle can still be logged.
        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                let mask = Self::LAYOUT.index_mask();
                let index = (self.0 as u64) & mask;
                if !self.is_valid() {
                    write!(f, "invalid")
                } else if index == mask {
                    write!(f, "corrupt:{:#x}", self.0)
                } else {
                    write!(f, "{}:{}", index, self.generation())
                }
            }
        }

        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                $crate::__private::serde::Serialize::serialize(&self.0, serializer)
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                let raw = <$raw as $crate::__private::serde::Deserialize>::deserialize(deserializer)?;
                let handle = Self(raw);
                // The reserved index only ever appears inside the sentinel.
                let index = (raw as u64) & Self::LAYOUT.index_mask();
                if handle.is_valid() && index == Self::LAYOUT.index_mask() {
                    return Err(<D::Error as $crate::__private::serde::de::Error>::custom(
                        format_args!("corrupt {} handle: {:#x}", stringify!($name), raw),
                    ));
                }
                Ok(handle)
            }
        }
    };
}

define_handle! {
    /// 32-bit handle: 24-bit index, 8-bit generation.
    pub struct Id32(u32) { generation: u8, generation_bits: 8 }
}

define_handle! {
    /// 64-bit handle: 32-bit index, 32-bit generation.
    pub struct Id64(u64) { generation: u32, generation_bits: 32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_value() {
        let handle = Id32::encode(5, 3);
        assert_eq!(handle.to_raw(), 0x0300_0005);
        assert_eq!(handle.index(), 5);
        assert_eq!(handle.generation(), 3);
    }

    #[test]
    fn test_round_trip_edges() {
        for &(index, generation) in &[(0u32, 0u8), (1, 254), (0x00FF_FFFE, 0), (0x00FF_FFFE, 254), (1234, 77)] {
            let handle = Id32::encode(index, generation);
            assert_eq!((handle.index(), handle.generation()), (index, generation));
            assert!(handle.is_valid());
        }

        let big = Id64::encode(u32::MAX - 1, u32::MAX - 1);
        assert_eq!(big.index(), u32::MAX - 1);
        assert_eq!(big.generation(), u32::MAX - 1);
        assert!(big.is_valid());
    }

    #[test]
    fn test_invalid_handle() {
        assert!(!Id32::INVALID.is_valid());
        assert!(!Id64::INVALID.is_valid());
        assert_eq!(Id32::INVALID.to_raw(), u32::MAX);
        assert_eq!(Id32::default(), Id32::INVALID);
        assert!(!GenerationalHandle::is_valid(Id64::INVALID));
    }

    #[test]
    fn test_bump_generation() {
        let handle = Id32::encode(42, 9);
        let bumped = handle.bump_generation();
        assert_eq!(bumped.index(), 42);
        assert_eq!(bumped.generation(), 10);
        assert_ne!(bumped, handle);
    }

    #[test]
    fn test_bump_to_last_generation() {
        let handle = Id32::encode(1, 253);
        assert_eq!(handle.bump_generation().generation(), 254);
    }

    #[test]
    #[should_panic(expected = "generation space exhausted")]
    fn test_bump_past_last_generation_panics() {
        Id32::encode(1, 254).bump_generation();
    }

    #[test]
    #[should_panic(expected = "handle index space exhausted")]
    fn test_encode_reserved_index_panics() {
        Id32::encode(0x00FF_FFFF, 0);
    }

    #[test]
    fn test_trait_matches_inherent() {
        fn via_trait<H: GenerationalHandle>(index: u32, generation: H::Generation) -> (u32, u64) {
            let handle = H::encode(index, generation);
            (handle.index(), handle.bump_generation().generation().into())
        }
        assert_eq!(via_trait::<Id32>(3, 4), (3, 5));
        assert_eq!(via_trait::<Id64>(3, 4), (3, 5));
    }

    #[test]
    fn test_formatting() {
        let handle = Id32::encode(5, 3);
        assert_eq!(format!("{}", handle), "5:3");
        assert_eq!(format!("{:?}", handle), "Id32(5:3)");
        assert_eq!(format!("{:?}", Id32::INVALID), "Id32(invalid)");
        assert_eq!(format!("{}", Id64::encode(u32::MAX - 1, 7)), "4294967294:7");
    }

    #[test]
    fn test_formatting_corrupt_handle() {
        // Reserved index under a real generation: not the sentinel, not usable.
        let corrupt = Id32::from_raw(0x05FF_FFFF);
        assert!(corrupt.is_valid());
        assert_eq!(format!("{}", corrupt), "corrupt:0x5ffffff");
        assert_eq!(format!("{:?}", corrupt), "Id32(corrupt:0x5ffffff)");

        let wide = Id64::from_raw(0x0000_0002_FFFF_FFFF);
        assert_eq!(format!("{:?}", wide), "Id64(corrupt:0x2ffffffff)");
    }

    #[test]
    fn test_ron_round_trip() {
        let handle = Id32::encode(5, 3);
        let text = ron::to_string(&handle).expect("serialize");
        assert_eq!(text, "50331653");
        let back: Id32 = ron::from_str(&text).expect("deserialize");
        assert_eq!(back, handle);

        let invalid: Id32 = ron::from_str("4294967295").expect("deserialize sentinel");
        assert!(!invalid.is_valid());
    }

    #[test]
    fn test_deserialize_rejects_corrupt_handle() {
        // Reserved index with a non-sentinel generation.
        let result: Result<Id32, _> = ron::from_str("16777215");
        assert!(result.is_err());
    }
}
