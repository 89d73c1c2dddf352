//! Error types
//!
//! Contract violations (removing a free slot, indexing with a dead index,
//! exhausting a generation counter) are programming faults and panic. The
//! types here cover the paths where a caller wants to branch instead:
//! checked handle lookups, runtime layout construction and config files.

use std::fmt;

/// Why a handle lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleError {
    /// The handle is the reserved invalid sentinel
    Invalid,
    /// The handle's index was never allocated by this table
    OutOfRange { index: u32, capacity: u32 },
    /// The slot was freed and reused since the handle was issued
    Stale { index: u32, handle_generation: u64, slot_generation: u64 },
    /// The slot is currently free
    Vacant { index: u32 },
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleError::Invalid => write!(f, "invalid handle"),
            HandleError::OutOfRange { index, capacity } => {
                write!(f, "handle index {} out of range (capacity: {})", index, capacity)
            }
            HandleError::Stale { index, handle_generation, slot_generation } => write!(
                f,
                "stale handle for slot {}: generation {} (slot is at {})",
                index, handle_generation, slot_generation
            ),
            HandleError::Vacant { index } => write!(f, "slot {} is free", index),
        }
    }
}

impl std::error::Error for HandleError {}

/// Rejected handle layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// Only 32 and 64 bit handles are supported
    UnsupportedWidth(u32),
    /// Generation bits must be at least 1 and leave room for an index
    GenerationBits { total_bits: u32, generation_bits: u32 },
    /// Slot indices are u32, so the index field may not be wider
    IndexTooWide(u32),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::UnsupportedWidth(bits) => {
                write!(f, "unsupported handle width: {} bits (expected 32 or 64)", bits)
            }
            LayoutError::GenerationBits { total_bits, generation_bits } => write!(
                f,
                "{} generation bits do not fit a {}-bit handle",
                generation_bits, total_bits
            ),
            LayoutError::IndexTooWide(bits) => {
                write!(f, "index field of {} bits exceeds 32", bits)
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// Config load/save error
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// File I/O error
    Io(String),
    /// RON serialization/deserialization error
    Serialization(String),
    /// Values parsed but are out of range
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "I/O error: {}", msg),
            ConfigError::Serialization(msg) => write!(f, "serialization error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e.to_string())
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::Serialization(e.to_string())
    }
}

impl From<ron::Error> for ConfigError {
    fn from(e: ron::Error) -> Self {
        ConfigError::Serialization(e.to_string())
    }
}
