//! Handle encoding
//!
//! Pure functions over opaque integers; no state lives here.

pub mod handle;
pub mod layout;

pub use handle::{GenerationalHandle, Id32, Id64};
pub use layout::{GenerationType, HandleLayout};
