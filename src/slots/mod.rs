//! Slot Storage
//!
//! Stable, reusable integer-addressed storage:
//! - SlotArena: raw slots with an intrusive free list, keyed by `u32` index
//! - HandleTable: arena + per-slot generations, keyed by generational handles
//! - SparseStore: side data keyed by handles someone else issued
//!
//! Nothing here locks. Wrap a table in your own mutex if several threads
//! need it.

pub mod arena;
pub mod sparse;
pub mod table;

pub use arena::{SlotArena, FREE_LIST_END};
pub use sparse::SparseStore;
pub use table::HandleTable;
