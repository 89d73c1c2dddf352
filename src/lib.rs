//! slotgen: generational handles and slot storage
//!
//! Engine subsystems (windows, render targets, game objects) hand out
//! opaque integer handles instead of references. A handle packs a slot
//! index with a generation counter, so a handle to something that has been
//! destroyed is detected instead of silently reaching whatever reused its
//! slot.
//!
//! ```
//! use slotgen::{HandleTable, Id32};
//!
//! let mut windows: HandleTable<&str, Id32> = HandleTable::new();
//! let main = windows.insert("main");
//! windows.remove(main);
//!
//! let popup = windows.insert("popup");
//! assert_eq!(popup.index(), main.index());
//! assert_eq!(windows.get(main), None);
//! assert_eq!(windows.get(popup), Some(&"popup"));
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod slots;

pub use config::ArenaConfig;
pub use error::{ConfigError, HandleError, LayoutError};
pub use id::{GenerationType, GenerationalHandle, HandleLayout, Id32, Id64};
pub use slots::{HandleTable, SlotArena, SparseStore, FREE_LIST_END};

#[doc(hidden)]
pub mod __private {
    pub use serde;
}
