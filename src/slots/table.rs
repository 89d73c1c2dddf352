//! Handle Table
//!
//! Values live in a `SlotArena`; callers only ever see handles. Next to the
//! arena sits one generation counter per slot. Removing a value advances
//! its slot's counter, and a handle only resolves while its generation
//! matches the counter, so a window closed in one frame can't be confused
//! with the window that reuses its slot in the next.
//!
//! A slot whose counter reaches the last usable generation is retired on
//! removal instead of being freed. It keeps its final generation and is
//! never handed out again.

use tracing::{trace, warn};

use super::arena::SlotArena;
use crate::config::ArenaConfig;
use crate::error::HandleError;
use crate::id::{GenerationalHandle, Id32};

/// Owned registry mapping handles of type `H` to values of type `T`.
///
/// Create one per subsystem and keep it with that subsystem; there is no
/// global instance.
#[derive(Debug, Clone)]
pub struct HandleTable<T, H: GenerationalHandle = Id32> {
    values: SlotArena<T>,
    /// Current generation of each slot, indexed by slot index.
    /// Bumped when a value is removed, so it is always the generation
    /// the slot's next occupant gets.
    generations: Vec<H::Generation>,
    config: ArenaConfig,
}

impl<T, H: GenerationalHandle> HandleTable<T, H> {
    /// Create an empty table with default config.
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    /// Create a table sized and tuned by `config`.
    pub fn with_config(config: ArenaConfig) -> Self {
        let capacity = config.initial_capacity as usize;
        Self {
            values: SlotArena::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            config,
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Store a value and return a handle to it.
    ///
    /// Panics if the slot index no longer fits the handle's index field.
    /// The table is left untouched in that case.
    pub fn insert(&mut self, value: T) -> H {
        let next = self.values.next_index();
        assert!(
            u64::from(next) < H::LAYOUT.index_mask(),
            "handle index space exhausted: slot {} does not fit {} index bits",
            next,
            H::LAYOUT.index_bits()
        );
        let index = self.values.add(value);
        let slot = index as usize;
        if slot == self.generations.len() {
            self.generations.push(H::Generation::default());
        }
        let handle = H::encode(index, self.generations[slot]);
        trace!(%index, generation = ?self.generations[slot], "issued handle");
        handle
    }

    /// Check a handle against the table, explaining any mismatch.
    pub fn check(&self, handle: H) -> Result<u32, HandleError> {
        if !handle.is_valid() {
            return Err(HandleError::Invalid);
        }
        let index = handle.index();
        let Some(&current) = self.generations.get(index as usize) else {
            return Err(HandleError::OutOfRange {
                index,
                capacity: self.values.capacity(),
            });
        };
        if current != handle.generation() {
            return Err(HandleError::Stale {
                index,
                handle_generation: handle.generation().into(),
                slot_generation: current.into(),
            });
        }
        if !self.values.is_live(index) {
            return Err(HandleError::Vacant { index });
        }
        Ok(index)
    }

    /// Check if a handle refers to a live value.
    pub fn contains(&self, handle: H) -> bool {
        self.check(handle).is_ok()
    }

    pub fn get(&self, handle: H) -> Option<&T> {
        self.try_get(handle).ok()
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        let index = self.check(handle).ok()?;
        self.values.get_mut(index)
    }

    /// Like `get`, but says why a lookup failed.
    pub fn try_get(&self, handle: H) -> Result<&T, HandleError> {
        let index = self.check(handle)?;
        self.values.get(index).ok_or(HandleError::Vacant { index })
    }

    /// Remove the value behind `handle`.
    /// Returns `None` if the handle was invalid or stale.
    ///
    /// A slot already at the last usable generation is retired rather than
    /// freed.
    pub fn remove(&mut self, handle: H) -> Option<T> {
        let index = self.check(handle).ok()?;
        let generation: u64 = handle.generation().into();
        if generation >= H::LAYOUT.max_generation() {
            warn!(%index, generation, "slot generations exhausted, retiring slot");
            return Some(self.values.retire(index));
        }
        let next = handle.bump_generation().generation();
        let value = self.values.remove(index);
        self.generations[index as usize] = next;
        trace!(%index, generation = ?next, "released handle");
        Some(value)
    }

    /// Remove every value. All outstanding handles become stale; slots are
    /// kept for reuse.
    pub fn clear(&mut self) {
        let live: Vec<H> = self.handles().collect();
        for handle in live {
            self.remove(handle);
        }
    }

    /// Handle for the value currently stored at `index`, if any.
    pub fn handle_at(&self, index: u32) -> Option<H> {
        if !self.values.is_live(index) {
            return None;
        }
        Some(H::encode(index, self.generations[index as usize]))
    }

    /// Number of live values.
    pub fn len(&self) -> u32 {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of slots ever allocated, live, free or retired.
    pub fn capacity(&self) -> u32 {
        self.values.capacity()
    }

    pub fn free_count(&self) -> u32 {
        self.values.free_count()
    }

    /// Slots whose generations ran out.
    pub fn retired_count(&self) -> u32 {
        self.values.retired_count()
    }

    /// Whether enough slots are free for compaction to pay off.
    pub fn wants_compaction(&self) -> bool {
        self.config.should_compact(self.len(), self.capacity())
    }

    /// Iterate over live `(handle, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> {
        let generations = &self.generations;
        self.values
            .iter()
            .map(move |(index, value)| (H::encode(index, generations[index as usize]), value))
    }

    /// Iterate mutably over live `(handle, value)` pairs in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (H, &mut T)> {
        let generations = &self.generations;
        self.values
            .iter_mut()
            .map(move |(index, value)| (H::encode(index, generations[index as usize]), value))
    }

    /// Iterate over live handles.
    pub fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.iter().map(|(handle, _)| handle)
    }
}

impl<T, H: GenerationalHandle> Default for HandleTable<T, H> {
    fn default() -> Self {
        Self::new()
    }
}
