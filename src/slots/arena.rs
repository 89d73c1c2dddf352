//! Slot Arena
//!
//! Dense storage where each slot is either live (holds a value) or free
//! (links to the next free slot). Free slots form an intrusive singly
//! linked list threaded through the slot array itself:
//!
//! ```text
//! slots:     [ Live(a) ][ Free->3 ][ Live(c) ][ Free->END ]
//! next_free: 1
//! ```
//!
//! `add` pops the list head (LIFO reuse) or appends a fresh slot; `remove`
//! pushes the slot back onto the list. An index stays bound to the same
//! logical slot until that slot is removed and reused.
//!
//! A slot can also be retired: its value is taken and the slot is parked
//! off the free list for good. Handle tables use this for slots whose
//! generation counter has run out.
//!
//! Generation checks don't happen here. See `HandleTable` for the layer
//! that turns raw indices into stale-safe handles.

use std::ops::{Index, IndexMut};

use tracing::debug;

/// Terminates the free list. Also the one index `add` can never return.
pub const FREE_LIST_END: u32 = u32::MAX;

#[derive(Debug, Clone)]
enum Slot<T> {
    Live(T),
    Free { next: u32 },
    Retired,
}

/// Slot storage with O(1) add/remove and stable `u32` indices.
#[derive(Debug, Clone)]
pub struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    /// Head of the free list, or FREE_LIST_END
    next_free: u32,
    /// Number of live slots
    count: u32,
    /// Number of retired slots
    retired: u32,
}

impl<T> SlotArena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_free: FREE_LIST_END,
            count: 0,
            retired: 0,
        }
    }

    /// Create an empty arena with room for `capacity` slots before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            next_free: FREE_LIST_END,
            count: 0,
            retired: 0,
        }
    }

    /// Store a value and return its slot index.
    ///
    /// Reuses the most recently freed slot if there is one, otherwise
    /// appends. Panics if the `u32` index space is exhausted.
    pub fn add(&mut self, value: T) -> u32 {
        let index = if self.next_free != FREE_LIST_END {
            let index = self.next_free;
            let slot = &mut self.slots[index as usize];
            match *slot {
                Slot::Free { next } => self.next_free = next,
                Slot::Live(_) | Slot::Retired => {
                    unreachable!("free list points at occupied slot {}", index)
                }
            }
            *slot = Slot::Live(value);
            index
        } else {
            let index = self.slots.len();
            assert!(index < FREE_LIST_END as usize, "slot index space exhausted");
            if index == self.slots.capacity() {
                debug!(slots = index, "growing slot storage");
            }
            self.slots.push(Slot::Live(value));
            index as u32
        };
        self.count += 1;
        index
    }

    /// Index the next `add` will return.
    pub fn next_index(&self) -> u32 {
        if self.next_free != FREE_LIST_END {
            self.next_free
        } else {
            self.slots.len() as u32
        }
    }

    /// Remove the value at `index` and free its slot.
    ///
    /// Panics if the slot is not live. Use [`SlotArena::try_remove`] when the
    /// index may already be free.
    pub fn remove(&mut self, index: u32) -> T {
        match self.try_remove(index) {
            Some(value) => value,
            None => panic!("remove of slot {} which is not live", index),
        }
    }

    /// Remove the value at `index` if the slot is live.
    pub fn try_remove(&mut self, index: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        if !matches!(slot, Slot::Live(_)) {
            return None;
        }
        match std::mem::replace(slot, Slot::Free { next: self.next_free }) {
            Slot::Live(value) => {
                self.next_free = index;
                self.count -= 1;
                Some(value)
            }
            Slot::Free { .. } | Slot::Retired => None,
        }
    }

    /// Take the value at `index` and park the slot so `add` never hands it
    /// out again. The slot still counts towards `capacity`.
    ///
    /// Panics if the slot is not live.
    pub fn retire(&mut self, index: u32) -> T {
        assert!(self.is_live(index), "retire of slot {} which is not live", index);
        match std::mem::replace(&mut self.slots[index as usize], Slot::Retired) {
            Slot::Live(value) => {
                self.count -= 1;
                self.retired += 1;
                value
            }
            Slot::Free { .. } | Slot::Retired => unreachable!(),
        }
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        match self.slots.get(index as usize) {
            Some(Slot::Live(value)) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        match self.slots.get_mut(index as usize) {
            Some(Slot::Live(value)) => Some(value),
            _ => None,
        }
    }

    /// Check if `index` refers to a live slot.
    pub fn is_live(&self, index: u32) -> bool {
        matches!(self.slots.get(index as usize), Some(Slot::Live(_)))
    }

    /// Number of live slots.
    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of physical slots, live or free.
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Number of free slots waiting for reuse.
    pub fn free_count(&self) -> u32 {
        self.capacity() - self.count - self.retired
    }

    /// Number of slots taken out of circulation by `retire`.
    pub fn retired_count(&self) -> u32 {
        self.retired
    }

    /// Iterate over live `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| match slot {
            Slot::Live(value) => Some((idx as u32, value)),
            Slot::Free { .. } | Slot::Retired => None,
        })
    }

    /// Iterate mutably over live `(index, value)` pairs in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(idx, slot)| match slot {
            Slot::Live(value) => Some((idx as u32, value)),
            Slot::Free { .. } | Slot::Retired => None,
        })
    }

    /// Drop every live value and put its slot back on the free list.
    ///
    /// Capacity is unchanged and retired slots stay retired. The rebuilt
    /// list hands indices out lowest first.
    pub fn clear(&mut self) {
        let mut head = FREE_LIST_END;
        for idx in (0..self.slots.len()).rev() {
            let slot = &mut self.slots[idx];
            if let Slot::Retired = slot {
                continue;
            }
            *slot = Slot::Free { next: head };
            head = idx as u32;
        }
        self.next_free = head;
        self.count = 0;
    }

    /// Walk the free list and check the bookkeeping.
    ///
    /// Panics if the free list doesn't visit exactly the free slots once
    /// each, or if the live count is off.
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let live = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count();
        let retired = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Retired))
            .count();
        assert_eq!(live, self.count as usize, "live count mismatch");
        assert_eq!(retired, self.retired as usize, "retired count mismatch");
        assert!(self.count as usize <= self.slots.len());

        let mut visited = vec![false; self.slots.len()];
        let mut cursor = self.next_free;
        let mut steps = 0usize;
        while cursor != FREE_LIST_END {
            let idx = cursor as usize;
            assert!(idx < self.slots.len(), "free list escapes the arena at {}", cursor);
            assert!(!visited[idx], "free list cycles at slot {}", cursor);
            visited[idx] = true;
            cursor = match self.slots[idx] {
                Slot::Free { next } => next,
                Slot::Live(_) | Slot::Retired => panic!("free list reaches occupied slot {}", idx),
            };
            steps += 1;
        }
        assert_eq!(steps, self.slots.len() - live - retired, "free list misses free slots");
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<u32> for SlotArena<T> {
    type Output = T;

    fn index(&self, index: u32) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("slot {} is not live", index),
        }
    }
}

impl<T> IndexMut<u32> for SlotArena<T> {
    fn index_mut(&mut self, index: u32) -> &mut T {
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("slot {} is not live", index),
        }
    }
}

impl<T> Drop for SlotArena<T> {
    fn drop(&mut self) {
        if self.count > 0 {
            debug!(live = self.count, "dropping slot arena with live values");
        }
    }
}
