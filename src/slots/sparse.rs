//! Sparse Handle Storage
//!
//! Side data attached to handles issued elsewhere (usually by a
//! `HandleTable`). A subsystem that doesn't own the objects, say a
//! renderer keeping per-window swapchain state, stores its data here keyed
//! by the same handles.
//!
//! Entries remember the generation they were stored under, so data left
//! behind for a dead handle is never returned for the handle that reuses
//! its slot.

use crate::id::{GenerationalHandle, Id32};

#[derive(Debug, Clone)]
struct Entry<G, T> {
    generation: G,
    value: T,
}

/// Side table indexed by handle index, checked by generation.
#[derive(Debug, Clone)]
pub struct SparseStore<T, H: GenerationalHandle = Id32> {
    entries: Vec<Option<Entry<H::Generation, T>>>,
    len: usize,
}

impl<T, H: GenerationalHandle> SparseStore<T, H> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            len: 0,
        }
    }

    /// Reserve room for handles with indices below `slots`.
    pub fn with_capacity(slots: usize) -> Self {
        Self {
            entries: Vec::with_capacity(slots),
            len: 0,
        }
    }

    /// Attach `value` to `handle`.
    ///
    /// Returns the previous value stored for this exact handle. Data left
    /// by an older generation of the slot is dropped. The invalid handle is
    /// refused and the value handed back.
    pub fn insert(&mut self, handle: H, value: T) -> Result<Option<T>, T> {
        if !handle.is_valid() {
            return Err(value);
        }
        let index = handle.index() as usize;
        if index >= self.entries.len() {
            self.entries.resize_with(index + 1, || None);
        }
        let generation = handle.generation();
        match self.entries[index].replace(Entry { generation, value }) {
            Some(old) if old.generation == generation => Ok(Some(old.value)),
            Some(_) => Ok(None),
            None => {
                self.len += 1;
                Ok(None)
            }
        }
    }

    /// Detach and return the value stored for `handle`.
    pub fn remove(&mut self, handle: H) -> Option<T> {
        let index = self.current(handle)?;
        let entry = self.entries[index].take()?;
        self.len -= 1;
        Some(entry.value)
    }

    pub fn get(&self, handle: H) -> Option<&T> {
        let index = self.current(handle)?;
        self.entries[index].as_ref().map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        let index = self.current(handle)?;
        self.entries[index].as_mut().map(|entry| &mut entry.value)
    }

    pub fn contains(&self, handle: H) -> bool {
        self.current(handle).is_some()
    }

    /// Position of the entry stored under exactly this handle.
    fn current(&self, handle: H) -> Option<usize> {
        if !handle.is_valid() {
            return None;
        }
        let index = handle.index() as usize;
        match self.entries.get(index) {
            Some(Some(entry)) if entry.generation == handle.generation() => Some(index),
            _ => None,
        }
    }

    /// Iterate over `(handle, value)` pairs in index order.
    ///
    /// Handles are rebuilt from the stored generation. The owner may have
    /// moved on since; check them against it when that matters.
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> {
        self.entries.iter().enumerate().filter_map(|(index, entry)| {
            entry
                .as_ref()
                .map(|entry| (H::encode(index as u32, entry.generation), &entry.value))
        })
    }

    /// Drop whatever sits at `index`, whichever generation stored it.
    /// Returns the dropped value. Call it when the owner frees the slot.
    pub fn evict(&mut self, index: u32) -> Option<T> {
        let entry = self.entries.get_mut(index as usize)?.take()?;
        self.len -= 1;
        Some(entry.value)
    }

    /// Drop entries whose handle the owner no longer considers live.
    pub fn retain_live(&mut self, mut is_live: impl FnMut(H) -> bool) {
        for (index, slot) in self.entries.iter_mut().enumerate() {
            let keep = match slot {
                Some(entry) => is_live(H::encode(index as u32, entry.generation)),
                None => continue,
            };
            if !keep {
                *slot = None;
                self.len -= 1;
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.len = 0;
    }

    /// Number of handles with data attached.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T, H: GenerationalHandle> Default for SparseStore<T, H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Id64;
    use crate::slots::HandleTable;

    #[test]
    fn test_attach_and_replace() {
        let mut cursors: SparseStore<(i32, i32)> = SparseStore::new();
        let editor = Id32::encode(7, 2);

        assert_eq!(cursors.insert(editor, (0, 0)), Ok(None));
        assert_eq!(cursors.insert(editor, (4, 12)), Ok(Some((0, 0))));
        assert_eq!(cursors.get(editor), Some(&(4, 12)));
        assert_eq!(cursors.len(), 1);

        cursors.get_mut(editor).unwrap().1 += 1;
        assert_eq!(cursors.remove(editor), Some((4, 13)));
        assert!(cursors.is_empty());
        assert_eq!(cursors.remove(editor), None);
    }

    #[test]
    fn test_far_index_leaves_gap_empty() {
        let mut store: SparseStore<u64, Id64> = SparseStore::with_capacity(4);
        let far = Id64::encode(4_000, 9);
        store.insert(far, 1).unwrap();

        assert_eq!(store.len(), 1);
        assert!(!store.contains(Id64::encode(3_999, 9)));
        assert!(!store.contains(Id64::encode(4_001, 9)));
        assert_eq!(store.iter().map(|(h, _)| h).collect::<Vec<_>>(), vec![far]);
    }

    #[test]
    fn test_stale_generation_ignored() {
        let mut store: SparseStore<&str> = SparseStore::new();
        let old = Id32::encode(2, 0);
        let new = old.bump_generation();

        store.insert(old, "old").unwrap();
        assert_eq!(store.get(new), None);
        assert!(store.get_mut(new).is_none());
        assert_eq!(store.remove(new), None);

        // Overwriting with a newer generation doesn't return the old data.
        assert_eq!(store.insert(new, "new"), Ok(None));
        assert_eq!(store.get(old), None);
        assert_eq!(store.get(new), Some(&"new"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_invalid_handle_refused() {
        let mut store: SparseStore<u8> = SparseStore::new();
        assert_eq!(store.insert(Id32::INVALID, 7), Err(7));
        assert_eq!(store.get(Id32::INVALID), None);
        assert!(!store.contains(Id32::INVALID));
        assert!(store.is_empty());
    }

    #[test]
    fn test_iteration_in_index_order() {
        let mut store: SparseStore<&str> = SparseStore::new();
        let five = Id32::encode(5, 1);
        let zero = Id32::encode(0, 0);
        let two = Id32::encode(2, 4);

        store.insert(five, "five").unwrap();
        store.insert(zero, "zero").unwrap();
        store.insert(two, "two").unwrap();

        let items: Vec<_> = store.iter().collect();
        assert_eq!(items, vec![(zero, &"zero"), (two, &"two"), (five, &"five")]);
    }

    #[test]
    fn test_follows_table_lifecycle() {
        let mut windows: HandleTable<&str> = HandleTable::new();
        let mut titles: SparseStore<String> = SparseStore::new();

        let main = windows.insert("main");
        let tools = windows.insert("tools");
        titles.insert(main, "Main Window".to_string()).unwrap();
        titles.insert(tools, "Tools".to_string()).unwrap();

        windows.remove(main);
        assert_eq!(titles.evict(main.index()).as_deref(), Some("Main Window"));
        assert_eq!(titles.evict(main.index()), None);

        let popup = windows.insert("popup");
        assert_eq!(popup.index(), main.index());
        assert!(!titles.contains(popup));
        titles.insert(popup, "Popup".to_string()).unwrap();

        // Owner drops a window without telling the side table.
        windows.remove(tools);
        titles.retain_live(|handle| windows.contains(handle));
        assert_eq!(titles.len(), 1);
        assert_eq!(titles.get(popup).map(String::as_str), Some("Popup"));

        titles.clear();
        assert!(titles.is_empty());
        assert!(!titles.contains(popup));
    }
}
