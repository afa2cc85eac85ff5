// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

/// A map from ids in `[0, capacity)` to values, with O(1) lookup, insert and
/// remove.
///
/// Same layout as [`crate::DenseSet`] plus a value array that runs parallel to
/// the dense key array. Removal swaps the last entry into the freed slot.
#[derive(Debug, Clone)]
pub struct IndexedMap<V> {
    keys: Vec<usize>,
    values: Vec<V>,
    sparse: Vec<usize>,
}

impl<V> IndexedMap<V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            sparse: vec![0; capacity],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.sparse.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    fn slot_of(&self, id: usize) -> Option<usize> {
        let slot = *self.sparse.get(id)?;
        (slot < self.keys.len() && self.keys[slot] == id).then_some(slot)
    }

    #[inline]
    pub fn contains_key(&self, id: usize) -> bool {
        self.slot_of(id).is_some()
    }

    pub fn get(&self, id: usize) -> Option<&V> {
        self.slot_of(id).map(|slot| &self.values[slot])
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut V> {
        let slot = self.slot_of(id)?;
        Some(&mut self.values[slot])
    }

    /// Stores `value` under `id` unless the key is already present.
    ///
    /// Returns `false` and drops `value` if the key exists.
    ///
    /// # Panics
    ///
    /// Panics if `id` is outside of the id space.
    pub fn insert(&mut self, id: usize, value: V) -> bool {
        assert!(
            id < self.sparse.len(),
            "id {} outside of the id space {}",
            id,
            self.sparse.len()
        );
        if self.contains_key(id) {
            return false;
        }
        self.sparse[id] = self.keys.len();
        self.keys.push(id);
        self.values.push(value);
        true
    }

    /// Fetch-or-create.
    pub fn get_or_insert_with(&mut self, id: usize, create: impl FnOnce() -> V) -> &mut V {
        let slot = match self.slot_of(id) {
            Some(slot) => slot,
            None => {
                self.insert(id, create());
                self.keys.len() - 1
            }
        };
        &mut self.values[slot]
    }

    pub fn remove(&mut self, id: usize) -> Option<V> {
        let slot = self.slot_of(id)?;
        let last = self.keys.len() - 1;
        let moved = self.keys[last];
        self.keys.swap(slot, last);
        self.values.swap(slot, last);
        self.sparse[moved] = slot;
        self.keys.pop();
        self.values.pop()
    }

    pub fn keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.keys.iter().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.values.iter()
    }

    /// Entries in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &V)> + '_ {
        self.keys.iter().copied().zip(self.values.iter())
    }
}
