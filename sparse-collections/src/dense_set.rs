// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

/// A set of ids from `[0, capacity)` with O(1) insert, remove and lookup.
///
/// `dense` holds the members packed at the front, `sparse[id]` holds the slot
/// of `id` inside `dense`. A slot is only trusted if it points back to the same
/// id, so `sparse` never has to be cleared.
///
/// Removal swaps the last member into the freed slot. Iteration order is
/// therefore insertion order only until the first removal.
///
/// # Panics
///
/// `insert` panics if the id is outside of the id space. Callers are expected
/// to validate ids against [`DenseSet::capacity`] first.
#[derive(Debug, Clone)]
pub struct DenseSet {
    dense: Vec<usize>,
    sparse: Vec<usize>,
}

impl DenseSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dense: Vec::with_capacity(capacity),
            sparse: vec![0; capacity],
        }
    }

    /// Size of the id space.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.sparse.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: usize) -> bool {
        match self.sparse.get(id) {
            Some(&slot) => slot < self.dense.len() && self.dense[slot] == id,
            None => false,
        }
    }

    /// Returns `false` if `id` was already a member.
    pub fn insert(&mut self, id: usize) -> bool {
        assert!(
            id < self.sparse.len(),
            "id {} outside of the id space {}",
            id,
            self.sparse.len()
        );
        if self.contains(id) {
            return false;
        }
        self.sparse[id] = self.dense.len();
        self.dense.push(id);
        true
    }

    /// Returns `false` if `id` was not a member.
    pub fn remove(&mut self, id: usize) -> bool {
        if !self.contains(id) {
            return false;
        }
        let slot = self.sparse[id];
        let last = self.dense.len() - 1;
        let moved = self.dense[last];
        self.dense.swap(slot, last);
        self.sparse[moved] = slot;
        self.dense.pop();
        true
    }

    pub fn clear(&mut self) {
        self.dense.clear();
    }

    /// Members in dense order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.dense.iter().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.dense
    }
}

#[cfg(test)]
mod tests {
    use super::DenseSet;

    #[test]
    fn test_insert_twice_is_rejected() {
        let mut set = DenseSet::with_capacity(8);
        assert!(set.insert(3));
        assert!(!set.insert(3));
        assert_eq!(set.len(), 1);
        assert!(set.contains(3));
    }

    #[test]
    fn test_remove_swaps_last_member_into_slot() {
        let mut set = DenseSet::with_capacity(8);
        for id in [1, 4, 6, 2] {
            assert!(set.insert(id));
        }

        assert!(set.remove(4));
        assert_eq!(set.as_slice(), &[1, 2, 6]);
        assert!(set.contains(2));
        assert!(set.contains(6));
        assert!(!set.contains(4));

        // the moved member must still be removable through its rewritten index
        assert!(set.remove(2));
        assert_eq!(set.as_slice(), &[1, 6]);
    }

    #[test]
    fn test_remove_absent_is_rejected() {
        let mut set = DenseSet::with_capacity(4);
        assert!(!set.remove(0));
        set.insert(0);
        assert!(set.remove(0));
        assert!(!set.remove(0));
        assert!(set.is_empty());
    }

    #[test]
    fn test_stale_sparse_slot_is_not_membership() {
        let mut set = DenseSet::with_capacity(4);
        set.insert(2);
        set.remove(2);
        set.insert(3);
        // sparse[2] still points at slot 0, which now holds 3
        assert!(!set.contains(2));
        assert!(set.contains(3));
    }

    #[test]
    fn test_out_of_range_lookup() {
        let set = DenseSet::with_capacity(2);
        assert!(!set.contains(17));
    }

    #[test]
    #[should_panic(expected = "outside of the id space")]
    fn test_out_of_range_insert_panics() {
        let mut set = DenseSet::with_capacity(2);
        set.insert(2);
    }
}
