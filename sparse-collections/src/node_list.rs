// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

//! Doubly-linked list whose nodes live in a flat arena.
//!
//! Nodes are addressed by [`NodeIndex`] instead of pointers. Detached slots go
//! onto a free list and are handed out again by the next push, so the arena
//! only grows to the largest number of simultaneously linked nodes.

/// Handle of a node inside a [`NodeList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node<T> {
    prev: Option<usize>,
    next: Option<usize>,
    value: T,
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Linked(Node<T>),
    Vacant { next_free: Option<usize> },
}

#[derive(Debug, Clone)]
pub struct NodeList<T> {
    slots: Vec<Slot<T>>,
    head: Option<usize>,
    tail: Option<usize>,
    free: Option<usize>,
    len: usize,
}

impl<T> Default for NodeList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeList<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free: None,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn node(&self, index: usize) -> Option<&Node<T>> {
        match self.slots.get(index) {
            Some(Slot::Linked(node)) => Some(node),
            _ => None,
        }
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut Node<T>> {
        match self.slots.get_mut(index) {
            Some(Slot::Linked(node)) => Some(node),
            _ => None,
        }
    }

    /// Appends `value` at the tail and returns the handle of its node.
    pub fn push_back(&mut self, value: T) -> NodeIndex {
        let node = Node {
            prev: self.tail,
            next: None,
            value,
        };

        let index = match self.free {
            Some(index) => {
                if let Slot::Vacant { next_free } = self.slots[index] {
                    self.free = next_free;
                }
                self.slots[index] = Slot::Linked(node);
                index
            }
            None => {
                self.slots.push(Slot::Linked(node));
                self.slots.len() - 1
            }
        };

        match self.tail.and_then(|tail| self.node_mut(tail)) {
            Some(tail) => tail.next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        NodeIndex(index)
    }

    /// Detaches the node in O(1) and returns its value.
    ///
    /// Returns `None` if the handle does not point at a linked node, e.g.
    /// because it was removed before.
    pub fn remove(&mut self, index: NodeIndex) -> Option<T> {
        let index = index.0;
        self.node(index)?;

        let vacant = Slot::Vacant {
            next_free: self.free,
        };
        let Slot::Linked(node) = std::mem::replace(&mut self.slots[index], vacant) else {
            return None;
        };
        self.free = Some(index);

        match node.prev.and_then(|prev| self.node_mut(prev)) {
            Some(prev) => prev.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|next| self.node_mut(next)) {
            Some(next) => next.prev = node.prev,
            None => self.tail = node.prev,
        }
        self.len -= 1;

        Some(node.value)
    }

    pub fn get(&self, index: NodeIndex) -> Option<&T> {
        self.node(index.0).map(|node| &node.value)
    }

    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|head| self.node(head)).map(|node| &node.value)
    }

    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|tail| self.node(tail)).map(|node| &node.value)
    }

    /// Values from head to tail.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }
}

pub struct Iter<'a, T> {
    list: &'a NodeList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.value)
    }
}

#[cfg(test)]
mod tests {
    use super::NodeList;

    fn collect(list: &NodeList<u32>) -> Vec<u32> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_push_preserves_order() {
        let mut list = NodeList::new();
        for v in 0..5 {
            list.push_back(v);
        }
        assert_eq!(collect(&list), vec![0, 1, 2, 3, 4]);
        assert_eq!(list.front(), Some(&0));
        assert_eq!(list.back(), Some(&4));
    }

    #[test]
    fn test_remove_head_middle_tail() {
        let mut list = NodeList::new();
        let handles: Vec<_> = (0..5).map(|v| list.push_back(v)).collect();

        assert_eq!(list.remove(handles[2]), Some(2));
        assert_eq!(collect(&list), vec![0, 1, 3, 4]);
        assert_eq!(list.remove(handles[0]), Some(0));
        assert_eq!(collect(&list), vec![1, 3, 4]);
        assert_eq!(list.remove(handles[4]), Some(4));
        assert_eq!(collect(&list), vec![1, 3]);
        assert_eq!(list.back(), Some(&3));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_removing_twice_is_rejected() {
        let mut list = NodeList::new();
        let a = list.push_back(7);
        assert_eq!(list.remove(a), Some(7));
        assert_eq!(list.remove(a), None);
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
    }

    #[test]
    fn test_free_slots_are_reused() {
        let mut list = NodeList::with_capacity(2);
        let a = list.push_back(1);
        let _b = list.push_back(2);
        list.remove(a);
        let c = list.push_back(3);

        assert_eq!(c, a);
        assert_eq!(collect(&list), vec![2, 3]);
        assert_eq!(list.get(c), Some(&3));
    }

    #[test]
    fn test_drain_to_empty_and_refill() {
        let mut list = NodeList::new();
        let handles: Vec<_> = (0..3).map(|v| list.push_back(v)).collect();
        for h in handles.into_iter().rev() {
            list.remove(h);
        }
        assert!(list.is_empty());
        list.push_back(9);
        assert_eq!(collect(&list), vec![9]);
    }
}
