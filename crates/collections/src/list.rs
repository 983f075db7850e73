//! Doubly-linked list with arena-backed nodes and stamped handles.
//!
//! Nodes live in a [`Slab`]; `prev`/`next` links are slot indices. Every
//! insertion returns a [`NodeHandle`] for O(1) access, insertion next to,
//! and removal of that node later on.
//!
//! A handle carries the stamp of the node it was issued for. Slots are
//! reused after removal, but stamps never repeat within a list, so a handle
//! to a removed node is rejected rather than silently aliasing whichever
//! node took its slot.
//!
//! Searching by value ([`LinkedList::find`], [`LinkedList::find_last`] and
//! the `*_value` insertion variants) uses the comparator given at
//! construction; a match is any node comparing `Equal`.
//!
//! # Example
//!
//! ```
//! use glyphkit_collections::LinkedList;
//!
//! let mut list = LinkedList::new();
//! let a = list.append(1);
//! let c = list.append(3);
//! list.insert_after(a, 2).unwrap();
//!
//! let values: Vec<_> = list.iter().copied().collect();
//! assert_eq!(values, vec![1, 2, 3]);
//!
//! assert_eq!(list.remove(c), Some(3));
//! assert_eq!(list.remove(c), None); // handle is stale now
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Index, IndexMut};

use slab::Slab;

use crate::compare::{Comparator, NaturalOrder};
use crate::error::{CollectionError, Result};
use crate::map::{next_owner_id, NIL};

struct ListNode<T> {
    value: T,
    prev: usize,
    next: usize,
    stamp: u64,
}

/// Stable reference to one node of a [`LinkedList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    slot: usize,
    stamp: u64,
}

/// An ordered sequence of payloads with O(1) insertion and removal at a
/// known node.
pub struct LinkedList<T, C = NaturalOrder> {
    nodes: Slab<ListNode<T>>,
    head: usize,
    tail: usize,
    next_stamp: u64,
    version: u64,
    owner: u64,
    cmp: C,
}

impl<T> LinkedList<T> {
    /// Creates an empty list that searches with `T`'s `Ord` implementation.
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<T, C: Default> Default for LinkedList<T, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<T, C> LinkedList<T, C> {
    /// Creates an empty list that searches with `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            nodes: Slab::new(),
            head: NIL,
            tail: NIL,
            next_stamp: 0,
            version: 0,
            owner: next_owner_id(),
            cmp,
        }
    }

    /// Returns the number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the list has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Handle of the first node.
    pub fn head(&self) -> Option<NodeHandle> {
        self.handle_at(self.head)
    }

    /// Handle of the last node.
    pub fn tail(&self) -> Option<NodeHandle> {
        self.handle_at(self.tail)
    }

    /// Handle of the node after `handle`.
    pub fn next(&self, handle: NodeHandle) -> Option<NodeHandle> {
        let slot = self.resolve(handle)?;
        self.handle_at(self.nodes[slot].next)
    }

    /// Handle of the node before `handle`.
    pub fn prev(&self, handle: NodeHandle) -> Option<NodeHandle> {
        let slot = self.resolve(handle)?;
        self.handle_at(self.nodes[slot].prev)
    }

    /// Returns `true` if `handle` refers to a live node of this list.
    pub fn contains_node(&self, handle: NodeHandle) -> bool {
        self.resolve(handle).is_some()
    }

    /// Payload of the node at `handle`.
    pub fn get(&self, handle: NodeHandle) -> Option<&T> {
        let slot = self.resolve(handle)?;
        Some(&self.nodes[slot].value)
    }

    /// Mutable payload of the node at `handle`.
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut T> {
        let slot = self.resolve(handle)?;
        Some(&mut self.nodes[slot].value)
    }

    /// First payload.
    pub fn front(&self) -> Option<&T> {
        self.nodes.get(self.head).map(|node| &node.value)
    }

    /// Last payload.
    pub fn back(&self) -> Option<&T> {
        self.nodes.get(self.tail).map(|node| &node.value)
    }

    /// Adds `value` at the tail.
    pub fn append(&mut self, value: T) -> NodeHandle {
        let n = self.alloc(value);
        if self.tail == NIL {
            self.link_only(n);
        } else {
            self.link_after(self.tail, n);
        }
        self.handle_of(n)
    }

    /// Adds `value` at the head.
    pub fn prepend(&mut self, value: T) -> NodeHandle {
        let n = self.alloc(value);
        if self.head == NIL {
            self.link_only(n);
        } else {
            self.link_before(self.head, n);
        }
        self.handle_of(n)
    }

    /// Inserts `value` directly after the node at `at`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NotFound`] if `at` is not a live node of this list.
    pub fn insert_after(&mut self, at: NodeHandle, value: T) -> Result<NodeHandle> {
        let at = self.resolve(at).ok_or(CollectionError::NotFound)?;
        let n = self.alloc(value);
        self.link_after(at, n);
        Ok(self.handle_of(n))
    }

    /// Inserts `value` directly before the node at `at`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NotFound`] if `at` is not a live node of this list.
    pub fn insert_before(&mut self, at: NodeHandle, value: T) -> Result<NodeHandle> {
        let at = self.resolve(at).ok_or(CollectionError::NotFound)?;
        let n = self.alloc(value);
        self.link_before(at, n);
        Ok(self.handle_of(n))
    }

    /// Unlinks the node at `handle` and returns its payload.
    ///
    /// Stale or foreign handles return `None` and leave the list untouched.
    pub fn remove(&mut self, handle: NodeHandle) -> Option<T> {
        let slot = self.resolve(handle)?;
        Some(self.unlink(slot))
    }

    /// Removes and returns the first payload.
    pub fn pop_front(&mut self) -> Option<T> {
        match self.head {
            NIL => None,
            n => Some(self.unlink(n)),
        }
    }

    /// Removes and returns the last payload.
    pub fn pop_back(&mut self) -> Option<T> {
        match self.tail {
            NIL => None,
            n => Some(self.unlink(n)),
        }
    }

    /// Drops every node.
    ///
    /// Payloads are dropped without any per-node hook. Handles issued
    /// before the clear stay invalid afterwards.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = NIL;
        self.tail = NIL;
        self.bump_version();
    }

    /// Head-to-tail iterator over the payloads.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            nodes: &self.nodes,
            front: self.head,
            back: self.tail,
            remaining: self.nodes.len(),
        }
    }

    /// Head-to-tail iterator over node handles and payloads.
    pub fn handles(&self) -> Handles<'_, T> {
        Handles { inner: self.iter() }
    }

    /// Starts a detached head-to-tail traversal.
    ///
    /// Any structural change to the list before the traversal finishes
    /// makes [`ListCursor::next`] fail with
    /// [`CollectionError::StaleIterator`].
    pub fn cursor(&self) -> ListCursor {
        ListCursor {
            next: self.head,
            version: self.version,
            owner: self.owner,
        }
    }

    // =========================================================================
    // Link plumbing
    // =========================================================================

    #[inline]
    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    fn resolve(&self, handle: NodeHandle) -> Option<usize> {
        match self.nodes.get(handle.slot) {
            Some(node) if node.stamp == handle.stamp => Some(handle.slot),
            _ => None,
        }
    }

    #[inline]
    fn handle_of(&self, slot: usize) -> NodeHandle {
        NodeHandle {
            slot,
            stamp: self.nodes[slot].stamp,
        }
    }

    fn handle_at(&self, slot: usize) -> Option<NodeHandle> {
        self.nodes.get(slot).map(|node| NodeHandle {
            slot,
            stamp: node.stamp,
        })
    }

    fn alloc(&mut self, value: T) -> usize {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        self.nodes.insert(ListNode {
            value,
            prev: NIL,
            next: NIL,
            stamp,
        })
    }

    /// Links `n` into an empty list.
    fn link_only(&mut self, n: usize) {
        self.head = n;
        self.tail = n;
        self.bump_version();
    }

    fn link_after(&mut self, at: usize, n: usize) {
        let next = self.nodes[at].next;
        self.nodes[n].prev = at;
        self.nodes[n].next = next;
        self.nodes[at].next = n;
        if next == NIL {
            self.tail = n;
        } else {
            self.nodes[next].prev = n;
        }
        self.bump_version();
    }

    fn link_before(&mut self, at: usize, n: usize) {
        let prev = self.nodes[at].prev;
        self.nodes[n].next = at;
        self.nodes[n].prev = prev;
        self.nodes[at].prev = n;
        if prev == NIL {
            self.head = n;
        } else {
            self.nodes[prev].next = n;
        }
        self.bump_version();
    }

    fn unlink(&mut self, n: usize) -> T {
        let node = self.nodes.remove(n);
        if node.prev == NIL {
            self.head = node.next;
        } else {
            self.nodes[node.prev].next = node.next;
        }
        if node.next == NIL {
            self.tail = node.prev;
        } else {
            self.nodes[node.next].prev = node.prev;
        }
        self.bump_version();
        node.value
    }
}

// Search by value.
impl<T, C: Comparator<T>> LinkedList<T, C> {
    fn scan(&self, value: &T, mut n: usize, forward: bool) -> usize {
        while let Some(node) = self.nodes.get(n) {
            if self.cmp.compare(&node.value, value) == Ordering::Equal {
                return n;
            }
            n = if forward { node.next } else { node.prev };
        }
        NIL
    }

    /// First node, scanning head to tail, whose payload equals `value`.
    pub fn find(&self, value: &T) -> Option<NodeHandle> {
        self.handle_at(self.scan(value, self.head, true))
    }

    /// First node, scanning tail to head, whose payload equals `value`.
    ///
    /// With several equal payloads this is the one closest to the tail, so
    /// it may differ from [`find`](Self::find).
    pub fn find_last(&self, value: &T) -> Option<NodeHandle> {
        self.handle_at(self.scan(value, self.tail, false))
    }

    /// Like [`find`](Self::find), starting at `start` (inclusive).
    pub fn find_from(&self, value: &T, start: NodeHandle) -> Option<NodeHandle> {
        let start = self.resolve(start)?;
        self.handle_at(self.scan(value, start, true))
    }

    /// Like [`find_last`](Self::find_last), starting at `end` (inclusive)
    /// and moving towards the head.
    pub fn find_last_from(&self, value: &T, end: NodeHandle) -> Option<NodeHandle> {
        let end = self.resolve(end)?;
        self.handle_at(self.scan(value, end, false))
    }

    /// Returns `true` if some payload equals `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.scan(value, self.head, true) != NIL
    }

    /// Inserts `value` after the first payload equal to `anchor`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NotFound`] if no payload equals `anchor`.
    pub fn insert_after_value(&mut self, anchor: &T, value: T) -> Result<NodeHandle> {
        let at = self.find(anchor).ok_or(CollectionError::NotFound)?;
        self.insert_after(at, value)
    }

    /// Inserts `value` before the first payload equal to `anchor`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NotFound`] if no payload equals `anchor`.
    pub fn insert_before_value(&mut self, anchor: &T, value: T) -> Result<NodeHandle> {
        let at = self.find(anchor).ok_or(CollectionError::NotFound)?;
        self.insert_before(at, value)
    }

    /// Removes the first payload equal to `value`. No-op if none matches.
    pub fn remove_value(&mut self, value: &T) -> Option<T> {
        let handle = self.find(value)?;
        self.remove(handle)
    }
}

impl<T, C> Index<NodeHandle> for LinkedList<T, C> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `handle` is not a live node of this list.
    fn index(&self, handle: NodeHandle) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("stale list handle {handle:?}"),
        }
    }
}

impl<T, C> IndexMut<NodeHandle> for LinkedList<T, C> {
    fn index_mut(&mut self, handle: NodeHandle) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("stale list handle {handle:?}"),
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for LinkedList<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, C> Extend<T> for LinkedList<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.append(value);
        }
    }
}

impl<T, C: Default> FromIterator<T> for LinkedList<T, C> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::default();
        list.extend(iter);
        list
    }
}

impl<'a, T, C> IntoIterator for &'a LinkedList<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Double-ended iterator over a list's payloads.
pub struct Iter<'a, T> {
    nodes: &'a Slab<ListNode<T>>,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    fn next_slot(&mut self) -> Option<(usize, &'a ListNode<T>)> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        let slot = self.front;
        let node = &nodes[slot];
        self.front = node.next;
        self.remaining -= 1;
        Some((slot, node))
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_slot().map(|(_, node)| &node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        let node = &nodes[self.back];
        self.back = node.prev;
        self.remaining -= 1;
        Some(&node.value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Head-to-tail iterator yielding each node's handle with its payload.
pub struct Handles<'a, T> {
    inner: Iter<'a, T>,
}

impl<'a, T> Iterator for Handles<'a, T> {
    type Item = (NodeHandle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next_slot().map(|(slot, node)| {
            let handle = NodeHandle {
                slot,
                stamp: node.stamp,
            };
            (handle, &node.value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Detached head-to-tail traversal created by [`LinkedList::cursor`].
///
/// Bound to the list that created it, like [`MapCursor`](crate::MapCursor).
#[derive(Debug, Clone)]
pub struct ListCursor {
    next: usize,
    version: u64,
    owner: u64,
}

impl ListCursor {
    fn tracks<T, C>(&self, list: &LinkedList<T, C>) -> bool {
        self.owner == list.owner && self.version == list.version
    }

    /// Advances to the next payload, or `Ok(None)` past the tail.
    ///
    /// # Errors
    ///
    /// [`CollectionError::StaleIterator`] if `list` was structurally
    /// modified after this cursor was created, or is another list.
    pub fn next<'l, T, C>(&mut self, list: &'l LinkedList<T, C>) -> Result<Option<&'l T>> {
        if !self.tracks(list) {
            return Err(CollectionError::StaleIterator);
        }
        if self.next == NIL {
            return Ok(None);
        }
        let node = list.nodes.get(self.next).ok_or(CollectionError::StaleIterator)?;
        self.next = node.next;
        Ok(Some(&node.value))
    }

    /// Rewinds to the head.
    ///
    /// # Errors
    ///
    /// Same as [`next`](Self::next); a stale cursor stays stale.
    pub fn reset<T, C>(&mut self, list: &LinkedList<T, C>) -> Result<()> {
        if !self.tracks(list) {
            return Err(CollectionError::StaleIterator);
        }
        self.next = list.head;
        Ok(())
    }
}
