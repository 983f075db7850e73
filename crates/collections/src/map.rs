//! Ordered map backed by a red-black tree.
//!
//! Nodes live in a [`Slab`] arena and link to each other by slot index.
//! A reserved index (`NIL`) stands in for every absent child and for the
//! root's parent; it is never allocated and always reads as black, so the
//! balancing code can treat leaves uniformly without a shared mutable
//! sentinel object.
//!
//! Keys are unique under the map's [`Comparator`]. Insert, lookup and
//! removal are O(log n); in-order iteration yields keys in ascending order.
//!
//! # Iteration
//!
//! Two traversal forms are provided:
//!
//! - [`OrderedMap::iter`] borrows the map, so mutation during iteration is
//!   rejected at compile time.
//! - [`OrderedMap::cursor`] returns a [`MapCursor`] that does not borrow the
//!   map. Every structural mutation bumps the map's version, and a cursor
//!   created before the mutation fails with
//!   [`CollectionError::StaleIterator`] on its next step.
//!
//! # Example
//!
//! ```
//! use glyphkit_collections::OrderedMap;
//!
//! let mut map = OrderedMap::new();
//! map.add(3, "three").unwrap();
//! map.add(1, "one").unwrap();
//! map.add(2, "two").unwrap();
//!
//! assert_eq!(map.lookup(&2), Ok(&"two"));
//! let keys: Vec<_> = map.keys().copied().collect();
//! assert_eq!(keys, vec![1, 2, 3]);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use slab::Slab;

use crate::compare::{Comparator, NaturalOrder};
use crate::error::{CollectionError, Result};

/// Index standing in for every absent link.
pub(crate) const NIL: usize = usize::MAX;

static NEXT_OWNER: AtomicU64 = AtomicU64::new(0);

/// Identity stamped into a collection and the cursors it creates, so a
/// cursor can tell its own collection from another one at the same version.
pub(crate) fn next_owner_id() -> u64 {
    NEXT_OWNER.fetch_add(1, AtomicOrdering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    parent: usize,
    left: usize,
    right: usize,
}

/// A key-unique associative container kept in comparator order.
///
/// See the [module documentation](self) for the storage layout and the
/// iteration contract.
pub struct OrderedMap<K, V, C = NaturalOrder> {
    nodes: Slab<Node<K, V>>,
    root: usize,
    version: u64,
    owner: u64,
    cmp: C,
}

impl<K, V> OrderedMap<K, V> {
    /// Creates an empty map ordered by `K`'s `Ord` implementation.
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }

    /// Creates an empty map with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, NaturalOrder)
    }
}

impl<K, V, C: Default> Default for OrderedMap<K, V, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

// Operations that never compare keys.
impl<K, V, C> OrderedMap<K, V, C> {
    /// Creates an empty map ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_capacity_and_comparator(0, cmp)
    }

    /// Creates an empty map ordered by `cmp` with room for `capacity` entries.
    pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
        Self {
            nodes: Slab::with_capacity(capacity),
            root: NIL,
            version: 0,
            owner: next_owner_id(),
            cmp,
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the comparator ordering this map.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Removes every entry.
    ///
    /// Entries are dropped without any per-entry hook; callers that need to
    /// release resources held by values must drain or iterate first.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = NIL;
        self.bump_version();
    }

    /// Returns the entry with the smallest key.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EmptyCollection`] if the map is empty.
    pub fn min(&self) -> Result<(&K, &V)> {
        self.extremum(Side::Left)
    }

    /// Returns the entry with the largest key.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EmptyCollection`] if the map is empty.
    pub fn max(&self) -> Result<(&K, &V)> {
        self.extremum(Side::Right)
    }

    /// Removes and returns the entry with the smallest key.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EmptyCollection`] if the map is empty.
    pub fn remove_min_entry(&mut self) -> Result<(K, V)> {
        if self.root == NIL {
            return Err(CollectionError::EmptyCollection);
        }
        let n = self.outermost(self.root, Side::Left);
        Ok(self.remove_node(n))
    }

    /// Removes and returns the entry with the largest key.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EmptyCollection`] if the map is empty.
    pub fn remove_max_entry(&mut self) -> Result<(K, V)> {
        if self.root == NIL {
            return Err(CollectionError::EmptyCollection);
        }
        let n = self.outermost(self.root, Side::Right);
        Ok(self.remove_node(n))
    }

    /// Returns `true` if any entry holds a value equal to `value`. O(n).
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.nodes.iter().any(|(_, node)| node.value == *value)
    }

    /// Returns an in-order iterator over the entries.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut stack = Vec::new();
        descend_left(&self.nodes, &mut stack, self.root);
        Iter {
            nodes: &self.nodes,
            stack,
            remaining: self.nodes.len(),
        }
    }

    /// Returns an in-order iterator over the keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an in-order iterator over the values.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Starts a detached in-order traversal.
    ///
    /// The cursor captures the map's current version; any structural
    /// mutation before the traversal finishes makes
    /// [`MapCursor::next`] fail with [`CollectionError::StaleIterator`].
    pub fn cursor(&self) -> MapCursor {
        let mut stack = Vec::new();
        descend_left(&self.nodes, &mut stack, self.root);
        MapCursor {
            stack,
            version: self.version,
            owner: self.owner,
        }
    }

    // =========================================================================
    // Node plumbing
    // =========================================================================

    #[inline]
    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    #[inline]
    fn color(&self, n: usize) -> Color {
        if n == NIL {
            Color::Black
        } else {
            self.nodes[n].color
        }
    }

    /// Recolors a real node. The sentinel is never written.
    #[inline]
    fn set_color(&mut self, n: usize, color: Color) {
        if n != NIL {
            self.nodes[n].color = color;
        }
    }

    #[inline]
    fn parent(&self, n: usize) -> usize {
        self.nodes[n].parent
    }

    #[inline]
    fn child(&self, n: usize, side: Side) -> usize {
        let node = &self.nodes[n];
        match side {
            Side::Left => node.left,
            Side::Right => node.right,
        }
    }

    #[inline]
    fn set_child(&mut self, n: usize, side: Side, child: usize) {
        let node = &mut self.nodes[n];
        match side {
            Side::Left => node.left = child,
            Side::Right => node.right = child,
        }
    }

    /// Which side of its (real) parent `n` hangs from.
    #[inline]
    fn side_of(&self, n: usize) -> Side {
        if self.nodes[self.parent(n)].left == n {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Points `parent`'s link that held `old` at `new` instead.
    fn replace_child(&mut self, parent: usize, old: usize, new: usize) {
        if parent == NIL {
            self.root = new;
        } else if self.nodes[parent].left == old {
            self.nodes[parent].left = new;
        } else {
            self.nodes[parent].right = new;
        }
    }

    fn outermost(&self, mut n: usize, side: Side) -> usize {
        loop {
            let next = self.child(n, side);
            if next == NIL {
                return n;
            }
            n = next;
        }
    }

    fn extremum(&self, side: Side) -> Result<(&K, &V)> {
        if self.root == NIL {
            return Err(CollectionError::EmptyCollection);
        }
        let node = &self.nodes[self.outermost(self.root, side)];
        Ok((&node.key, &node.value))
    }

    /// Rotates `x` down towards `side`; its child on the opposite side
    /// takes its place.
    fn rotate(&mut self, x: usize, side: Side) {
        let other = side.opposite();
        let y = self.child(x, other);
        let inner = self.child(y, side);

        self.set_child(x, other, inner);
        if inner != NIL {
            self.nodes[inner].parent = x;
        }

        let parent = self.parent(x);
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, y);

        self.set_child(y, side, x);
        self.nodes[x].parent = y;
    }

    /// Links a fresh red leaf under `parent` and restores balance.
    fn attach(&mut self, parent: usize, side: Side, key: K, value: V) -> usize {
        let z = self.nodes.insert(Node {
            key,
            value,
            color: Color::Red,
            parent,
            left: NIL,
            right: NIL,
        });

        if parent == NIL {
            self.root = z;
        } else {
            self.set_child(parent, side, z);
        }

        self.insert_fixup(z);
        self.bump_version();
        z
    }

    fn insert_fixup(&mut self, mut x: usize) {
        // The root's parent is NIL, which reads black, so the loop stops there.
        while self.color(self.parent(x)) == Color::Red {
            let p = self.parent(x);
            let g = self.parent(p);
            let side = self.side_of(p);
            let uncle = self.child(g, side.opposite());

            if self.color(uncle) == Color::Red {
                self.set_color(p, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(g, Color::Red);
                x = g;
            } else {
                if x == self.child(p, side.opposite()) {
                    x = p;
                    self.rotate(x, side);
                }
                let p = self.parent(x);
                let g = self.parent(p);
                self.set_color(p, Color::Black);
                self.set_color(g, Color::Red);
                self.rotate(g, side.opposite());
            }
        }

        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// Unlinks node `z` and returns its entry.
    fn remove_node(&mut self, z: usize) -> (K, V) {
        let mut y = z;
        if self.nodes[z].left != NIL && self.nodes[z].right != NIL {
            // Move z's entry into its in-order successor, which has no
            // left child, and unlink that node instead.
            y = self.outermost(self.nodes[z].right, Side::Left);
            if let Some((a, b)) = self.nodes.get2_mut(z, y) {
                mem::swap(&mut a.key, &mut b.key);
                mem::swap(&mut a.value, &mut b.value);
            }
        }

        let x = if self.nodes[y].left != NIL {
            self.nodes[y].left
        } else {
            self.nodes[y].right
        };
        let parent = self.parent(y);
        if x != NIL {
            self.nodes[x].parent = parent;
        }
        self.replace_child(parent, y, x);

        let removed = self.nodes.remove(y);
        if removed.color == Color::Black {
            self.remove_fixup(x, parent);
        }
        self.bump_version();
        (removed.key, removed.value)
    }

    /// Resolves the double-black deficiency left at `x` (possibly NIL),
    /// whose parent is `parent`.
    fn remove_fixup(&mut self, mut x: usize, mut parent: usize) {
        while x != self.root && self.color(x) == Color::Black {
            let side = if self.nodes[parent].left == x {
                Side::Left
            } else {
                Side::Right
            };
            let other = side.opposite();
            let mut w = self.child(parent, other);

            if self.color(w) == Color::Red {
                self.set_color(w, Color::Black);
                self.set_color(parent, Color::Red);
                self.rotate(parent, side);
                w = self.child(parent, other);
            }

            let near = self.child(w, side);
            let far = self.child(w, other);
            if self.color(near) == Color::Black && self.color(far) == Color::Black {
                self.set_color(w, Color::Red);
                x = parent;
                parent = self.parent(x);
            } else {
                if self.color(far) == Color::Black {
                    self.set_color(near, Color::Black);
                    self.set_color(w, Color::Red);
                    self.rotate(w, other);
                    w = self.child(parent, other);
                }
                let parent_color = self.color(parent);
                self.set_color(w, parent_color);
                self.set_color(parent, Color::Black);
                let far = self.child(w, other);
                self.set_color(far, Color::Black);
                self.rotate(parent, side);
                x = self.root;
            }
        }
        self.set_color(x, Color::Black);
    }
}

// Operations that compare keys.
impl<K, V, C: Comparator<K>> OrderedMap<K, V, C> {
    fn find_node(&self, key: &K) -> usize {
        let mut n = self.root;
        while n != NIL {
            let node = &self.nodes[n];
            match self.cmp.compare(key, &node.key) {
                Ordering::Less => n = node.left,
                Ordering::Greater => n = node.right,
                Ordering::Equal => return n,
            }
        }
        NIL
    }

    /// Locates `key`, returning either its node or the leaf position where
    /// it would be attached.
    fn search(&self, key: &K) -> std::result::Result<usize, (usize, Side)> {
        let mut parent = NIL;
        let mut side = Side::Left;
        let mut n = self.root;
        while n != NIL {
            let node = &self.nodes[n];
            parent = n;
            match self.cmp.compare(key, &node.key) {
                Ordering::Less => {
                    side = Side::Left;
                    n = node.left;
                }
                Ordering::Greater => {
                    side = Side::Right;
                    n = node.right;
                }
                Ordering::Equal => return Ok(n),
            }
        }
        Err((parent, side))
    }

    /// Inserts a new entry.
    ///
    /// # Errors
    ///
    /// [`CollectionError::DuplicateKey`] if `key` is already present; the map
    /// is left unchanged.
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        match self.search(&key) {
            Ok(_) => Err(CollectionError::DuplicateKey),
            Err((parent, side)) => {
                self.attach(parent, side, key, value);
                Ok(())
            }
        }
    }

    /// Inserts an entry even when an equal key is already present.
    ///
    /// Equal keys descend to the right, so among equal keys the newest is
    /// visited last in order.
    pub(crate) fn insert_equal(&mut self, key: K, value: V) {
        let mut parent = NIL;
        let mut side = Side::Left;
        let mut n = self.root;
        while n != NIL {
            let node = &self.nodes[n];
            parent = n;
            if self.cmp.compare(&key, &node.key) == Ordering::Less {
                side = Side::Left;
                n = node.left;
            } else {
                side = Side::Right;
                n = node.right;
            }
        }
        self.attach(parent, side, key, value);
    }

    /// Inserts `key`, or overwrites its value in place if present.
    ///
    /// Overwriting is not a structural change: the tree is not rebalanced
    /// and live cursors stay valid. Returns the previous value, if any.
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        match self.search(&key) {
            Ok(n) => Some(mem::replace(&mut self.nodes[n].value, value)),
            Err((parent, side)) => {
                self.attach(parent, side, key, value);
                None
            }
        }
    }

    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NotFound`] if `key` is absent.
    pub fn lookup(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or(CollectionError::NotFound)
    }

    /// Returns the value stored under `key`, if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        match self.find_node(key) {
            NIL => None,
            n => Some(&self.nodes[n].value),
        }
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.find_node(key) {
            NIL => None,
            n => Some(&mut self.nodes[n].value),
        }
    }

    /// Returns the stored key and value equal to `key`.
    pub fn get_entry(&self, key: &K) -> Option<(&K, &V)> {
        match self.find_node(key) {
            NIL => None,
            n => {
                let node = &self.nodes[n];
                Some((&node.key, &node.value))
            }
        }
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.find_node(key) != NIL
    }

    /// Removes `key`, returning its value. Absent keys are a no-op.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key`, returning the stored key and value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        match self.find_node(key) {
            NIL => None,
            n => Some(self.remove_node(n)),
        }
    }

    /// Verifies the red-black and ordering invariants.
    ///
    /// Returns the black height of the tree (counting the sentinel).
    #[doc(hidden)]
    pub fn check_invariants(&self) -> std::result::Result<usize, &'static str> {
        self.check_tree(false)
    }

    /// Invariant check shared with [`SortedBag`](crate::SortedBag), which
    /// permits neighbouring keys to compare equal.
    pub(crate) fn check_tree(&self, allow_equal: bool) -> std::result::Result<usize, &'static str> {
        if self.color(self.root) != Color::Black {
            return Err("root is red");
        }
        if self.root != NIL && self.parent(self.root) != NIL {
            return Err("root has a parent");
        }
        let height = self.check_subtree(self.root, NIL)?;

        let mut count = 0;
        let mut prev: Option<&K> = None;
        for (key, _) in self.iter() {
            if let Some(prev) = prev {
                let order = self.cmp.compare(prev, key);
                if order == Ordering::Greater || (order == Ordering::Equal && !allow_equal) {
                    return Err("keys out of order");
                }
            }
            prev = Some(key);
            count += 1;
        }
        if count != self.nodes.len() {
            return Err("unreachable nodes");
        }
        Ok(height)
    }

    fn check_subtree(&self, n: usize, parent: usize) -> std::result::Result<usize, &'static str> {
        if n == NIL {
            return Ok(1);
        }
        let node = self.nodes.get(n).ok_or("dangling link")?;
        if node.parent != parent {
            return Err("parent link mismatch");
        }
        if node.color == Color::Red
            && (self.color(node.left) == Color::Red || self.color(node.right) == Color::Red)
        {
            return Err("red node with red child");
        }
        let left = self.check_subtree(node.left, n)?;
        let right = self.check_subtree(node.right, n)?;
        if left != right {
            return Err("unequal black height");
        }
        Ok(left + usize::from(node.color == Color::Black))
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for OrderedMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C: Comparator<K>> Extend<(K, V)> for OrderedMap<K, V, C> {
    /// Later duplicates overwrite earlier values.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.upsert(key, value);
        }
    }
}

impl<K, V, C: Comparator<K> + Default> FromIterator<(K, V)> for OrderedMap<K, V, C> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, C> IntoIterator for &'a OrderedMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn descend_left<K, V>(nodes: &Slab<Node<K, V>>, stack: &mut Vec<usize>, mut n: usize) {
    while let Some(node) = nodes.get(n) {
        stack.push(n);
        n = node.left;
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// In-order iterator over a map's entries.
pub struct Iter<'a, K, V> {
    nodes: &'a Slab<Node<K, V>>,
    stack: Vec<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        let nodes = self.nodes;
        let node = &nodes[n];
        descend_left(nodes, &mut self.stack, node.right);
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// In-order iterator over a map's keys.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// In-order iterator over a map's values.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Detached in-order traversal created by [`OrderedMap::cursor`].
///
/// A cursor is bound to the map that created it. Advancing it against any
/// other map fails with [`CollectionError::StaleIterator`].
#[derive(Debug, Clone)]
pub struct MapCursor {
    stack: Vec<usize>,
    version: u64,
    owner: u64,
}

impl MapCursor {
    fn tracks<K, V, C>(&self, map: &OrderedMap<K, V, C>) -> bool {
        self.owner == map.owner && self.version == map.version
    }

    /// Advances to the next entry in key order.
    ///
    /// Returns `Ok(None)` once the traversal is exhausted.
    ///
    /// # Errors
    ///
    /// [`CollectionError::StaleIterator`] if `map` was structurally modified
    /// after this cursor was created, or is not the map that created it.
    pub fn next<'m, K, V, C>(&mut self, map: &'m OrderedMap<K, V, C>) -> Result<Option<(&'m K, &'m V)>> {
        if !self.tracks(map) {
            return Err(CollectionError::StaleIterator);
        }
        let Some(n) = self.stack.pop() else {
            return Ok(None);
        };
        let node = map.nodes.get(n).ok_or(CollectionError::StaleIterator)?;
        descend_left(&map.nodes, &mut self.stack, node.right);
        Ok(Some((&node.key, &node.value)))
    }

    /// Rewinds to the smallest key.
    ///
    /// # Errors
    ///
    /// [`CollectionError::StaleIterator`] if `map` changed since the cursor
    /// was created or is a different map; a stale cursor stays stale.
    pub fn reset<K, V, C>(&mut self, map: &OrderedMap<K, V, C>) -> Result<()> {
        if !self.tracks(map) {
            return Err(CollectionError::StaleIterator);
        }
        self.stack.clear();
        descend_left(&map.nodes, &mut self.stack, map.root);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_valid<K, V, C: Comparator<K>>(map: &OrderedMap<K, V, C>) {
        if let Err(violation) = map.check_invariants() {
            panic!("red-black invariant violated: {violation}");
        }
    }

    #[test]
    fn test_add_lookup() {
        let mut map = OrderedMap::new();
        map.add(10, "ten").unwrap();
        map.add(5, "five").unwrap();

        assert_eq!(map.lookup(&10), Ok(&"ten"));
        assert_eq!(map.lookup(&5), Ok(&"five"));
        assert_eq!(map.lookup(&7), Err(CollectionError::NotFound));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_add_duplicate() {
        let mut map = OrderedMap::new();
        map.add(1, 'a').unwrap();

        assert_eq!(map.add(1, 'b'), Err(CollectionError::DuplicateKey));
        assert_eq!(map.lookup(&1), Ok(&'a'));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_upsert() {
        let mut map = OrderedMap::new();
        assert_eq!(map.upsert("k", 1), None);
        assert_eq!(map.upsert("k", 2), Some(1));
        assert_eq!(map.get(&"k"), Some(&2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_upsert_keeps_cursor_valid() {
        let mut map: OrderedMap<i32, i32> = (0..4).map(|i| (i, i)).collect();
        let mut cursor = map.cursor();
        assert_eq!(cursor.next(&map), Ok(Some((&0, &0))));

        map.upsert(2, 20);
        assert_eq!(cursor.next(&map), Ok(Some((&1, &1))));
        assert_eq!(cursor.next(&map), Ok(Some((&2, &20))));
    }

    #[test]
    fn test_remove() {
        let mut map = OrderedMap::new();
        for i in 0..10 {
            map.add(i, i * 10).unwrap();
        }

        assert_eq!(map.remove(&4), Some(40));
        assert!(!map.contains(&4));
        assert_eq!(map.len(), 9);

        // Absent keys are a no-op
        assert_eq!(map.remove(&4), None);
        assert_eq!(map.len(), 9);
        assert_valid(&map);
    }

    #[test]
    fn test_remove_node_with_two_children() {
        let mut map = OrderedMap::new();
        for key in [50, 30, 70, 20, 40, 60, 80] {
            map.add(key, key.to_string()).unwrap();
        }

        assert_eq!(map.remove_entry(&50), Some((50, "50".to_string())));
        assert_valid(&map);

        // The successor's entry must survive the key/value swap intact
        assert_eq!(map.get(&60), Some(&"60".to_string()));
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec![20, 30, 40, 60, 70, 80]);
    }

    #[test]
    fn test_min_max() {
        let mut map = OrderedMap::new();
        assert_eq!(map.min(), Err(CollectionError::EmptyCollection));
        assert_eq!(map.max(), Err(CollectionError::EmptyCollection));

        for key in [7, 3, 9, 1] {
            map.add(key, ()).unwrap();
        }
        assert_eq!(map.min(), Ok((&1, &())));
        assert_eq!(map.max(), Ok((&9, &())));
    }

    #[test]
    fn test_remove_min_max_entry() {
        let mut map: OrderedMap<i32, char> = [(2, 'b'), (1, 'a'), (3, 'c')].into_iter().collect();

        assert_eq!(map.remove_min_entry(), Ok((1, 'a')));
        assert_eq!(map.remove_max_entry(), Ok((3, 'c')));
        assert_eq!(map.remove_max_entry(), Ok((2, 'b')));
        assert_eq!(map.remove_min_entry(), Err(CollectionError::EmptyCollection));
    }

    #[test]
    fn test_clear() {
        let mut map: OrderedMap<i32, i32> = (0..32).map(|i| (i, i)).collect();
        map.clear();

        assert!(map.is_empty());
        assert_eq!(map.iter().count(), 0);
        assert_eq!(map.min(), Err(CollectionError::EmptyCollection));

        // Usable after clearing
        map.add(5, 5).unwrap();
        assert_eq!(map.lookup(&5), Ok(&5));
        assert_valid(&map);
    }

    #[test]
    fn test_in_order_iteration() {
        let mut map = OrderedMap::new();
        for key in [15, 3, 99, 42, 8, 23, 4, 16] {
            map.add(key, key * 2).unwrap();
        }

        let entries: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(
            entries,
            vec![(3, 6), (4, 8), (8, 16), (15, 30), (16, 32), (23, 46), (42, 84), (99, 198)]
        );
        assert_eq!(map.iter().len(), 8);
        assert_eq!(map.values().copied().max(), Some(198));
    }

    #[test]
    fn test_custom_comparator() {
        let mut map = OrderedMap::with_comparator(|a: &i32, b: &i32| b.cmp(a));
        for key in [1, 5, 3] {
            map.add(key, ()).unwrap();
        }

        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec![5, 3, 1]);
        assert_eq!(map.min(), Ok((&5, &())));
    }

    #[test]
    fn test_comparator_equality_rejects_duplicates() {
        // Keys equal under the comparator collide even if not identical
        let mut map = OrderedMap::with_comparator(|a: &String, b: &String| {
            a.to_lowercase().cmp(&b.to_lowercase())
        });
        map.add("Hello".to_string(), 1).unwrap();

        assert_eq!(map.add("HELLO".to_string(), 2), Err(CollectionError::DuplicateKey));
        assert_eq!(map.lookup(&"hello".to_string()), Ok(&1));
    }

    #[test]
    fn test_contains_value() {
        let map: OrderedMap<i32, &str> = [(1, "a"), (2, "b")].into_iter().collect();
        assert!(map.contains_value(&"b"));
        assert!(!map.contains_value(&"z"));
    }

    #[test]
    fn test_get_mut() {
        let mut map: OrderedMap<i32, Vec<i32>> = OrderedMap::new();
        map.add(1, vec![]).unwrap();
        map.get_mut(&1).unwrap().push(9);
        assert_eq!(map.get(&1), Some(&vec![9]));
        assert!(map.get_mut(&2).is_none());
    }

    #[test]
    fn test_cursor_traversal() {
        let map: OrderedMap<i32, ()> = [3, 1, 2].into_iter().map(|k| (k, ())).collect();
        let mut cursor = map.cursor();

        let mut seen = Vec::new();
        while let Some((key, _)) = cursor.next(&map).unwrap() {
            seen.push(*key);
        }
        assert_eq!(seen, vec![1, 2, 3]);

        // Exhausted cursors keep returning None
        assert_eq!(cursor.next(&map), Ok(None));

        cursor.reset(&map).unwrap();
        assert_eq!(cursor.next(&map), Ok(Some((&1, &()))));
    }

    #[test]
    fn test_cursor_stale_after_add() {
        let mut map = OrderedMap::new();
        for key in 0..5 {
            map.add(key, ()).unwrap();
        }

        let mut cursor = map.cursor();
        assert_eq!(cursor.next(&map), Ok(Some((&0, &()))));

        map.add(100, ()).unwrap();
        assert_eq!(cursor.next(&map), Err(CollectionError::StaleIterator));
        assert_eq!(cursor.reset(&map), Err(CollectionError::StaleIterator));
    }

    #[test]
    fn test_cursor_stale_after_remove_and_clear() {
        let mut map: OrderedMap<i32, ()> = (0..5).map(|k| (k, ())).collect();

        let mut cursor = map.cursor();
        map.remove(&3);
        assert_eq!(cursor.next(&map), Err(CollectionError::StaleIterator));

        let mut cursor = map.cursor();
        map.clear();
        assert_eq!(cursor.next(&map), Err(CollectionError::StaleIterator));
    }

    #[test]
    fn test_cursor_not_stale_after_failed_mutation() {
        let mut map: OrderedMap<i32, ()> = (0..3).map(|k| (k, ())).collect();
        let mut cursor = map.cursor();

        assert!(map.add(1, ()).is_err());
        assert_eq!(map.remove(&99), None);
        assert_eq!(cursor.next(&map), Ok(Some((&0, &()))));
    }

    #[test]
    fn test_cursor_rejects_other_map() {
        let first: OrderedMap<i32, ()> = (0..3).map(|k| (k, ())).collect();
        let second: OrderedMap<i32, ()> = (10..13).map(|k| (k, ())).collect();

        // Both maps went through the same number of mutations
        let mut cursor = first.cursor();
        assert_eq!(cursor.next(&second), Err(CollectionError::StaleIterator));
        assert_eq!(cursor.reset(&second), Err(CollectionError::StaleIterator));
        assert_eq!(cursor.next(&first), Ok(Some((&0, &()))));
    }

    #[test]
    fn test_ascending_insert_stays_balanced() {
        let mut map = OrderedMap::new();
        for key in 0..1024 {
            map.add(key, ()).unwrap();
        }
        let black_height = map.check_invariants().unwrap();

        // n >= 2^bh - 1 real nodes, plus one for the sentinel
        assert!(black_height <= 11);
    }

    #[test]
    fn test_randomized_invariants() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut map = OrderedMap::new();
        let mut reference = std::collections::BTreeMap::new();

        for _ in 0..4000 {
            let key: u16 = rng.gen_range(0..512);
            if rng.gen_bool(0.6) {
                let added = map.add(key, u32::from(key) * 3).is_ok();
                assert_eq!(added, reference.insert(key, u32::from(key) * 3).is_none());
            } else {
                assert_eq!(map.remove(&key), reference.remove(&key));
            }
            assert_valid(&map);
            assert_eq!(map.len(), reference.len());
        }

        let ours: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
        let theirs: Vec<_> = reference.into_iter().collect();
        assert_eq!(ours, theirs);
    }

    #[test]
    fn test_randomized_drain_from_both_ends() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut map = OrderedMap::new();
        for _ in 0..600 {
            let _ = map.add(rng.gen_range(-10_000..10_000), ());
        }

        let mut last_min = i32::MIN;
        let mut last_max = i32::MAX;
        while !map.is_empty() {
            let (key, _) = if rng.gen_bool(0.5) {
                let entry = map.remove_min_entry().unwrap();
                assert!(entry.0 > last_min);
                last_min = entry.0;
                entry
            } else {
                let entry = map.remove_max_entry().unwrap();
                assert!(entry.0 < last_max);
                last_max = entry.0;
                entry
            };
            assert!(!map.contains(&key));
            assert_valid(&map);
        }
    }
}
