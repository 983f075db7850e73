//! Sorted collection that keeps duplicates.
//!
//! [`SortedBag`] runs on the same red-black engine as
//! [`OrderedMap`], but an insertion never collides: a value comparing equal
//! to ones already present is placed after them. Useful as a min/max heap
//! over values that may tie.

use std::fmt;

use crate::compare::{Comparator, NaturalOrder};
use crate::error::Result;
use crate::map::{Keys, MapCursor, OrderedMap};

/// Values in comparator order, duplicates allowed.
///
/// # Example
///
/// ```
/// use glyphkit_collections::SortedBag;
///
/// let mut bag = SortedBag::new();
/// for value in [4, 1, 4, 2] {
///     bag.add(value);
/// }
///
/// assert_eq!(bag.len(), 4);
/// assert_eq!(bag.remove_maximum(), Ok(4));
/// assert_eq!(bag.remove_maximum(), Ok(4));
/// assert_eq!(bag.minimum(), Ok(&1));
/// ```
pub struct SortedBag<T, C = NaturalOrder> {
    tree: OrderedMap<T, (), C>,
}

impl<T> SortedBag<T> {
    /// Create a new empty bag ordered by `T: Ord`
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<T, C: Default> Default for SortedBag<T, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<T, C> SortedBag<T, C> {
    /// Create a new empty bag ordered by `cmp`
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            tree: OrderedMap::with_comparator(cmp),
        }
    }

    /// Get the number of values, counting duplicates
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if the bag is empty
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Drop every value
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Smallest value.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EmptyCollection`](crate::CollectionError::EmptyCollection)
    /// if the bag is empty.
    pub fn minimum(&self) -> Result<&T> {
        self.tree.min().map(|(value, _)| value)
    }

    /// Largest value.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EmptyCollection`](crate::CollectionError::EmptyCollection)
    /// if the bag is empty.
    pub fn maximum(&self) -> Result<&T> {
        self.tree.max().map(|(value, _)| value)
    }

    /// Remove and return the smallest value. Among ties, the earliest added
    /// goes first.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EmptyCollection`](crate::CollectionError::EmptyCollection)
    /// if the bag is empty.
    pub fn remove_minimum(&mut self) -> Result<T> {
        self.tree.remove_min_entry().map(|(value, _)| value)
    }

    /// Remove and return the largest value. Among ties, the latest added
    /// goes first.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EmptyCollection`](crate::CollectionError::EmptyCollection)
    /// if the bag is empty.
    pub fn remove_maximum(&mut self) -> Result<T> {
        self.tree.remove_max_entry().map(|(value, _)| value)
    }

    /// Values in ascending order; equal values in insertion order.
    pub fn iter(&self) -> Keys<'_, T, ()> {
        self.tree.keys()
    }

    /// Starts a detached ascending traversal that fails with
    /// [`CollectionError::StaleIterator`](crate::CollectionError::StaleIterator)
    /// once the bag is modified.
    pub fn cursor(&self) -> BagCursor {
        BagCursor {
            inner: self.tree.cursor(),
        }
    }
}

impl<T, C: Comparator<T>> SortedBag<T, C> {
    /// Add `value`, keeping any equal values already present.
    pub fn add(&mut self, value: T) {
        self.tree.insert_equal(value, ());
    }

    /// Check whether a value equal to `value` is present
    pub fn contains(&self, value: &T) -> bool {
        self.tree.contains(value)
    }

    /// Number of values equal to `value`. O(n).
    pub fn count(&self, value: &T) -> usize {
        let cmp = self.tree.comparator();
        self.iter()
            .filter(|present| cmp.compare(*present, value).is_eq())
            .count()
    }

    /// Remove one value equal to `value` and return it. No-op if none is
    /// present.
    pub fn remove(&mut self, value: &T) -> Option<T> {
        self.tree.remove_entry(value).map(|(value, _)| value)
    }

    #[doc(hidden)]
    pub fn check_invariants(&self) -> std::result::Result<usize, &'static str> {
        self.tree.check_tree(true)
    }
}

impl<T: fmt::Debug, C> fmt::Debug for SortedBag<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, C: Comparator<T>> Extend<T> for SortedBag<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl<T, C: Comparator<T> + Default> FromIterator<T> for SortedBag<T, C> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut bag = Self::default();
        bag.extend(iter);
        bag
    }
}

/// Detached ascending traversal created by [`SortedBag::cursor`].
#[derive(Debug, Clone)]
pub struct BagCursor {
    inner: MapCursor,
}

impl BagCursor {
    /// Advances to the next value, or `Ok(None)` past the largest.
    ///
    /// # Errors
    ///
    /// [`CollectionError::StaleIterator`](crate::CollectionError::StaleIterator)
    /// if `bag` was modified after this cursor was created, or is not the
    /// bag that created it.
    pub fn next<'b, T, C>(&mut self, bag: &'b SortedBag<T, C>) -> Result<Option<&'b T>> {
        Ok(self.inner.next(&bag.tree)?.map(|(value, _)| value))
    }

    /// Rewinds to the smallest value.
    ///
    /// # Errors
    ///
    /// Same as [`next`](Self::next).
    pub fn reset<T, C>(&mut self, bag: &SortedBag<T, C>) -> Result<()> {
        self.inner.reset(&bag.tree)
    }
}
