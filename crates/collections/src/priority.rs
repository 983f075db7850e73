//! Priority queue keyed by unique integer priorities.
//!
//! A constrained view over [`OrderedMap`]: keys are `i32` priorities, so
//! extremal extraction is a walk down one side of the tree and reassigning
//! a priority is a remove followed by an add of the same value.

use crate::error::{CollectionError, Result};
use crate::map::{Iter, MapCursor, OrderedMap};

/// Priority of a queued value. Lower is extracted first by
/// [`PriorityQueue::remove_minimum`].
pub type Priority = i32;

/// Values ordered by unique integer priority.
///
/// # Example
///
/// ```
/// use glyphkit_collections::PriorityQueue;
///
/// let mut queue = PriorityQueue::new();
/// queue.add(5, "five").unwrap();
/// queue.add(1, "one").unwrap();
/// queue.add(3, "three").unwrap();
///
/// assert_eq!(queue.remove_minimum(), Ok("one"));
/// assert_eq!(queue.remove_maximum(), Ok("five"));
/// assert_eq!(queue.len(), 1);
/// ```
pub struct PriorityQueue<V> {
    map: OrderedMap<Priority, V>,
}

impl<V> PriorityQueue<V> {
    /// Create a new empty priority queue
    pub fn new() -> Self {
        Self {
            map: OrderedMap::new(),
        }
    }

    /// Queue `value` at `priority`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::DuplicateKey`] if `priority` is already in use.
    pub fn add(&mut self, priority: Priority, value: V) -> Result<()> {
        self.map.add(priority, value)
    }

    /// Remove and return the value with the lowest priority.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EmptyCollection`] if the queue is empty.
    pub fn remove_minimum(&mut self) -> Result<V> {
        self.map.remove_min_entry().map(|(_, value)| value)
    }

    /// Remove and return the value with the highest priority.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EmptyCollection`] if the queue is empty.
    pub fn remove_maximum(&mut self) -> Result<V> {
        self.map.remove_max_entry().map(|(_, value)| value)
    }

    /// Move the value queued at `old` to `new`.
    ///
    /// Equivalent to removing the entry and adding its value back under the
    /// new priority; the value's position afterwards depends only on `new`.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::DuplicateKey`] if `new` is already occupied
    ///   (including `new == old`)
    /// - [`CollectionError::NotFound`] if nothing is queued at `old`
    ///
    /// The queue is unchanged when an error is returned.
    pub fn set_priority(&mut self, old: Priority, new: Priority) -> Result<()> {
        if self.map.contains(&new) {
            return Err(CollectionError::DuplicateKey);
        }
        let value = self.map.remove(&old).ok_or(CollectionError::NotFound)?;
        self.map.add(new, value)
    }

    /// Lowest priority and its value, without removing it.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EmptyCollection`] if the queue is empty.
    pub fn peek_minimum(&self) -> Result<(Priority, &V)> {
        self.map.min().map(|(priority, value)| (*priority, value))
    }

    /// Highest priority and its value, without removing it.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EmptyCollection`] if the queue is empty.
    pub fn peek_maximum(&self) -> Result<(Priority, &V)> {
        self.map.max().map(|(priority, value)| (*priority, value))
    }

    /// Value queued at `priority`, if any.
    pub fn get(&self, priority: Priority) -> Option<&V> {
        self.map.get(&priority)
    }

    /// Mutable access to the value queued at `priority`.
    pub fn get_mut(&mut self, priority: Priority) -> Option<&mut V> {
        self.map.get_mut(&priority)
    }

    /// Check whether `priority` is in use
    pub fn contains(&self, priority: Priority) -> bool {
        self.map.contains(&priority)
    }

    /// Remove the value queued at `priority`, if any.
    pub fn remove(&mut self, priority: Priority) -> Option<V> {
        self.map.remove(&priority)
    }

    /// Get the number of queued values
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop every queued value
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Entries in ascending priority order.
    pub fn iter(&self) -> Iter<'_, Priority, V> {
        self.map.iter()
    }

    /// Detached traversal in ascending priority order; advance it with
    /// [`MapCursor::next`] against [`PriorityQueue::as_map`].
    pub fn cursor(&self) -> MapCursor {
        self.map.cursor()
    }

    /// The underlying ordered map.
    pub fn as_map(&self) -> &OrderedMap<Priority, V> {
        &self.map
    }
}

impl<V> Default for PriorityQueue<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for PriorityQueue<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("entries", &self.map)
            .finish()
    }
}
