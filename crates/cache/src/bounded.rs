//! Bounded cache with insertion-order eviction.
//!
//! [`BoundedCache`] pairs an [`OrderedMap`] from index to list handle with a
//! [`LinkedList`] of entries ordered newest first. Lookup is O(log n) through
//! the map; eviction pops the list tail in O(1).
//!
//! Eviction is FIFO by insertion time. A hit does **not** move the entry, so
//! an entry that is read constantly is still evicted once enough newer
//! entries arrive.
//!
//! Payloads implement [`Release`]. The cache calls `release` exactly once on
//! every payload it drops: on eviction, capacity shrink, clear, replacement
//! and when the cache itself is dropped. A failed release never aborts the
//! operation that caused it; it is logged with `tracing` and counted in
//! [`CacheStats::release_failures`].

use std::fmt;
use std::ops::Deref;

use glyphkit_collections::{Comparator, LinkedList, NaturalOrder, NodeHandle, OrderedMap};

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Resources held by a cached payload that must be freed explicitly.
pub trait Release {
    type Error: fmt::Display;

    /// Frees the payload's resources. Called at most once per payload.
    fn release(&mut self) -> std::result::Result<(), Self::Error>;
}

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries currently cached
    pub entry_count: usize,

    /// Maximum number of entries
    pub capacity: usize,

    /// Number of lookups that found an entry
    pub hits: u64,

    /// Number of lookups that found nothing
    pub misses: u64,

    /// Number of payloads stored
    pub insertions: u64,

    /// Number of entries dropped to stay within capacity
    pub evictions: u64,

    /// Number of payloads whose release routine reported an error
    pub release_failures: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate capacity utilization (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.entry_count as f64 / self.capacity as f64
        }
    }
}

struct Slot<K, P> {
    index: K,
    payload: P,
}

/// Result of [`BoundedCache::get_or_insert_with`].
#[derive(Debug)]
pub enum Fetched<'a, P> {
    /// The payload lives in the cache.
    Cached(&'a P),
    /// The cache has capacity 0; the freshly produced payload is handed
    /// back and its resources are the caller's to release.
    Transient(P),
}

impl<P> Fetched<'_, P> {
    /// Returns `true` if the payload is held by the cache.
    pub fn is_cached(&self) -> bool {
        matches!(self, Fetched::Cached(_))
    }
}

impl<P> Deref for Fetched<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        match self {
            Fetched::Cached(payload) => payload,
            Fetched::Transient(payload) => payload,
        }
    }
}

/// Capacity-bounded cache keyed by `K` under comparator `C`.
///
/// # Example
///
/// ```
/// use glyphkit_cache::{BoundedCache, Release};
///
/// struct Blob(Vec<u8>);
///
/// impl Release for Blob {
///     type Error = std::convert::Infallible;
///
///     fn release(&mut self) -> Result<(), Self::Error> {
///         self.0.clear();
///         Ok(())
///     }
/// }
///
/// let mut cache = BoundedCache::new(2);
/// cache.put(1u32, Blob(vec![1]));
/// cache.put(2u32, Blob(vec![2]));
/// assert!(cache.try_get(&1).is_some());
///
/// // Oldest insertion goes first, even though it was just read
/// cache.put(3u32, Blob(vec![3]));
/// assert!(cache.try_get(&1).is_none());
/// assert_eq!(cache.len(), 2);
/// ```
pub struct BoundedCache<K, P: Release, C = NaturalOrder> {
    index: OrderedMap<K, NodeHandle, C>,
    /// Newest at the head, oldest at the tail
    order: LinkedList<Slot<K, P>>,
    capacity: usize,
    stats: CacheStats,
}

impl<K, P: Release> BoundedCache<K, P> {
    /// Create a cache holding at most `capacity` entries, ordered by `K: Ord`.
    pub fn new(capacity: usize) -> Self {
        Self::with_comparator(capacity, NaturalOrder)
    }

    /// Create a cache sized from `config`.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.glyph_capacity)
    }
}

impl<K, P: Release, C> BoundedCache<K, P, C> {
    /// Create a cache holding at most `capacity` entries, ordered by `cmp`.
    pub fn with_comparator(capacity: usize, cmp: C) -> Self {
        Self {
            index: OrderedMap::with_comparator(cmp),
            order: LinkedList::new(),
            capacity,
            stats: CacheStats {
                capacity,
                ..Default::default()
            },
        }
    }

    /// Get the number of cached entries
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Get the maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.len(),
            capacity: self.capacity,
            ..self.stats
        }
    }

    /// Entries from newest to oldest. Does not count as hits.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &P)> + '_ {
        self.order.iter().map(|slot| (&slot.index, &slot.payload))
    }

    /// Release every payload and empty the cache.
    pub fn clear(&mut self) {
        let released = self.len();
        self.release_all();
        tracing::debug!(released, "cleared cache");
    }

    fn release_all(&mut self) {
        while let Some(slot) = self.order.pop_back() {
            self.release(slot);
        }
        self.index.clear();
    }

    fn release(&mut self, mut slot: Slot<K, P>) {
        if let Err(err) = slot.payload.release() {
            self.stats.release_failures += 1;
            tracing::warn!(error = %err, "failed to release cached payload");
        }
    }
}

impl<K: Clone, P: Release, C: Comparator<K>> BoundedCache<K, P, C> {
    /// Look up `index`, counting a hit or a miss.
    ///
    /// A hit leaves the entry's eviction position unchanged.
    pub fn try_get(&mut self, index: &K) -> Option<&P> {
        match self.index.get(index).copied() {
            Some(handle) => {
                self.stats.hits += 1;
                Some(&self.order[handle].payload)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Look up `index` without touching the statistics.
    pub fn peek(&self, index: &K) -> Option<&P> {
        let handle = self.index.get(index)?;
        self.order.get(*handle).map(|slot| &slot.payload)
    }

    /// Check whether `index` is cached
    pub fn contains(&self, index: &K) -> bool {
        self.index.contains(index)
    }

    /// Store `payload` under `index` as the newest entry.
    ///
    /// An entry already stored under `index` is replaced and its payload
    /// released. If the cache is full, the oldest entry is evicted first.
    ///
    /// With capacity 0 nothing is stored and the payload is returned to the
    /// caller, who then owns its resources.
    pub fn put(&mut self, index: K, payload: P) -> Option<P> {
        self.insert(index, payload).err()
    }

    /// Return the payload cached under `index`, producing and caching it
    /// with `fetch` on a miss.
    ///
    /// # Errors
    ///
    /// Whatever `fetch` returns. The cache is left unchanged in that case.
    pub fn get_or_insert_with<E, F>(&mut self, index: K, fetch: F) -> std::result::Result<Fetched<'_, P>, E>
    where
        F: FnOnce(&K) -> std::result::Result<P, E>,
    {
        if let Some(handle) = self.index.get(&index).copied() {
            self.stats.hits += 1;
            return Ok(Fetched::Cached(&self.order[handle].payload));
        }
        self.stats.misses += 1;

        let payload = fetch(&index)?;
        match self.insert(index, payload) {
            Ok(handle) => Ok(Fetched::Cached(&self.order[handle].payload)),
            Err(payload) => Ok(Fetched::Transient(payload)),
        }
    }

    /// Change the maximum number of entries.
    ///
    /// Shrinking evicts oldest entries until the cache fits; 0 releases
    /// everything. Any integer type is accepted so that a negative request
    /// can be rejected instead of wrapping.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidArgument`] if `capacity` is negative or does
    /// not fit in `usize`. The cache is unchanged in that case.
    pub fn set_capacity<N>(&mut self, capacity: N) -> Result<()>
    where
        N: TryInto<usize> + Copy + fmt::Display,
    {
        let new: usize = capacity
            .try_into()
            .map_err(|_| CacheError::InvalidArgument(format!("cache capacity out of range: {capacity}")))?;

        if new == 0 {
            self.clear();
        } else {
            while self.len() > new && self.evict_oldest() {}
        }

        tracing::debug!(old = self.capacity, new, "cache capacity changed");
        self.capacity = new;
        Ok(())
    }

    /// Remove the entry for `index` and hand its payload back unreleased.
    pub fn remove(&mut self, index: &K) -> Option<P> {
        let handle = self.index.remove(index)?;
        self.order.remove(handle).map(|slot| slot.payload)
    }

    fn insert(&mut self, index: K, payload: P) -> std::result::Result<NodeHandle, P> {
        if self.capacity == 0 {
            return Err(payload);
        }

        if let Some(stale) = self.index.remove(&index) {
            if let Some(slot) = self.order.remove(stale) {
                self.release(slot);
            }
        }
        while self.len() >= self.capacity && self.evict_oldest() {}

        let handle = self.order.prepend(Slot {
            index: index.clone(),
            payload,
        });
        self.index.upsert(index, handle);
        self.stats.insertions += 1;
        Ok(handle)
    }

    /// Evict the tail entry. Returns `false` if the cache was empty.
    fn evict_oldest(&mut self) -> bool {
        let Some(slot) = self.order.pop_back() else {
            return false;
        };
        self.index.remove(&slot.index);
        self.stats.evictions += 1;
        self.release(slot);
        true
    }
}

impl<K, P: Release, C> Drop for BoundedCache<K, P, C> {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl<K, P: Release, C> fmt::Debug for BoundedCache<K, P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish()
    }
}
