//! Error type shared by every collection in this crate.

/// Usage-contract violations reported by the collections.
///
/// None of these are retryable: they describe a call that can never
/// succeed against the collection's current contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    /// The key or priority is already present.
    #[error("key already exists in collection")]
    DuplicateKey,

    /// The key, priority, node or anchor value is absent.
    #[error("key not found in collection")]
    NotFound,

    /// An extremal operation was invoked on an empty collection.
    #[error("the collection is empty")]
    EmptyCollection,

    /// A cursor was advanced after its collection was structurally modified.
    #[error("the collection has changed since iteration began")]
    StaleIterator,
}

/// Result alias used throughout the crate.
pub type Result<T, E = CollectionError> = std::result::Result<T, E>;
