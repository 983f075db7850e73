//! Error type for cache operations.

/// Errors reported by [`BoundedCache`](crate::BoundedCache).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// A caller-supplied argument is out of range, such as a negative
    /// capacity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result alias for cache operations.
pub type Result<T, E = CacheError> = std::result::Result<T, E>;
