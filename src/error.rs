use alloc::collections::TryReserveError;

use thiserror::Error;

/// Errors returned by the fallible [`HashMap`](crate::HashMap) operations.
///
/// A failed call never leaves the map partially modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The map was constructed with a capacity of zero.
    #[error("capacity must be a positive integer, got {requested}")]
    InvalidCapacity {
        /// The rejected capacity.
        requested: usize,
    },

    /// The key is not present and no default was supplied.
    #[error("key not found")]
    KeyNotFound,

    /// `update` was given both a source and overrides.
    #[error("a merge takes either a source or overrides, not both")]
    InvalidMerge,

    /// Allocating storage for a larger bucket table failed.
    #[error("failed to allocate bucket table: {0}")]
    AllocationFailed(#[from] TryReserveError),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            Error::InvalidCapacity { requested: 0 }.to_string(),
            "capacity must be a positive integer, got 0"
        );
        assert_eq!(Error::KeyNotFound.to_string(), "key not found");
        assert_eq!(
            Error::InvalidMerge.to_string(),
            "a merge takes either a source or overrides, not both"
        );
    }

    #[test]
    fn allocation_failure_converts() {
        let mut v: alloc::vec::Vec<u64> = alloc::vec::Vec::new();
        let err = v.try_reserve(usize::MAX).unwrap_err();
        let err: Error = err.into();
        assert!(matches!(err, Error::AllocationFailed(_)));
    }
}
