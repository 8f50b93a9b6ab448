//! Error types for the rangecache library.
//!
//! ## Key Components
//!
//! - [`CacheError::InvalidRange`]: Returned when an entry or operation is
//!   given a range whose `begin` exceeds `end`, or a buffer whose length does
//!   not match the range it claims to cover. Aborts only the single call.
//! - [`CacheError::CapacityExceeded`]: Returned by
//!   [`make_room`](crate::cache::ReadCacheCore::make_room) when the requested
//!   block is larger than the whole configured cache. Nothing is evicted.
//! - [`CacheError::NothingToEvict`]: Returned by
//!   [`evict_lru`](crate::cache::ReadCacheCore::evict_lru) when no data entry
//!   exists; waiting for space to free up is futile.
//!
//! ## Example Usage
//!
//! ```
//! use rangecache::cache::ReadCacheCore;
//! use rangecache::error::CacheError;
//!
//! let mut cache = ReadCacheCore::new(100);
//!
//! // A block larger than the whole cache can never fit.
//! assert_eq!(
//!     cache.make_room(200),
//!     Err(CacheError::CapacityExceeded { requested: 200, max_bytes: 100 })
//! );
//!
//! // An empty cache has nothing to evict.
//! assert_eq!(cache.evict_lru(), Err(CacheError::NothingToEvict));
//! ```

use std::fmt;

/// Error produced by cache-entry construction and engine space management.
///
/// No public cache operation propagates these as hard failures beyond the
/// single call: `submit` converts capacity problems into a silent discard and
/// only surfaces `InvalidRange` for a malformed insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// `begin > end`, or the donated buffer does not cover `[begin, end]`.
    InvalidRange { begin: u64, end: u64 },
    /// The requested block exceeds the total configured capacity.
    CapacityExceeded { requested: u64, max_bytes: u64 },
    /// Eviction was requested but the cache holds no data entries.
    NothingToEvict,
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidRange { begin, end } => {
                write!(f, "invalid byte range {}->{}", begin, end)
            },
            CacheError::CapacityExceeded {
                requested,
                max_bytes,
            } => {
                write!(
                    f,
                    "requested {} bytes exceeds total cache capacity of {} bytes",
                    requested, max_bytes
                )
            },
            CacheError::NothingToEvict => f.write_str("no data entry available for eviction"),
        }
    }
}

impl std::error::Error for CacheError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_range_display_shows_offsets() {
        let err = CacheError::InvalidRange { begin: 10, end: 3 };
        assert_eq!(err.to_string(), "invalid byte range 10->3");
    }

    #[test]
    fn capacity_exceeded_display_shows_both_sizes() {
        let err = CacheError::CapacityExceeded {
            requested: 512,
            max_bytes: 128,
        };
        let msg = err.to_string();
        assert!(msg.contains("512"));
        assert!(msg.contains("128"));
    }

    #[test]
    fn nothing_to_evict_display() {
        assert_eq!(
            CacheError::NothingToEvict.to_string(),
            "no data entry available for eviction"
        );
    }

    #[test]
    fn clone_and_eq() {
        let a = CacheError::NothingToEvict;
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<CacheError>();
    }
}
