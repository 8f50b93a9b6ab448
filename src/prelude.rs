//! Convenience re-exports for typical embedders.
//!
//! ```
//! use rangecache::prelude::*;
//!
//! let cache = ReadCache::new(1 << 20);
//! assert!(cache.is_empty());
//! ```

pub use crate::cache::{LookupResult, ReadCache, ReadCacheCore, MIN_FRAGMENT_LEN};
pub use crate::entry::CacheEntry;
pub use crate::error::CacheError;
pub use crate::range::ByteRange;
pub use crate::stats::ReadCacheStats;
