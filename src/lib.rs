//! # rangecache
//!
//! Client-side read cache for byte ranges of a single remote file.
//!
//! A remote-file client keeps one cache per open file. Fetched blocks are
//! donated to the cache (`submit`), later reads are satisfied from memory
//! where possible (`lookup`), and in-flight requests are tracked with
//! placeholder reservations (`put_placeholder`) so concurrent readers of the
//! same range wait for one outstanding request instead of issuing their own.
//! Capacity is enforced by LRU eviction of data blocks.
//!
//! ## Quick Start
//!
//! ```
//! use rangecache::prelude::*;
//!
//! let cache = ReadCache::new(64 * 1024 * 1024);
//!
//! // The reader misses and learns what to fetch.
//! let mut dest = vec![0u8; 8192];
//! let result = cache.lookup(&mut dest, 0, 8191, true);
//! assert_eq!(result.missing, vec![ByteRange::new(0, 8191)]);
//!
//! // Reserve the range, fetch it remotely, then donate the block.
//! cache.put_placeholder(0, 8191).unwrap();
//! cache.submit(vec![0x55; 8192], 0, 8191).unwrap();
//!
//! // The next read over the range is served from memory.
//! let result = cache.lookup(&mut dest, 0, 8191, true);
//! assert_eq!(result.bytes, 8192);
//! ```
//!
//! ## Modules
//!
//! | Module    | Contents                                             |
//! |-----------|------------------------------------------------------|
//! | [`cache`] | `ReadCacheCore` engine and the `ReadCache` wrapper   |
//! | [`entry`] | `CacheEntry`: data block or placeholder reservation  |
//! | [`range`] | `ByteRange`, the inclusive interval type             |
//! | [`stats`] | `ReadCacheStats` performance snapshot                |
//! | [`error`] | `CacheError`                                         |
//!
//! ## Design Notes
//!
//! - Intervals are inclusive on both ends; a one-byte range is `[n, n]`.
//! - The entry list is a `Vec` kept sorted by `begin`. Client read patterns
//!   are dominated by sequential and readahead traffic, so linear scans over
//!   a short sorted list beat a tree in practice.
//! - Placeholders cost no budget bytes and are never evicted; they disappear
//!   when the data arrives or the range is explicitly removed.

pub mod cache;
pub mod entry;
pub mod error;
pub mod prelude;
pub mod range;
pub mod stats;

pub use cache::{LookupResult, ReadCache, ReadCacheCore, MIN_FRAGMENT_LEN};
pub use error::CacheError;
pub use range::ByteRange;
pub use stats::ReadCacheStats;
