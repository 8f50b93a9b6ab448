//! # Read Cache Engine
//!
//! Interval-indexed cache for byte ranges of a single remote file. Stores
//! previously fetched blocks, serves overlapping reads from memory, and
//! tracks in-flight reads through placeholder reservations so the same range
//! is never requested twice concurrently.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │                      ReadCache (Clone)                        │
//!   │   ┌───────────────────────────────────────────────────────┐   │
//!   │   │            Arc<parking_lot::Mutex<ReadCacheCore>>     │   │
//!   │   └───────────────────────────────────────────────────────┘   │
//!   │                              │                                │
//!   │                              ▼                                │
//!   │   ┌───────────────────────────────────────────────────────┐   │
//!   │   │  ReadCacheCore                                        │   │
//!   │   │    entries: Vec<CacheEntry>  (sorted by begin;        │   │
//!   │   │             Data before Placeholder at equal begin)   │   │
//!   │   │    total_bytes / max_bytes   (Data buffers only)      │   │
//!   │   │    tick_counter              (LRU logical clock)      │   │
//!   │   │    stats                     (hit/miss accounting)    │   │
//!   │   └───────────────────────────────────────────────────────┘   │
//!   └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Components
//!
//! | Component       | Description                                          |
//! |-----------------|------------------------------------------------------|
//! | `ReadCacheCore` | Single-threaded engine: submit/lookup/evict          |
//! | `ReadCache`     | Thread-safe wrapper; one mutex per operation         |
//! | `LookupResult`  | Bytes served + missing holes + outstanding blocks    |
//!
//! ## Operation Flow
//!
//! ```text
//!   completion thread                    reader thread
//!        │                                    │
//!        │ submit(buf, b, e)                  │ lookup(dest, b, e)
//!        ▼                                    ▼
//!   remove contained entries            phase 1: copy contiguous
//!   split straddling placeholders                prefix of Data entries
//!   duplicate?   -> discard buf         phase 2: classify the rest into
//!   make_room (LRU eviction)                     holes (fetch these) and
//!   ordered insert                               placeholders (await these)
//! ```
//!
//! A reader that gets a partial result fetches each `missing` range remotely,
//! registering a placeholder (`put_placeholder`) for every range it requests
//! so concurrent readers wait instead of re-requesting. The completion thread
//! later `submit`s the received buffer, which replaces or splits the
//! placeholder. Ranges already covered by someone else's placeholder show up
//! in `outstanding` and must not be re-requested.
//!
//! ## Concurrency Model
//!
//! A single mutex guards the whole entry sequence and all counters. Every
//! public `ReadCache` operation holds it for its full duration, including the
//! buffer copies of a lookup, and releases it on every exit path. No I/O
//! happens inside the locked section, so no operation blocks a caller beyond
//! the lock hold time. The tick counter only advances under the lock, which
//! totally orders touch events.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::range::ByteRange;
use crate::stats::{ReadCacheStats, StatsCounters};

/// Residual placeholder fragments of this length or shorter are dropped when
/// a placeholder is split; tracking them costs more than re-fetching.
pub const MIN_FRAGMENT_LEN: u64 = 32;

/// Outcome of a [`lookup`](ReadCacheCore::lookup).
///
/// `bytes` counts only data copied into the destination (the contiguous
/// prefix of the request). Anything unsatisfied is classified: `missing`
/// holds the holes the caller must fetch remotely, in ascending order;
/// `outstanding` counts sub-ranges already covered by an in-flight
/// placeholder, which the caller awaits rather than re-requests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LookupResult {
    /// Bytes copied into the destination buffer.
    pub bytes: u64,
    /// Holes covered by neither data nor a placeholder.
    pub missing: Vec<ByteRange>,
    /// Number of sub-ranges covered by an in-flight placeholder.
    pub outstanding: usize,
}

/// Single-threaded read cache engine.
///
/// Not thread-safe on its own; [`ReadCache`] provides the locked wrapper.
/// Useful directly in tests and single-threaded embeddings.
pub struct ReadCacheCore {
    /// Sorted ascending by `begin`; Data precedes a Placeholder of equal
    /// `begin`. Data entries never overlap each other.
    entries: Vec<CacheEntry>,
    total_bytes: u64,
    max_bytes: u64,
    tick_counter: u64,
    stats: StatsCounters,
}

impl ReadCacheCore {
    /// Creates an engine with a total data budget of `max_bytes`.
    ///
    /// Placeholders never count against the budget.
    pub fn new(max_bytes: u64) -> Self {
        ReadCacheCore {
            entries: Vec::new(),
            total_bytes: 0,
            max_bytes,
            tick_counter: 0,
            stats: StatsCounters::default(),
        }
    }

    #[inline]
    fn next_tick(&mut self) -> u64 {
        self.tick_counter += 1;
        self.tick_counter
    }

    /// Ingests a newly fetched block, taking ownership of `buffer`.
    ///
    /// Entries fully contained in `[begin, end]` are dropped first and
    /// straddling placeholders are split. If an existing entry already covers
    /// the whole range the buffer is discarded (`Ok(false)`); likewise when
    /// the block cannot fit even after evicting everything. Data entries that
    /// partially overlap the new block are dropped so no byte is ever counted
    /// twice; the protocol layer re-fetches dropped bytes on a later miss.
    ///
    /// Fails with [`CacheError::InvalidRange`] when `begin > end` or the
    /// buffer does not cover `[begin, end]` exactly. An empty buffer is a
    /// no-op discard.
    ///
    /// # Example
    /// ```
    /// use rangecache::cache::ReadCacheCore;
    ///
    /// let mut cache = ReadCacheCore::new(1024);
    /// assert_eq!(cache.submit(vec![7; 100], 0, 99), Ok(true));
    /// assert_eq!(cache.total_bytes(), 100);
    ///
    /// // Already covered by the block above: discarded.
    /// assert_eq!(cache.submit(vec![7; 10], 40, 49), Ok(false));
    /// assert_eq!(cache.total_bytes(), 100);
    /// ```
    pub fn submit(&mut self, buffer: Vec<u8>, begin: u64, end: u64) -> Result<bool, CacheError> {
        if begin > end || (!buffer.is_empty() && buffer.len() as u64 != end - begin + 1) {
            return Err(CacheError::InvalidRange { begin, end });
        }
        if buffer.is_empty() {
            return Ok(false);
        }
        let range = ByteRange::new(begin, end);
        trace!(begin, end, "submitting block to cache");

        self.remove(begin, end);

        // A duplicate or superset is already cached; keep it, drop the new
        // buffer. Placeholders containing the range were split above, so this
        // can only match a data entry.
        if self.entries.iter().any(|e| e.contains(range)) {
            trace!(begin, end, "range already covered; discarding block");
            return Ok(false);
        }

        // Data entries partially overlapping the new block would double-count
        // their shared bytes; drop them whole.
        let mut reclaimed = 0;
        self.entries.retain(|entry| {
            if !entry.is_placeholder() && entry.overlap_len(range) > 0 {
                reclaimed += entry.size();
                false
            } else {
                true
            }
        });
        self.total_bytes -= reclaimed;

        let size = range.len();
        if self.make_room(size).is_err() {
            debug!(
                begin,
                end,
                size,
                max_bytes = self.max_bytes,
                "block cannot fit in cache; discarding"
            );
            return Ok(false);
        }

        let tick = self.next_tick();
        let entry = CacheEntry::new_data(buffer, begin, end, tick)?;
        let pos = self
            .entries
            .iter()
            .position(|e| e.begin() >= begin)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.total_bytes += size;
        self.stats.record_submit(size);
        Ok(true)
    }

    /// Reserves `[begin, end]` for a read about to be issued remotely.
    ///
    /// No-op (`Ok(false)`) when an existing entry already fully contains the
    /// range: an equivalent or larger reservation, or the data itself, is
    /// already there. Placeholders do not affect the byte budget.
    pub fn put_placeholder(&mut self, begin: u64, end: u64) -> Result<bool, CacheError> {
        if begin > end {
            return Err(CacheError::InvalidRange { begin, end });
        }
        Ok(self.insert_placeholder(ByteRange::new(begin, end)))
    }

    /// Ordered placeholder insert with containment no-op. Returns whether an
    /// entry was added.
    fn insert_placeholder(&mut self, range: ByteRange) -> bool {
        if self.entries.iter().any(|e| e.contains(range)) {
            return false;
        }
        let tick = self.next_tick();
        let Ok(entry) = CacheEntry::new_placeholder(range.begin, range.end, tick) else {
            return false;
        };
        // Keep Data ahead of a Placeholder sharing the same begin.
        let pos = self
            .entries
            .iter()
            .position(|e| {
                e.begin() > range.begin || (e.begin() == range.begin && e.is_placeholder())
            })
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        true
    }

    /// Attempts to satisfy `[begin, end]` into `dest`.
    ///
    /// Phase 1 copies the contiguous prefix available from data entries,
    /// touching each one for LRU ordering. It stops at the first gap or
    /// placeholder; a fully satisfied request returns immediately. Phase 2
    /// classifies the unsatisfied remainder without writing to `dest`: holes
    /// are appended to `missing` and placeholder-covered sub-ranges bump
    /// `outstanding`.
    ///
    /// With `count_stats`, the lookup counter increments, served bytes accrue
    /// as hit bytes, and a non-full result increments the miss counter exactly
    /// once. A full hit never touches the miss counter.
    ///
    /// # Panics
    ///
    /// May panic if `dest` is shorter than `end - begin + 1` bytes.
    ///
    /// # Example
    /// ```
    /// use rangecache::cache::ReadCacheCore;
    /// use rangecache::range::ByteRange;
    ///
    /// let mut cache = ReadCacheCore::new(1024);
    /// let mut dest = [0u8; 20];
    ///
    /// let result = cache.lookup(&mut dest, 10, 29, true);
    /// assert_eq!(result.bytes, 0);
    /// assert_eq!(result.missing, vec![ByteRange::new(10, 29)]);
    ///
    /// cache.submit(vec![3; 20], 10, 29).unwrap();
    /// let result = cache.lookup(&mut dest, 10, 29, true);
    /// assert_eq!(result.bytes, 20);
    /// assert!(result.missing.is_empty());
    /// ```
    pub fn lookup(
        &mut self,
        dest: &mut [u8],
        begin: u64,
        end: u64,
        count_stats: bool,
    ) -> LookupResult {
        let mut result = LookupResult::default();
        if begin > end {
            return result;
        }
        let total = end - begin + 1;
        if count_stats {
            self.stats.record_lookup();
        }

        // Phase 1: serve the contiguous prefix from data entries, in order.
        let mut idx = 0;
        let mut cursor = begin;
        while idx < self.entries.len() {
            let (entry_begin, placeholder) = {
                let entry = &self.entries[idx];
                (entry.begin(), entry.is_placeholder())
            };
            if entry_begin > cursor || placeholder {
                break;
            }
            let copied = self.entries[idx].copy_overlap(
                &mut dest[(cursor - begin) as usize..],
                ByteRange::new(cursor, end),
            );
            if copied > 0 {
                result.bytes += copied;
                cursor = begin + result.bytes;
                let tick = self.next_tick();
                self.entries[idx].touch(tick);
                if count_stats {
                    self.stats.record_hit_bytes(copied);
                }
                if result.bytes >= total {
                    trace!(begin, end, bytes = result.bytes, "cache hit");
                    return result;
                }
            }
            idx += 1;
        }

        // Phase 2: classify the remainder. Holes become missing ranges to be
        // fetched; placeholder coverage is awaited, not re-requested.
        while idx < self.entries.len() {
            let entry = &self.entries[idx];
            if entry.begin() > end {
                break;
            }
            if entry.begin() > cursor {
                result.missing.push(ByteRange::new(cursor, entry.begin() - 1));
                cursor = entry.begin();
            }
            let overlap = entry.overlap_len(ByteRange::new(cursor, end));
            if overlap > 0 {
                if entry.is_placeholder() {
                    result.outstanding += 1;
                }
                cursor += overlap;
            }
            if cursor > end {
                break;
            }
            idx += 1;
        }
        if cursor <= end {
            result.missing.push(ByteRange::new(cursor, end));
        }

        if count_stats {
            self.stats.record_miss();
        }
        trace!(
            begin,
            end,
            bytes = result.bytes,
            missing = result.missing.len(),
            outstanding = result.outstanding,
            "cache miss"
        );
        result
    }

    /// Clears every entry fully contained in `[begin, end]` and splits any
    /// placeholder straddling a boundary of the range.
    ///
    /// Residual placeholder fragments survive only when longer than
    /// [`MIN_FRAGMENT_LEN`] bytes. Data entries that only partially overlap
    /// the cleared range are left whole; only placeholders are split.
    pub fn remove(&mut self, begin: u64, end: u64) {
        if begin > end {
            return;
        }
        let range = ByteRange::new(begin, end);

        let mut reclaimed = 0;
        self.entries.retain(|entry| {
            if entry.is_contained_in(range) {
                reclaimed += entry.size();
                false
            } else {
                true
            }
        });
        self.total_bytes -= reclaimed;

        // Any placeholder still overlapping must straddle a boundary of the
        // cleared range (contained ones are gone). Replace it with the
        // residues outside the range, keeping only fragments worth tracking.
        loop {
            let straddler = self.entries.iter().position(|entry| {
                entry.is_placeholder()
                    && (entry.range().contains_offset(begin)
                        || entry.range().contains_offset(end))
            });
            let Some(idx) = straddler else {
                break;
            };
            let removed = self.entries.remove(idx);
            if removed.begin() < begin {
                let left = ByteRange::new(removed.begin(), begin - 1);
                if left.len() > MIN_FRAGMENT_LEN {
                    self.insert_placeholder(left);
                }
            }
            if removed.end() > end {
                let right = ByteRange::new(end + 1, removed.end());
                if right.len() > MIN_FRAGMENT_LEN {
                    self.insert_placeholder(right);
                }
            }
        }
    }

    /// Evicts the data entry with the smallest `last_touch`, reclaiming its
    /// bytes. Placeholders are never eviction candidates.
    ///
    /// Ties on `last_touch` resolve to the earlier entry in ascending-offset
    /// order. Returns the bytes reclaimed, or
    /// [`CacheError::NothingToEvict`] when no data entry exists.
    pub fn evict_lru(&mut self) -> Result<u64, CacheError> {
        let mut victim: Option<(usize, u64)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.is_placeholder() {
                continue;
            }
            let older = match victim {
                None => true,
                Some((_, min_touch)) => entry.last_touch() < min_touch,
            };
            if older {
                victim = Some((idx, entry.last_touch()));
            }
        }
        let (idx, _) = victim.ok_or(CacheError::NothingToEvict)?;
        let entry = self.entries.remove(idx);
        let size = entry.size();
        self.total_bytes -= size;
        trace!(
            begin = entry.begin(),
            end = entry.end(),
            size,
            "evicted LRU block"
        );
        Ok(size)
    }

    /// Evicts LRU data entries until `bytes` fit within the budget.
    ///
    /// Fails with [`CacheError::CapacityExceeded`] (evicting nothing) when
    /// `bytes` exceeds the total configured capacity.
    pub fn make_room(&mut self, bytes: u64) -> Result<(), CacheError> {
        if bytes > self.max_bytes {
            return Err(CacheError::CapacityExceeded {
                requested: bytes,
                max_bytes: self.max_bytes,
            });
        }
        while self.max_bytes - self.total_bytes < bytes {
            self.evict_lru()?;
        }
        Ok(())
    }

    /// Clears every entry. Cumulative performance counters are preserved.
    pub fn remove_all(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
    }

    /// Clears only placeholder reservations, e.g. when abandoning all
    /// in-flight reads on disconnect.
    pub fn remove_placeholders(&mut self) {
        self.entries.retain(|entry| !entry.is_placeholder());
    }

    /// Bytes currently held by data entries.
    #[inline]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Configured capacity ceiling.
    #[inline]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Current number of entries, placeholders included.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the cache holds no entries at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of placeholder reservations currently registered.
    pub fn placeholder_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_placeholder()).count()
    }

    /// Snapshot of the cumulative performance counters.
    pub fn stats(&self) -> ReadCacheStats {
        self.stats.snapshot()
    }

    /// Emits the current entry list as trace events, one per block.
    pub fn log_entries(&self) {
        trace!(
            entries = self.entries.len(),
            total_bytes = self.total_bytes,
            max_bytes = self.max_bytes,
            "cache status"
        );
        for (idx, entry) in self.entries.iter().enumerate() {
            trace!(
                idx,
                begin = entry.begin(),
                end = entry.end(),
                placeholder = entry.is_placeholder(),
                last_touch = entry.last_touch(),
                "cache block"
            );
        }
    }
}

impl std::fmt::Debug for ReadCacheCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadCacheCore")
            .field("entries", &self.entries.len())
            .field("total_bytes", &self.total_bytes)
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

/// Thread-safe read cache shared between reader and completion threads.
///
/// Clones share the same underlying cache. Every operation acquires the
/// single internal mutex for its full duration, making each public call
/// atomic with respect to every other.
///
/// # Example
///
/// ```
/// use rangecache::cache::ReadCache;
///
/// let cache = ReadCache::new(1 << 20);
///
/// // Completion thread delivers a fetched block, donating the buffer.
/// cache.submit(vec![0xAA; 4096], 0, 4095).unwrap();
///
/// // Reader thread satisfies a read from memory.
/// let mut dest = vec![0u8; 4096];
/// let result = cache.lookup(&mut dest, 0, 4095, true);
/// assert_eq!(result.bytes, 4096);
/// assert!(dest.iter().all(|&b| b == 0xAA));
/// ```
#[derive(Clone)]
pub struct ReadCache {
    inner: Arc<Mutex<ReadCacheCore>>,
}

impl ReadCache {
    /// Creates a shared cache with a total data budget of `max_bytes`.
    pub fn new(max_bytes: u64) -> Self {
        ReadCache {
            inner: Arc::new(Mutex::new(ReadCacheCore::new(max_bytes))),
        }
    }

    /// See [`ReadCacheCore::submit`]. Takes ownership of `buffer`
    /// unconditionally; a discarded buffer is released before returning.
    pub fn submit(&self, buffer: Vec<u8>, begin: u64, end: u64) -> Result<bool, CacheError> {
        self.inner.lock().submit(buffer, begin, end)
    }

    /// See [`ReadCacheCore::put_placeholder`].
    ///
    /// # Example
    /// ```
    /// use rangecache::cache::ReadCache;
    ///
    /// let cache = ReadCache::new(1024);
    /// assert_eq!(cache.put_placeholder(0, 99), Ok(true));
    ///
    /// let mut dest = vec![0u8; 100];
    /// let result = cache.lookup(&mut dest, 0, 99, false);
    /// assert_eq!(result.bytes, 0);
    /// assert_eq!(result.outstanding, 1);
    /// assert!(result.missing.is_empty());
    /// ```
    pub fn put_placeholder(&self, begin: u64, end: u64) -> Result<bool, CacheError> {
        self.inner.lock().put_placeholder(begin, end)
    }

    /// See [`ReadCacheCore::lookup`]. The lock is held across the copy.
    pub fn lookup(
        &self,
        dest: &mut [u8],
        begin: u64,
        end: u64,
        count_stats: bool,
    ) -> LookupResult {
        self.inner.lock().lookup(dest, begin, end, count_stats)
    }

    /// See [`ReadCacheCore::remove`]. Used by callers to abandon a timed-out
    /// placeholder so its range stops reporting as outstanding.
    pub fn remove(&self, begin: u64, end: u64) {
        self.inner.lock().remove(begin, end)
    }

    /// See [`ReadCacheCore::evict_lru`].
    pub fn evict_lru(&self) -> Result<u64, CacheError> {
        self.inner.lock().evict_lru()
    }

    /// See [`ReadCacheCore::make_room`].
    pub fn make_room(&self, bytes: u64) -> Result<(), CacheError> {
        self.inner.lock().make_room(bytes)
    }

    /// See [`ReadCacheCore::remove_all`].
    pub fn remove_all(&self) {
        self.inner.lock().remove_all()
    }

    /// See [`ReadCacheCore::remove_placeholders`].
    pub fn remove_placeholders(&self) {
        self.inner.lock().remove_placeholders()
    }

    /// Bytes currently held by data entries.
    pub fn total_bytes(&self) -> u64 {
        self.inner.lock().total_bytes()
    }

    /// Configured capacity ceiling.
    pub fn max_bytes(&self) -> u64 {
        self.inner.lock().max_bytes()
    }

    /// Current number of entries, placeholders included.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Number of placeholder reservations currently registered.
    pub fn placeholder_count(&self) -> usize {
        self.inner.lock().placeholder_count()
    }

    /// Snapshot of the cumulative performance counters.
    pub fn stats(&self) -> ReadCacheStats {
        self.inner.lock().stats()
    }

    /// Emits the current entry list as trace events.
    pub fn log_entries(&self) {
        self.inner.lock().log_entries()
    }
}

impl std::fmt::Debug for ReadCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.inner.lock();
        f.debug_struct("ReadCache")
            .field("entries", &core.len())
            .field("total_bytes", &core.total_bytes())
            .field("max_bytes", &core.max_bytes())
            .finish_non_exhaustive()
    }
}
