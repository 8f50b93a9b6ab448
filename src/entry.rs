//! Cache entry: an immutable-interval record of fetched data or an in-flight
//! reservation.
//!
//! ## Key Components
//!
//! | Component                  | Description                                   |
//! |----------------------------|-----------------------------------------------|
//! | `CacheEntry` (data)        | Owns the fetched bytes for `[begin, end]`     |
//! | `CacheEntry` (placeholder) | Marks `[begin, end]` as requested, no buffer  |
//! | `last_touch`               | Logical LRU tick, bumped when a read is served|
//!
//! A data entry exclusively owns its buffer; the buffer is released exactly
//! when the entry is dropped (eviction, removal, engine teardown). A
//! placeholder never owns a buffer and is never touched, so it can never be
//! chosen as an LRU eviction victim.

use crate::error::CacheError;
use crate::range::ByteRange;

/// A stored interval: either real cached data or a placeholder reservation
/// for a read that is still in flight.
pub struct CacheEntry {
    range: ByteRange,
    /// `None` marks a placeholder. Invariant: placeholders own no buffer.
    data: Option<Vec<u8>>,
    last_touch: u64,
}

impl CacheEntry {
    /// Creates a data entry owning `buffer` for the interval `[begin, end]`.
    ///
    /// Fails with [`CacheError::InvalidRange`] when `begin > end` or when the
    /// buffer does not cover the interval exactly.
    ///
    /// # Example
    /// ```
    /// use rangecache::entry::CacheEntry;
    ///
    /// let entry = CacheEntry::new_data(vec![0xAB; 10], 0, 9, 1).unwrap();
    /// assert_eq!(entry.size(), 10);
    /// assert!(!entry.is_placeholder());
    ///
    /// assert!(CacheEntry::new_data(vec![0; 4], 10, 3, 1).is_err());
    /// ```
    pub fn new_data(buffer: Vec<u8>, begin: u64, end: u64, tick: u64) -> Result<Self, CacheError> {
        if begin > end || buffer.len() as u64 != end - begin + 1 {
            return Err(CacheError::InvalidRange { begin, end });
        }
        Ok(CacheEntry {
            range: ByteRange::new(begin, end),
            data: Some(buffer),
            last_touch: tick,
        })
    }

    /// Creates a placeholder reserving `[begin, end]` for an in-flight read.
    ///
    /// Fails with [`CacheError::InvalidRange`] when `begin > end`.
    pub fn new_placeholder(begin: u64, end: u64, tick: u64) -> Result<Self, CacheError> {
        if begin > end {
            return Err(CacheError::InvalidRange { begin, end });
        }
        Ok(CacheEntry {
            range: ByteRange::new(begin, end),
            data: None,
            last_touch: tick,
        })
    }

    /// True for a placeholder reservation, false for real data.
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.data.is_none()
    }

    /// First byte offset covered by this entry.
    #[inline]
    pub fn begin(&self) -> u64 {
        self.range.begin
    }

    /// Last byte offset covered by this entry (inclusive).
    #[inline]
    pub fn end(&self) -> u64 {
        self.range.end
    }

    /// The interval covered by this entry.
    #[inline]
    pub fn range(&self) -> ByteRange {
        self.range
    }

    /// Bytes held by this entry: the buffer size for data, 0 for a
    /// placeholder. Placeholders never count against the byte budget.
    #[inline]
    pub fn size(&self) -> u64 {
        self.data.as_ref().map_or(0, |b| b.len() as u64)
    }

    /// Logical tick of the last read served from this entry.
    #[inline]
    pub fn last_touch(&self) -> u64 {
        self.last_touch
    }

    /// Marks the entry as used at `tick` for LRU ordering.
    ///
    /// Never called on placeholders in practice; they are not eviction
    /// candidates.
    #[inline]
    pub fn touch(&mut self, tick: u64) {
        self.last_touch = tick;
    }

    /// True if this entry's interval fully contains `range`.
    #[inline]
    pub fn contains(&self, range: ByteRange) -> bool {
        self.range.contains_range(range)
    }

    /// True if this entry's interval lies fully inside `range`.
    #[inline]
    pub fn is_contained_in(&self, range: ByteRange) -> bool {
        range.contains_range(self.range)
    }

    /// Length of the intersection between this entry and `range`, 0 when
    /// disjoint. This is the probe form of [`copy_overlap`]: it measures
    /// coverage (for both kinds of entry) without materializing any bytes.
    ///
    /// [`copy_overlap`]: CacheEntry::copy_overlap
    #[inline]
    pub fn overlap_len(&self, range: ByteRange) -> u64 {
        self.range.overlap_len(range)
    }

    /// Copies the bytes this entry holds for `range` into `dest` and returns
    /// the count copied.
    ///
    /// The copy lands at the offset of the intersection relative to
    /// `range.begin`, so `dest` is addressed as if it started at
    /// `range.begin`. Returns 0 for a placeholder or a disjoint range.
    ///
    /// # Panics
    ///
    /// Panics if `dest` is too short to hold the intersection at its relative
    /// offset; callers size `dest` to cover `range`.
    pub fn copy_overlap(&self, dest: &mut [u8], range: ByteRange) -> u64 {
        let Some(buffer) = self.data.as_ref() else {
            return 0;
        };
        let Some(isect) = self.range.intersect(range) else {
            return 0;
        };
        let src_start = (isect.begin - self.range.begin) as usize;
        let src_end = src_start + isect.len() as usize;
        let dst_start = (isect.begin - range.begin) as usize;
        let dst_end = dst_start + isect.len() as usize;
        dest[dst_start..dst_end].copy_from_slice(&buffer[src_start..src_end]);
        isect.len()
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("range", &self.range)
            .field("placeholder", &self.is_placeholder())
            .field("last_touch", &self.last_touch)
            .finish_non_exhaustive()
    }
}
