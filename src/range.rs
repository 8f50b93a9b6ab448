//! Inclusive byte-range interval type shared by cache entries and the engine.
//!
//! A [`ByteRange`] covers `[begin, end]` with both endpoints included, so the
//! smallest representable range is a single byte. Lookup results use it to
//! describe the holes a caller still has to fetch remotely.

use std::fmt;

/// An inclusive interval of byte offsets within a remote file.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// First byte offset covered by the range.
    pub begin: u64,
    /// Last byte offset covered by the range (inclusive).
    pub end: u64,
}

impl ByteRange {
    /// Creates a range covering `[begin, end]`.
    ///
    /// # Example
    /// ```
    /// use rangecache::range::ByteRange;
    ///
    /// let r = ByteRange::new(10, 19);
    /// assert_eq!(r.len(), 10);
    /// ```
    #[inline]
    pub fn new(begin: u64, end: u64) -> Self {
        debug_assert!(begin <= end, "ByteRange requires begin <= end");
        ByteRange { begin, end }
    }

    /// Number of bytes covered. Never zero for a well-formed range.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.begin + 1
    }

    /// True if `offset` falls inside this range.
    #[inline]
    pub fn contains_offset(&self, offset: u64) -> bool {
        self.begin <= offset && offset <= self.end
    }

    /// True if `other` lies entirely inside this range.
    #[inline]
    pub fn contains_range(&self, other: ByteRange) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    /// Intersection with `other`, or `None` when the ranges are disjoint.
    ///
    /// # Example
    /// ```
    /// use rangecache::range::ByteRange;
    ///
    /// let a = ByteRange::new(0, 49);
    /// let b = ByteRange::new(40, 99);
    /// assert_eq!(a.intersect(b), Some(ByteRange::new(40, 49)));
    /// assert_eq!(a.intersect(ByteRange::new(50, 99)), None);
    /// ```
    #[inline]
    pub fn intersect(&self, other: ByteRange) -> Option<ByteRange> {
        let begin = self.begin.max(other.begin);
        let end = self.end.min(other.end);
        (begin <= end).then_some(ByteRange { begin, end })
    }

    /// Length of the intersection with `other`, 0 when disjoint.
    #[inline]
    pub fn overlap_len(&self, other: ByteRange) -> u64 {
        self.intersect(other).map_or(0, |r| r.len())
    }
}

impl fmt::Debug for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.begin, self.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.begin, self.end)
    }
}
