//! Hit/miss performance accounting for the read cache.
//!
//! Counters are cumulative for the lifetime of the cache and survive
//! `remove_all`; only `total_bytes` tracks the live entry set. The derived
//! ratios are recomputed whenever their inputs change so a snapshot is always
//! internally consistent.

/// Point-in-time snapshot of the cache performance counters.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ReadCacheStats {
    /// Total bytes ever accepted by `submit`.
    pub bytes_submitted: u64,
    /// Total bytes served to callers out of cached data.
    pub bytes_hit: u64,
    /// Number of stat-counted lookups.
    pub lookups: u64,
    /// Number of stat-counted lookups that were not full hits.
    pub misses: u64,
    /// `bytes_hit / bytes_submitted`; how much of the fetched data was
    /// actually useful. 0.0 before anything is submitted.
    pub usefulness: f64,
    /// `misses / lookups`. 0.0 before any lookup.
    pub miss_rate: f64,
}

/// Internal mutable counters; the engine updates these under its lock.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    bytes_submitted: u64,
    bytes_hit: u64,
    lookups: u64,
    misses: u64,
    usefulness: f64,
    miss_rate: f64,
}

impl StatsCounters {
    pub(crate) fn record_submit(&mut self, bytes: u64) {
        self.bytes_submitted += bytes;
        self.update_derived();
    }

    pub(crate) fn record_lookup(&mut self) {
        self.lookups += 1;
    }

    pub(crate) fn record_hit_bytes(&mut self, bytes: u64) {
        self.bytes_hit += bytes;
        self.update_derived();
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
        self.update_derived();
    }

    fn update_derived(&mut self) {
        self.usefulness = if self.bytes_submitted > 0 {
            self.bytes_hit as f64 / self.bytes_submitted as f64
        } else {
            0.0
        };
        self.miss_rate = if self.lookups > 0 {
            self.misses as f64 / self.lookups as f64
        } else {
            0.0
        };
    }

    pub(crate) fn snapshot(&self) -> ReadCacheStats {
        ReadCacheStats {
            bytes_submitted: self.bytes_submitted,
            bytes_hit: self.bytes_hit,
            lookups: self.lookups,
            misses: self.misses,
            usefulness: self.usefulness,
            miss_rate: self.miss_rate,
        }
    }
}
