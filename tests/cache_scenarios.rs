//! End-to-end scenarios driving the cache the way a remote-file client does:
//! lookup misses, placeholder reservations, block delivery, eviction churn.

use rangecache::prelude::*;

fn block(byte: u8, begin: u64, end: u64) -> Vec<u8> {
    vec![byte; (end - begin + 1) as usize]
}

/// The full protocol round trip: miss, reserve, fetch, deliver, hit.
#[test]
fn read_protocol_round_trip() {
    let cache = ReadCache::new(1 << 20);
    let mut dest = vec![0u8; 4096];

    // First read misses entirely; the whole range must be fetched.
    let result = cache.lookup(&mut dest, 0, 4095, true);
    assert_eq!(result.bytes, 0);
    assert_eq!(result.missing, vec![ByteRange::new(0, 4095)]);
    assert_eq!(result.outstanding, 0);

    // The reader reserves each missing range before requesting it remotely.
    for hole in &result.missing {
        assert_eq!(cache.put_placeholder(hole.begin, hole.end), Ok(true));
    }

    // A second reader arriving meanwhile sees the range outstanding and
    // knows not to request it again.
    let peer = cache.lookup(&mut dest, 0, 4095, true);
    assert_eq!(peer.bytes, 0);
    assert!(peer.missing.is_empty());
    assert_eq!(peer.outstanding, 1);

    // The completion thread delivers the block, replacing the placeholder.
    assert_eq!(cache.submit(block(0x5A, 0, 4095), 0, 4095), Ok(true));
    assert_eq!(cache.placeholder_count(), 0);

    let result = cache.lookup(&mut dest, 0, 4095, true);
    assert_eq!(result.bytes, 4096);
    assert!(dest.iter().all(|&b| b == 0x5A));

    let stats = cache.stats();
    assert_eq!(stats.lookups, 3);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.bytes_submitted, 4096);
    assert_eq!(stats.bytes_hit, 4096);
}

/// A block arriving in two halves: the first half is served as a prefix
/// while the second is still outstanding.
#[test]
fn partial_delivery_serves_prefix() {
    let cache = ReadCache::new(1 << 20);
    cache.put_placeholder(0, 99).unwrap();
    cache.submit(block(1, 0, 49), 0, 49).unwrap();

    let mut dest = vec![0u8; 100];
    let result = cache.lookup(&mut dest, 0, 99, true);
    assert_eq!(result.bytes, 50);
    assert!(result.missing.is_empty());
    assert_eq!(result.outstanding, 1);

    cache.submit(block(2, 50, 99), 50, 99).unwrap();
    let result = cache.lookup(&mut dest, 0, 99, true);
    assert_eq!(result.bytes, 100);
    assert_eq!(&dest[..50], &[1u8; 50]);
    assert_eq!(&dest[50..], &[2u8; 50]);
}

/// Abandoning a timed-out read: removing the range clears the reservation so
/// the next lookup reports a hole instead of an outstanding block.
#[test]
fn abandoned_placeholder_becomes_missing_again() {
    let cache = ReadCache::new(1 << 20);
    cache.put_placeholder(1000, 1999).unwrap();

    let mut dest = vec![0u8; 1000];
    assert_eq!(cache.lookup(&mut dest, 1000, 1999, false).outstanding, 1);

    cache.remove(1000, 1999);
    let result = cache.lookup(&mut dest, 1000, 1999, false);
    assert_eq!(result.outstanding, 0);
    assert_eq!(result.missing, vec![ByteRange::new(1000, 1999)]);
}

/// Readahead past what the reader consumes: the cache keeps hot blocks and
/// evicts the stale readahead under pressure.
#[test]
fn readahead_churn_respects_budget() {
    let cache = ReadCache::new(1000);
    let mut dest = vec![0u8; 100];

    for i in 0..50u64 {
        let begin = i * 100;
        let end = begin + 99;
        cache.submit(block(i as u8, begin, end), begin, end).unwrap();
        // Keep the first block hot.
        cache.lookup(&mut dest, 0, 99, false);
        assert!(cache.total_bytes() <= cache.max_bytes());
    }

    // The hot block survived fifty rounds of eviction pressure.
    let result = cache.lookup(&mut dest, 0, 99, false);
    assert_eq!(result.bytes, 100);
    assert!(dest.iter().all(|&b| b == 0));
    assert_eq!(cache.total_bytes(), 1000);
}

/// Scattered blocks produce an ordered hole list covering exactly the gaps.
#[test]
fn sparse_file_hole_classification() {
    let cache = ReadCache::new(1 << 20);
    cache.submit(block(1, 100, 199), 100, 199).unwrap();
    cache.submit(block(2, 400, 499), 400, 499).unwrap();
    cache.put_placeholder(600, 699).unwrap();

    let mut dest = vec![0u8; 1000];
    let result = cache.lookup(&mut dest, 0, 999, false);
    assert_eq!(result.bytes, 0);
    assert_eq!(
        result.missing,
        vec![
            ByteRange::new(0, 99),
            ByteRange::new(200, 399),
            ByteRange::new(500, 599),
            ByteRange::new(700, 999),
        ]
    );
    assert_eq!(result.outstanding, 1);
}

/// Disconnect handling: dropping every reservation leaves data intact.
#[test]
fn disconnect_clears_reservations_only() {
    let cache = ReadCache::new(1 << 20);
    cache.submit(block(1, 0, 4095), 0, 4095).unwrap();
    cache.put_placeholder(8192, 12287).unwrap();
    cache.put_placeholder(16384, 20479).unwrap();

    cache.remove_placeholders();
    assert_eq!(cache.placeholder_count(), 0);

    let mut dest = vec![0u8; 4096];
    assert_eq!(cache.lookup(&mut dest, 0, 4095, false).bytes, 4096);
}

/// A file-close wipe empties the cache but keeps lifetime counters.
#[test]
fn remove_all_then_reuse() {
    let cache = ReadCache::new(1 << 20);
    cache.submit(block(1, 0, 1023), 0, 1023).unwrap();
    let mut dest = vec![0u8; 1024];
    cache.lookup(&mut dest, 0, 1023, true);

    cache.remove_all();
    assert!(cache.is_empty());
    assert_eq!(cache.total_bytes(), 0);
    assert_eq!(cache.stats().bytes_submitted, 1024);

    // The cache is immediately usable again.
    cache.submit(block(2, 0, 1023), 0, 1023).unwrap();
    assert_eq!(cache.lookup(&mut dest, 0, 1023, true).bytes, 1024);
}
