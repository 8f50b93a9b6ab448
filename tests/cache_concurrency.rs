//! Multi-threaded exercises of the shared `ReadCache` wrapper: reader and
//! completion threads hammering one cache, reservation races, eviction under
//! pressure. Assertions stick to invariants that hold for every interleaving.

use std::thread;

use rangecache::prelude::*;

fn block(byte: u8, begin: u64, end: u64) -> Vec<u8> {
    vec![byte; (end - begin + 1) as usize]
}

#[test]
fn disjoint_submitters_all_land() {
    const THREADS: u64 = 8;
    const BLOCKS_PER_THREAD: u64 = 32;
    const BLOCK_LEN: u64 = 256;

    let cache = ReadCache::new(1 << 24);
    let mut handles = Vec::new();
    for t in 0..THREADS {
        let cache = cache.clone();
        handles.push(thread::spawn(move || {
            for i in 0..BLOCKS_PER_THREAD {
                let begin = (t * BLOCKS_PER_THREAD + i) * BLOCK_LEN;
                let end = begin + BLOCK_LEN - 1;
                assert_eq!(cache.submit(block(t as u8, begin, end), begin, end), Ok(true));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Every block is present and readable with its writer's fill byte.
    assert_eq!(cache.total_bytes(), THREADS * BLOCKS_PER_THREAD * BLOCK_LEN);
    let mut dest = vec![0u8; BLOCK_LEN as usize];
    for t in 0..THREADS {
        for i in 0..BLOCKS_PER_THREAD {
            let begin = (t * BLOCKS_PER_THREAD + i) * BLOCK_LEN;
            let end = begin + BLOCK_LEN - 1;
            let result = cache.lookup(&mut dest, begin, end, false);
            assert_eq!(result.bytes, BLOCK_LEN);
            assert!(dest.iter().all(|&b| b == t as u8));
        }
    }
}

#[test]
fn reservation_race_has_one_winner() {
    const THREADS: usize = 8;

    let cache = ReadCache::new(1 << 20);
    let mut handles = Vec::new();
    for _ in 0..THREADS {
        let cache = cache.clone();
        handles.push(thread::spawn(move || {
            cache.put_placeholder(0, 65535).unwrap()
        }));
    }
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&won| won)
        .count();

    // Exactly one thread reserved the range; the rest saw it covered.
    assert_eq!(winners, 1);
    assert_eq!(cache.placeholder_count(), 1);
}

#[test]
fn budget_holds_under_concurrent_eviction_pressure() {
    const THREADS: u64 = 4;
    const ROUNDS: u64 = 64;
    const BLOCK_LEN: u64 = 128;
    const MAX_BYTES: u64 = 1024;

    let cache = ReadCache::new(MAX_BYTES);
    let mut handles = Vec::new();
    for t in 0..THREADS {
        let cache = cache.clone();
        handles.push(thread::spawn(move || {
            let mut dest = vec![0u8; BLOCK_LEN as usize];
            for i in 0..ROUNDS {
                let begin = ((t * ROUNDS + i) % 512) * BLOCK_LEN;
                let end = begin + BLOCK_LEN - 1;
                cache.submit(block(t as u8, begin, end), begin, end).unwrap();
                cache.lookup(&mut dest, begin, end, true);
                assert!(cache.total_bytes() <= MAX_BYTES);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.total_bytes() <= MAX_BYTES);
    let stats = cache.stats();
    assert_eq!(stats.bytes_submitted, THREADS * ROUNDS * BLOCK_LEN);
    assert_eq!(stats.lookups, THREADS * ROUNDS);
}

#[test]
fn readers_and_completions_interleave() {
    const RANGE_END: u64 = 8191;

    let cache = ReadCache::new(1 << 20);

    let completer = {
        let cache = cache.clone();
        thread::spawn(move || {
            for chunk in 0..8u64 {
                let begin = chunk * 1024;
                let end = begin + 1023;
                cache.put_placeholder(begin, end).unwrap();
                cache.submit(block(chunk as u8, begin, end), begin, end).unwrap();
            }
        })
    };

    let reader = {
        let cache = cache.clone();
        thread::spawn(move || {
            let mut dest = vec![0u8; (RANGE_END + 1) as usize];
            loop {
                let result = cache.lookup(&mut dest, 0, RANGE_END, false);
                // Whatever is served is always a prefix of the request.
                assert!(result.bytes <= RANGE_END + 1);
                if result.bytes == RANGE_END + 1 {
                    for chunk in 0..8u64 {
                        let start = (chunk * 1024) as usize;
                        assert!(dest[start..start + 1024].iter().all(|&b| b == chunk as u8));
                    }
                    break;
                }
                thread::yield_now();
            }
        })
    };

    completer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(cache.placeholder_count(), 0);
}
