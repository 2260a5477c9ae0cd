//! Concurrency guard behavior under `threads = true`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use memoizer::{Kwargs, MemoizeOptions, Memoized};

#[test]
fn test_guard_serializes_computations() {
    let executed = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&executed);

    let memo = Arc::new(
        Memoized::new(
            "threads_serialized",
            MemoizeOptions::default().threads(true),
            move |&(x,): &(u32,), _kw: &Kwargs| {
                seen.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(100));
                x
            },
        )
        .unwrap(),
    );

    let start = Instant::now();
    let handles: Vec<_> = (0..3u32)
        .map(|i| {
            let memo = Arc::clone(&memo);
            thread::spawn(move || memo.call((i,)))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Three distinct keys, one computation at a time: the guard forces the
    // sleeps to run back to back.
    assert!(start.elapsed() >= Duration::from_millis(300));
    assert_eq!(executed.load(Ordering::SeqCst), 3);
    let stats = memo.stats().unwrap();
    assert_eq!(stats.calls(), 3);
    assert_eq!(stats.misses(), 3);
}

#[test]
fn test_guard_blocked_callers_recheck_cache() {
    let executed = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&executed);

    let memo = Arc::new(
        Memoized::new(
            "threads_recheck",
            MemoizeOptions::default().threads(true),
            move |&(x,): &(u32,), _kw: &Kwargs| {
                seen.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(100));
                x * 2
            },
        )
        .unwrap(),
    );

    // Same key from every thread: the first computes, the rest must find
    // the entry when the guard releases.
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let memo = Arc::clone(&memo);
            thread::spawn(move || memo.call((7,)))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 14);
    }

    assert_eq!(executed.load(Ordering::SeqCst), 1);
    let stats = memo.stats().unwrap();
    assert_eq!(stats.calls(), 4);
    assert_eq!(stats.misses(), 1);
}

#[test]
fn test_unguarded_concurrent_calls_stay_consistent() {
    // Without `threads`, concurrent callers may race to compute the same
    // key; the accepted outcome is duplicated work, never a wrong value.
    let executed = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&executed);

    let memo = Arc::new(
        Memoized::new(
            "threads_unguarded",
            MemoizeOptions::default(),
            move |&(x,): &(u32,), _kw: &Kwargs| {
                seen.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(20));
                x + 1
            },
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let memo = Arc::clone(&memo);
            thread::spawn(move || memo.call((41,)))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 42);
    }

    let races = executed.load(Ordering::SeqCst);
    assert!(races >= 1 && races <= 8);
    assert_eq!(memo.cache_len(), 1);
    assert_eq!(memo.stats().unwrap().calls(), 8);

    // Once settled, the entry serves hits.
    let calls_before = memo.stats().unwrap().calls();
    let misses_before = memo.stats().unwrap().misses();
    assert_eq!(memo.call((41,)), 42);
    assert_eq!(memo.stats().unwrap().calls(), calls_before + 1);
    assert_eq!(memo.stats().unwrap().misses(), misses_before);
}
