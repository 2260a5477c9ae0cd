use std::sync::atomic::{AtomicU64, Ordering};

/// Per-wrapper usage counters.
///
/// Every invocation of a memoized callable increments `calls`; every
/// invocation that had to run the underlying computation (cache miss,
/// expired generation, or a call excluded from caching by `ignore_nulls`)
/// additionally increments `misses`. Hits are derived, never stored.
///
/// Counters are monotonically increasing and are never reset: a fresh
/// recorder is created when a wrapper is constructed, and that is the only
/// way to start from zero.
///
/// # Thread Safety
///
/// All operations use atomic counters with `Relaxed` ordering; the recorder
/// carries no synchronization role beyond its own consistency.
///
/// # Examples
///
/// ```
/// use memoizer::MemoStats;
///
/// let stats = MemoStats::new();
/// stats.record_call();
/// stats.record_call();
/// stats.record_miss();
///
/// assert_eq!(stats.calls(), 2);
/// assert_eq!(stats.misses(), 1);
/// assert_eq!(stats.hits(), 1);
/// assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Default)]
pub struct MemoStats {
    calls: AtomicU64,
    misses: AtomicU64,
}

impl MemoStats {
    /// Creates a recorder with zeroed counters.
    pub fn new() -> Self {
        Self {
            calls: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Records one invocation of the wrapped callable.
    #[inline]
    pub fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one execution of the underlying computation.
    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Total invocations observed.
    #[inline]
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Total underlying executions observed.
    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Invocations served from cache, derived as `calls - misses`.
    ///
    /// The two counters are read independently, so under concurrent updates
    /// the difference is a snapshot, clamped at zero.
    #[inline]
    pub fn hits(&self) -> u64 {
        self.calls().saturating_sub(self.misses())
    }

    /// Fraction of invocations served from cache, in `0.0..=1.0`.
    ///
    /// Returns `0.0` before the first invocation.
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let calls = self.calls();
        if calls == 0 {
            0.0
        } else {
            self.hits() as f64 / calls as f64
        }
    }
}

impl Clone for MemoStats {
    fn clone(&self) -> Self {
        Self {
            calls: AtomicU64::new(self.calls()),
            misses: AtomicU64::new(self.misses()),
        }
    }
}
