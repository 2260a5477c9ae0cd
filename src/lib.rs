//! # Memoizer
//!
//! A memoizing cache decorator: wrap a callable once and every subsequent
//! call is transparently cached, keyed by its arguments.
//!
//! ## Features
//!
//! - **LRU eviction** by entry count (`max_size`) or by estimated payload
//!   size (`max_bytes`), pluggable through [`MemoryEstimator`]
//! - **Generation-based TTL**: an `until` function names the next expiry
//!   instant; crossing it invalidates the whole store at once
//! - **Per-instance scoping** via [`MemoizedMethod`]: each instance gets a
//!   private store, independently clearable, with shared statistics
//! - **Optional serialization**: `threads` runs consult-or-compute under a
//!   wrapper-wide lock so at most one computation proceeds at a time
//! - **Statistics**: per-wrapper call/miss counters, aggregated into a
//!   process-wide [`registry`] with tabular and CSV reports
//! - **Result-aware**: `try_call` caches only `Ok` values and propagates
//!   errors unchanged
//!
//! ## Quick Start
//!
//! ```
//! use memoizer::{Kwargs, Memoized, MemoizeOptions};
//!
//! let fib = Memoized::new(
//!     "fib_step",
//!     MemoizeOptions::default().max_size(128),
//!     |&(a, b): &(u64, u64), _kw: &Kwargs| a + b,
//! )
//! .unwrap();
//!
//! assert_eq!(fib.call((3, 5)), 8);
//! assert_eq!(fib.call((3, 5)), 8); // served from cache
//!
//! let stats = fib.stats().unwrap();
//! assert_eq!(stats.calls(), 2);
//! assert_eq!(stats.misses(), 1);
//! ```
//!
//! ## Keyword Arguments
//!
//! Calls can carry named arguments through [`Kwargs`]; they participate in
//! the cache key in name order (so supplying them in a different order hits
//! the same entry), unless the wrapper sets `disable_kw`:
//!
//! ```
//! use memoizer::{kwargs, Kwargs, Memoized, MemoizeOptions};
//!
//! let greet = Memoized::new(
//!     "greet",
//!     MemoizeOptions::default(),
//!     |&(name,): &(&str,), kw: &Kwargs| {
//!         format!("{} ({:?})", name, kw.get("tone"))
//!     },
//! )
//! .unwrap();
//!
//! greet.call_kw(("ada",), &kwargs! { tone = "warm" });
//! greet.call_kw(("ada",), &kwargs! { tone = "warm" }); // hit
//! assert_eq!(greet.stats().unwrap().misses(), 1);
//! ```
//!
//! ## Observability
//!
//! Every non-disabled wrapper registers its counters under its name; the
//! registry renders live reports on demand:
//!
//! ```
//! let table = memoizer::registry::format_table();
//! let csv = memoizer::registry::format_csv();
//! assert!(csv.starts_with("name,calls,misses,hits,hit_rate"));
//! # let _ = table;
//! ```
//!
//! ## Module Organization
//!
//! - [`options`] - flat configuration with eager validation
//! - [`keys`] - cache key construction from positional and keyword args
//! - `store` - the LRU store with count and byte budgets
//! - `memory_estimator` - payload-size estimation strategy
//! - `memoized` - the decorator wrappers
//! - `stats` / [`registry`] - counters and process-wide reporting

mod entry;
mod error;
mod memoized;
mod memory_estimator;
mod stats;
mod store;

pub mod keys;
pub mod options;
pub mod registry;

pub use entry::CacheEntry;
pub use error::ConfigError;
pub use keys::{build_key, CacheableKey, CallArgs, Kwargs, NullProbe};
pub use memoized::{Memoized, MemoizedMethod};
pub use memory_estimator::MemoryEstimator;
pub use options::{ExpiryFn, MemoizeOptions, OptionValue};
pub use stats::MemoStats;
pub use store::LruStore;
