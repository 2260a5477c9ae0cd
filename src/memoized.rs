use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use parking_lot::Mutex;

use crate::keys::build_key;
use crate::registry;
use crate::{CallArgs, ConfigError, Kwargs, LruStore, MemoStats, MemoizeOptions, MemoryEstimator};

/// A memoizing wrapper around a free callable.
///
/// Wraps `f: Fn(&A, &Kwargs) -> R` and transparently caches its results
/// keyed by the call arguments. `A` is the positional-argument tuple, and
/// callables that take no keyword arguments simply ignore the [`Kwargs`]
/// parameter.
///
/// Construction registers the wrapper's stats recorder with the global
/// [`registry`] (unless `disabled`) and eagerly validates the options; a
/// misconfigured wrapper is a [`ConfigError`], never a half-built cache.
///
/// # Concurrency
///
/// Without `threads`, internal locks protect only the store's integrity:
/// two threads can miss on the same key simultaneously and both run the
/// computation, with the last insert winning. With `threads`, the whole
/// consult-or-compute sequence runs under a wrapper-wide mutex, so at most
/// one execution of the wrapped callable proceeds at a time.
///
/// # Examples
///
/// ```
/// use memoizer::{Kwargs, Memoized, MemoizeOptions};
///
/// let double = Memoized::new("double", MemoizeOptions::default().max_size(64), |&(x,): &(i32,), _kw: &Kwargs| {
///     x * 2
/// })
/// .unwrap();
///
/// assert_eq!(double.call((21,)), 42);
/// assert_eq!(double.call((21,)), 42); // cache hit
/// let stats = double.stats().unwrap();
/// assert_eq!(stats.calls(), 2);
/// assert_eq!(stats.misses(), 1);
/// ```
pub struct Memoized<A, R, F> {
    name: String,
    opts: MemoizeOptions,
    func: F,
    state: Option<Mutex<MemoState<R>>>,
    guard: Option<Mutex<()>>,
    stats: Option<Arc<MemoStats>>,
    _args: PhantomData<fn(&A)>,
}

struct MemoState<R> {
    store: LruStore<R>,
    next_expiry: Option<Instant>,
}

impl<A, R, F> std::fmt::Debug for Memoized<A, R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("name", &self.name)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl<A, R, F> Memoized<A, R, F>
where
    A: CallArgs,
    R: Clone + MemoryEstimator,
    F: Fn(&A, &Kwargs) -> R,
{
    /// Wraps `func` under `name` with the given options.
    ///
    /// Fails fast on invalid configuration. `obj` scoping belongs to
    /// [`MemoizedMethod`]; requesting it here is a configuration error.
    pub fn new(
        name: impl Into<String>,
        opts: MemoizeOptions,
        func: F,
    ) -> Result<Self, ConfigError> {
        opts.validate()?;
        if opts.obj {
            return Err(ConfigError::invalid(
                "obj",
                "instance scoping requires MemoizedMethod",
            ));
        }
        let name = name.into();

        if opts.disabled {
            return Ok(Self {
                name,
                opts,
                func,
                state: None,
                guard: None,
                stats: None,
                _args: PhantomData,
            });
        }

        let stats = Arc::new(MemoStats::new());
        registry::register(&name, Arc::clone(&stats));

        let next_expiry = opts.until.as_ref().map(|until| until());
        let state = Mutex::new(MemoState {
            store: LruStore::new(opts.max_size, opts.max_bytes),
            next_expiry,
        });
        let guard = if opts.threads {
            Some(Mutex::new(()))
        } else {
            None
        };

        Ok(Self {
            name,
            opts,
            func,
            state: Some(state),
            guard,
            stats: Some(stats),
            _args: PhantomData,
        })
    }

    /// Invokes the wrapped callable with positional arguments only.
    pub fn call(&self, args: A) -> R {
        self.call_kw(args, &Kwargs::new())
    }

    /// Invokes the wrapped callable with positional and keyword arguments.
    pub fn call_kw(&self, args: A, kwargs: &Kwargs) -> R {
        let stats = match &self.stats {
            Some(stats) => stats,
            // Disabled wrappers pass every call straight through.
            None => return (self.func)(&args, kwargs),
        };
        stats.record_call();

        if self.opts.ignore_nulls && args.first_is_null() {
            stats.record_miss();
            if self.opts.verbose {
                debug!(target: "memoizer", "{}: uncacheable call (null first arg)", self.name);
            }
            return (self.func)(&args, kwargs);
        }

        let key = build_key(&args, kwargs, self.opts.disable_kw);
        let _serial = self.guard.as_ref().map(|guard| guard.lock());

        if let Some(hit) = self.lookup(&key) {
            if self.opts.verbose {
                debug!(target: "memoizer", "{}: hit key={}", self.name, key);
            }
            return hit;
        }

        stats.record_miss();
        if self.opts.verbose {
            debug!(target: "memoizer", "{}: miss key={}", self.name, key);
        }
        let value = (self.func)(&args, kwargs);
        self.store_value(key, value.clone());
        value
    }

    fn lookup(&self, key: &str) -> Option<R> {
        let state = self.state.as_ref()?;
        let mut st = state.lock();
        if let (Some(until), Some(deadline)) = (self.opts.until.as_ref(), st.next_expiry) {
            if Instant::now() >= deadline {
                // Crossing the expiry instant invalidates the whole
                // generation, not individual entries.
                st.store.clear();
                st.next_expiry = Some(until());
            }
        }
        st.store.get(key).cloned()
    }

    fn store_value(&self, key: String, value: R) {
        let state = match &self.state {
            Some(state) => state,
            None => return,
        };
        let bytes = self
            .opts
            .max_bytes
            .map(|_| value.estimate_memory())
            .unwrap_or(0);
        state.lock().store.insert(key, value, bytes);
    }

    /// The name this wrapper registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapper's stats recorder, `None` when `disabled`.
    pub fn stats(&self) -> Option<Arc<MemoStats>> {
        self.stats.as_ref().map(Arc::clone)
    }

    /// Number of currently cached entries. Zero when `disabled`.
    pub fn cache_len(&self) -> usize {
        self.state
            .as_ref()
            .map(|state| state.lock().store.len())
            .unwrap_or(0)
    }

    /// Cumulative estimated size of cached entries. Zero unless `max_bytes`
    /// is configured.
    pub fn cache_bytes(&self) -> usize {
        self.state
            .as_ref()
            .map(|state| state.lock().store.current_bytes())
            .unwrap_or(0)
    }

    /// Drops every cached entry. Statistics are unaffected.
    pub fn clear(&self) {
        if let Some(state) = &self.state {
            state.lock().store.clear();
        }
    }

    /// True when the wrapper was constructed with `disabled`.
    pub fn is_disabled(&self) -> bool {
        self.state.is_none()
    }
}

impl<A, T, E, F> Memoized<A, Result<T, E>, F>
where
    A: CallArgs,
    T: Clone + MemoryEstimator,
    E: Clone + MemoryEstimator,
    F: Fn(&A, &Kwargs) -> Result<T, E>,
{
    /// [`call`](Self::call) for fallible computations: errors propagate
    /// unchanged and are never cached.
    pub fn try_call(&self, args: A) -> Result<T, E> {
        self.try_call_kw(args, &Kwargs::new())
    }

    /// [`call_kw`](Self::call_kw) for fallible computations.
    ///
    /// The call and miss are counted before the computation runs, so
    /// error-producing calls stay visible in the statistics; only `Ok`
    /// results are stored.
    pub fn try_call_kw(&self, args: A, kwargs: &Kwargs) -> Result<T, E> {
        let stats = match &self.stats {
            Some(stats) => stats,
            None => return (self.func)(&args, kwargs),
        };
        stats.record_call();

        if self.opts.ignore_nulls && args.first_is_null() {
            stats.record_miss();
            return (self.func)(&args, kwargs);
        }

        let key = build_key(&args, kwargs, self.opts.disable_kw);
        let _serial = self.guard.as_ref().map(|guard| guard.lock());

        if let Some(hit) = self.lookup(&key) {
            if self.opts.verbose {
                debug!(target: "memoizer", "{}: hit key={}", self.name, key);
            }
            return hit;
        }

        stats.record_miss();
        let result = (self.func)(&args, kwargs);
        if result.is_ok() {
            self.store_value(key, result.clone());
        }
        result
    }
}

/// A memoizing wrapper around an instance method.
///
/// Wraps `f: Fn(&T, &A, &Kwargs) -> R`, where the first argument is the
/// owning instance. The instance selects a private per-instance cache store
/// (created lazily on the instance's first call) and is excluded from the
/// cache key; statistics stay aggregated across all instances.
///
/// Instance identity is the instance's address, so callers must go through
/// a reference that stays stable for as long as its cached entries should
/// be reachable. The side-table lives entirely inside the wrapper; the
/// instances themselves are never touched.
///
/// # Examples
///
/// ```
/// use memoizer::{Kwargs, MemoizedMethod, MemoizeOptions};
///
/// struct Sensor {
///     offset: i32,
/// }
///
/// let read = MemoizedMethod::new(
///     "sensor_read",
///     MemoizeOptions::default().obj(true),
///     |sensor: &Sensor, &(raw,): &(i32,), _kw: &Kwargs| raw + sensor.offset,
/// )
/// .unwrap();
///
/// let a = Sensor { offset: 10 };
/// let b = Sensor { offset: 20 };
/// assert_eq!(read.call_on(&a, (1,)), 11);
/// assert_eq!(read.call_on(&b, (1,)), 21); // separate store, separate miss
/// assert_eq!(read.stats().unwrap().misses(), 2);
/// ```
pub struct MemoizedMethod<T, A, R, F> {
    name: String,
    opts: MemoizeOptions,
    func: F,
    state: Option<Mutex<MethodState<R>>>,
    guard: Option<Mutex<()>>,
    stats: Option<Arc<MemoStats>>,
    _args: PhantomData<fn(&T, &A)>,
}

struct MethodState<R> {
    stores: HashMap<usize, LruStore<R>>,
    next_expiry: Option<Instant>,
}

impl<T, A, R, F> std::fmt::Debug for MemoizedMethod<T, A, R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoizedMethod")
            .field("name", &self.name)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

fn instance_token<T>(instance: &T) -> usize {
    instance as *const T as usize
}

impl<T, A, R, F> MemoizedMethod<T, A, R, F>
where
    A: CallArgs,
    R: Clone + MemoryEstimator,
    F: Fn(&T, &A, &Kwargs) -> R,
{
    /// Wraps `func` under `name` with the given options.
    ///
    /// Instance scoping is this type's whole purpose, so `obj` must be set;
    /// leaving it off is a configuration error pointing at [`Memoized`].
    pub fn new(
        name: impl Into<String>,
        opts: MemoizeOptions,
        func: F,
    ) -> Result<Self, ConfigError> {
        opts.validate()?;
        if !opts.obj {
            return Err(ConfigError::invalid(
                "obj",
                "MemoizedMethod requires instance scoping; use Memoized instead",
            ));
        }
        let name = name.into();

        if opts.disabled {
            return Ok(Self {
                name,
                opts,
                func,
                state: None,
                guard: None,
                stats: None,
                _args: PhantomData,
            });
        }

        let stats = Arc::new(MemoStats::new());
        registry::register(&name, Arc::clone(&stats));

        let next_expiry = opts.until.as_ref().map(|until| until());
        let state = Mutex::new(MethodState {
            stores: HashMap::new(),
            next_expiry,
        });
        let guard = if opts.threads {
            Some(Mutex::new(()))
        } else {
            None
        };

        Ok(Self {
            name,
            opts,
            func,
            state: Some(state),
            guard,
            stats: Some(stats),
            _args: PhantomData,
        })
    }

    /// Invokes the wrapped method on `instance` with positional arguments.
    pub fn call_on(&self, instance: &T, args: A) -> R {
        self.call_on_kw(instance, args, &Kwargs::new())
    }

    /// Invokes the wrapped method on `instance` with positional and keyword
    /// arguments.
    pub fn call_on_kw(&self, instance: &T, args: A, kwargs: &Kwargs) -> R {
        let stats = match &self.stats {
            Some(stats) => stats,
            None => return (self.func)(instance, &args, kwargs),
        };
        stats.record_call();

        if self.opts.ignore_nulls && args.first_is_null() {
            stats.record_miss();
            if self.opts.verbose {
                debug!(target: "memoizer", "{}: uncacheable call (null first arg)", self.name);
            }
            return (self.func)(instance, &args, kwargs);
        }

        let token = instance_token(instance);
        let key = build_key(&args, kwargs, self.opts.disable_kw);
        let _serial = self.guard.as_ref().map(|guard| guard.lock());

        if let Some(hit) = self.lookup(token, &key) {
            if self.opts.verbose {
                debug!(target: "memoizer", "{}: hit instance={:#x} key={}", self.name, token, key);
            }
            return hit;
        }

        stats.record_miss();
        if self.opts.verbose {
            debug!(target: "memoizer", "{}: miss instance={:#x} key={}", self.name, token, key);
        }
        let value = (self.func)(instance, &args, kwargs);
        self.store_value(token, key, value.clone());
        value
    }

    fn lookup(&self, token: usize, key: &str) -> Option<R> {
        let state = self.state.as_ref()?;
        let mut st = state.lock();
        if let (Some(until), Some(deadline)) = (self.opts.until.as_ref(), st.next_expiry) {
            if Instant::now() >= deadline {
                // Generation expiry invalidates every instance's store.
                st.stores.clear();
                st.next_expiry = Some(until());
            }
        }
        st.stores.get_mut(&token).and_then(|store| store.get(key)).cloned()
    }

    fn store_value(&self, token: usize, key: String, value: R) {
        let state = match &self.state {
            Some(state) => state,
            None => return,
        };
        let bytes = self
            .opts
            .max_bytes
            .map(|_| value.estimate_memory())
            .unwrap_or(0);
        let mut st = state.lock();
        let store = st
            .stores
            .entry(token)
            .or_insert_with(|| LruStore::new(self.opts.max_size, self.opts.max_bytes));
        store.insert(key, value, bytes);
    }

    /// The name this wrapper registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapper's aggregate stats recorder, `None` when `disabled`.
    pub fn stats(&self) -> Option<Arc<MemoStats>> {
        self.stats.as_ref().map(Arc::clone)
    }

    /// Number of cached entries in `instance`'s private store.
    pub fn store_len(&self, instance: &T) -> usize {
        let token = instance_token(instance);
        self.state
            .as_ref()
            .and_then(|state| state.lock().stores.get(&token).map(|store| store.len()))
            .unwrap_or(0)
    }

    /// Cumulative estimated size of `instance`'s private store.
    pub fn store_bytes(&self, instance: &T) -> usize {
        let token = instance_token(instance);
        self.state
            .as_ref()
            .and_then(|state| {
                state
                    .lock()
                    .stores
                    .get(&token)
                    .map(|store| store.current_bytes())
            })
            .unwrap_or(0)
    }

    /// Drops `instance`'s private store without touching other instances or
    /// the aggregate statistics.
    pub fn clear_instance(&self, instance: &T) {
        let token = instance_token(instance);
        if let Some(state) = &self.state {
            state.lock().stores.remove(&token);
        }
    }

    /// Drops every instance's store.
    pub fn clear_all(&self) {
        if let Some(state) = &self.state {
            state.lock().stores.clear();
        }
    }

    /// Number of instances with a live private store.
    pub fn instance_count(&self) -> usize {
        self.state
            .as_ref()
            .map(|state| state.lock().stores.len())
            .unwrap_or(0)
    }

    /// True when the wrapper was constructed with `disabled`.
    pub fn is_disabled(&self) -> bool {
        self.state.is_none()
    }
}

impl<T, A, V, E, F> MemoizedMethod<T, A, Result<V, E>, F>
where
    A: CallArgs,
    V: Clone + MemoryEstimator,
    E: Clone + MemoryEstimator,
    F: Fn(&T, &A, &Kwargs) -> Result<V, E>,
{
    /// [`call_on`](Self::call_on) for fallible methods: errors propagate
    /// unchanged and are never cached; the failed call still counts as a
    /// call and a miss.
    pub fn try_call_on(&self, instance: &T, args: A) -> Result<V, E> {
        self.try_call_on_kw(instance, args, &Kwargs::new())
    }

    /// [`call_on_kw`](Self::call_on_kw) for fallible methods.
    pub fn try_call_on_kw(&self, instance: &T, args: A, kwargs: &Kwargs) -> Result<V, E> {
        let stats = match &self.stats {
            Some(stats) => stats,
            None => return (self.func)(instance, &args, kwargs),
        };
        stats.record_call();

        if self.opts.ignore_nulls && args.first_is_null() {
            stats.record_miss();
            return (self.func)(instance, &args, kwargs);
        }

        let token = instance_token(instance);
        let key = build_key(&args, kwargs, self.opts.disable_kw);
        let _serial = self.guard.as_ref().map(|guard| guard.lock());

        if let Some(hit) = self.lookup(token, &key) {
            return hit;
        }

        stats.record_miss();
        let result = (self.func)(instance, &args, kwargs);
        if result.is_ok() {
            self.store_value(token, key, result.clone());
        }
        result
    }
}
