use std::collections::BTreeMap;
use std::fmt::Debug;

/// Separator between rendered key fragments.
///
/// ASCII unit separator: effectively never present in `Debug` output, so
/// adjacent fragments cannot collide (`("ab", "c")` vs `("a", "bc")`).
const KEY_SEP: &str = "\u{1f}";

/// Trait for types that can render themselves as a cache key fragment.
///
/// The blanket implementation covers every `Debug` type, which makes any
/// ordinary argument tuple key-constructible out of the box. Types wanting a
/// cheaper or more selective rendering (e.g. keying a large struct by its id
/// alone) are expected to be newtyped with a hand-written `Debug`.
///
/// Key-constructibility is enforced by this bound at compile time; there is
/// no runtime "unusable key" failure mode.
pub trait CacheableKey {
    fn to_cache_key(&self) -> String;
}

impl<T> CacheableKey for T
where
    T: Debug + ?Sized,
{
    fn to_cache_key(&self) -> String {
        format!("{:?}", self)
    }
}

/// Null-sentinel predicate for the first positional argument.
///
/// `ignore_nulls` wrappers consult this to decide whether a call should
/// bypass the cache entirely. Only `Option::None` is the null sentinel;
/// every other value reports `false` through the default method.
///
/// The probe is an explicit per-type strategy rather than embedded type
/// inspection: first-position argument types opt in with a one-line impl.
pub trait NullProbe {
    /// True when this value is the null sentinel.
    fn is_null(&self) -> bool {
        false
    }
}

impl<T> NullProbe for Option<T> {
    fn is_null(&self) -> bool {
        self.is_none()
    }
}

impl NullProbe for i8 {}
impl NullProbe for i16 {}
impl NullProbe for i32 {}
impl NullProbe for i64 {}
impl NullProbe for i128 {}
impl NullProbe for isize {}

impl NullProbe for u8 {}
impl NullProbe for u16 {}
impl NullProbe for u32 {}
impl NullProbe for u64 {}
impl NullProbe for u128 {}
impl NullProbe for usize {}

impl NullProbe for f32 {}
impl NullProbe for f64 {}

impl NullProbe for bool {}
impl NullProbe for char {}

impl NullProbe for str {}
impl NullProbe for String {}

impl<T> NullProbe for &T
where
    T: NullProbe + ?Sized,
{
    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

/// The positional-argument side of a call, viewed by the key builder.
///
/// Implemented for tuples up to arity 8 (and for `()` for zero-argument
/// callables). Each element renders one key fragment in call order; the
/// first element additionally answers the null-sentinel probe.
pub trait CallArgs {
    /// Appends one rendered fragment per positional argument, in call order.
    fn push_key_parts(&self, parts: &mut Vec<String>);

    /// True when the first positional argument is the null sentinel.
    fn first_is_null(&self) -> bool;
}

impl CallArgs for () {
    fn push_key_parts(&self, _parts: &mut Vec<String>) {}

    fn first_is_null(&self) -> bool {
        false
    }
}

macro_rules! tuple_call_args {
    ($head:ident $(, $tail:ident)*) => {
        #[allow(non_snake_case)]
        impl<$head, $($tail,)*> CallArgs for ($head, $($tail,)*)
        where
            $head: CacheableKey + NullProbe,
            $($tail: CacheableKey,)*
        {
            fn push_key_parts(&self, parts: &mut Vec<String>) {
                let ($head, $($tail,)*) = self;
                parts.push($head.to_cache_key());
                $(parts.push($tail.to_cache_key());)*
            }

            fn first_is_null(&self) -> bool {
                let ($head, ..) = self;
                $head.is_null()
            }
        }
    };
}

tuple_call_args!(A1);
tuple_call_args!(A1, A2);
tuple_call_args!(A1, A2, A3);
tuple_call_args!(A1, A2, A3, A4);
tuple_call_args!(A1, A2, A3, A4, A5);
tuple_call_args!(A1, A2, A3, A4, A5, A6);
tuple_call_args!(A1, A2, A3, A4, A5, A6, A7);
tuple_call_args!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Keyword arguments of a call, ordered deterministically by name.
///
/// Backed by a `BTreeMap`, so two calls supplying the same keyword
/// arguments in different orders produce identical cache keys. Values are
/// rendered to their key form at insertion time; the wrapped callable
/// receives the `Kwargs` and reads values back with [`Kwargs::get`].
///
/// # Examples
///
/// ```
/// use memoizer::{kwargs, Kwargs};
///
/// let a = kwargs! { retries = 3, host = "db1" };
/// let mut b = Kwargs::new();
/// b.insert("host", "db1");
/// b.insert("retries", 3);
/// assert_eq!(a, b);
/// assert_eq!(a.get("host"), Some("\"db1\""));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Kwargs {
    entries: BTreeMap<&'static str, String>,
}

impl Kwargs {
    /// Creates an empty keyword-argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a keyword argument.
    pub fn insert(&mut self, name: &'static str, value: impl CacheableKey) {
        self.entries.insert(name, value.to_cache_key());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: &'static str, value: impl CacheableKey) -> Self {
        self.insert(name, value);
        self
    }

    /// Rendered value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, rendered value)` pairs in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn push_key_parts(&self, parts: &mut Vec<String>) {
        for (name, value) in self.entries.iter() {
            parts.push(format!("{}={}", name, value));
        }
    }
}

/// Constructs [`Kwargs`] from `name = value` pairs.
///
/// ```
/// use memoizer::kwargs;
///
/// let kw = kwargs! { a = 1, b = 2 };
/// assert_eq!(kw.len(), 2);
/// ```
#[macro_export]
macro_rules! kwargs {
    () => { $crate::Kwargs::new() };
    ($($name:ident = $value:expr),+ $(,)?) => {{
        let mut kw = $crate::Kwargs::new();
        $(kw.insert(stringify!($name), $value);)+
        kw
    }};
}

/// Builds the cache key for one call.
///
/// Positional fragments come first, in call order; keyword fragments follow
/// in ascending name order unless `disable_kw` excludes them. Fragments are
/// joined with a separator that cannot appear in `Debug` renderings, so
/// distinct argument lists map to distinct keys.
pub fn build_key<A: CallArgs>(args: &A, kwargs: &Kwargs, disable_kw: bool) -> String {
    let mut parts = Vec::new();
    args.push_key_parts(&mut parts);
    if !disable_kw {
        kwargs.push_key_parts(&mut parts);
    }
    parts.join(KEY_SEP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blanket_debug_key() {
        assert_eq!(42.to_cache_key(), "42");
        assert_eq!("abc".to_cache_key(), "\"abc\"");
        assert_eq!(Some(1).to_cache_key(), "Some(1)");
    }

    #[test]
    fn test_positional_order_matters() {
        let a = build_key(&(1, 2), &Kwargs::new(), false);
        let b = build_key(&(2, 1), &Kwargs::new(), false);
        assert_ne!(a, b);
    }

    #[test]
    fn test_adjacent_fragments_do_not_collide() {
        let a = build_key(&("ab", "c"), &Kwargs::new(), false);
        let b = build_key(&("a", "bc"), &Kwargs::new(), false);
        assert_ne!(a, b);
    }

    #[test]
    fn test_kwargs_order_independent() {
        let first = kwargs! { a = 1, b = 2 };
        let second = kwargs! { b = 2, a = 1 };
        assert_eq!(
            build_key(&(9,), &first, false),
            build_key(&(9,), &second, false)
        );
    }

    #[test]
    fn test_disable_kw_drops_keywords() {
        let kw = kwargs! { a = 1 };
        assert_eq!(
            build_key(&(1, 2), &kw, true),
            build_key(&(1, 2), &Kwargs::new(), true)
        );
        assert_ne!(
            build_key(&(1, 2), &kw, false),
            build_key(&(1, 2), &Kwargs::new(), false)
        );
    }

    #[test]
    fn test_null_probe() {
        let none: Option<i32> = None;
        assert!((none,).first_is_null());
        assert!(!(Some(3),).first_is_null());
        assert!(!(1, 2, 3).first_is_null());
        assert!(!("x",).first_is_null());
        assert!(!().first_is_null());
    }

    #[test]
    fn test_empty_args_empty_key() {
        assert_eq!(build_key(&(), &Kwargs::new(), false), "");
    }

    #[test]
    fn test_kwargs_get_and_iter() {
        let kw = kwargs! { b = 2, a = 1 };
        assert_eq!(kw.get("a"), Some("1"));
        assert_eq!(kw.get("missing"), None);
        let names: Vec<&str> = kw.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
