use std::fmt;
use std::time::Instant;

use crate::ConfigError;

/// Zero-argument expiry source: returns the next instant at which the
/// wrapper's entire cache content becomes stale.
pub type ExpiryFn = Box<dyn Fn() -> Instant + Send + Sync>;

/// A value in the dynamic option table.
///
/// Used by [`MemoizeOptions::set`] and [`MemoizeOptions::from_table`] for
/// callers driving configuration from data rather than code. Functional
/// options (`until`) cannot travel through the table and must be set on the
/// struct directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Size(usize),
}

/// Flat configuration for a memoizing wrapper.
///
/// All fields are optional with the defaults below; construction through
/// [`Default`] plus the builder methods covers the common path, while the
/// dynamic table ([`set`](Self::set) / [`from_table`](Self::from_table))
/// serves config-driven callers and rejects unknown names eagerly.
///
/// | field | default | effect |
/// |---|---|---|
/// | `disable_kw` | `false` | exclude keyword args from the cache key |
/// | `ignore_nulls` | `false` | never cache calls whose first positional arg is `None` |
/// | `threads` | `false` | serialize consult-or-compute under a wrapper-wide lock |
/// | `obj` | `false` | scope the cache per instance (requires `MemoizedMethod`) |
/// | `max_bytes` | unset | evict by cumulative estimated entry size |
/// | `max_size` | unset | evict by entry count |
/// | `until` | unset | generation expiry source |
/// | `disabled` | `false` | bypass caching entirely |
/// | `verbose` | `false` | emit hit/miss diagnostics through `log` |
///
/// # Examples
///
/// ```
/// use memoizer::MemoizeOptions;
///
/// let opts = MemoizeOptions::default().max_size(128).threads(true);
/// assert!(opts.validate().is_ok());
/// assert!(MemoizeOptions::default().max_size(0).validate().is_err());
/// ```
#[derive(Default)]
pub struct MemoizeOptions {
    pub disable_kw: bool,
    pub ignore_nulls: bool,
    pub threads: bool,
    pub obj: bool,
    pub max_bytes: Option<usize>,
    pub max_size: Option<usize>,
    pub until: Option<ExpiryFn>,
    pub disabled: bool,
    pub verbose: bool,
}

impl MemoizeOptions {
    pub fn disable_kw(mut self, value: bool) -> Self {
        self.disable_kw = value;
        self
    }

    pub fn ignore_nulls(mut self, value: bool) -> Self {
        self.ignore_nulls = value;
        self
    }

    pub fn threads(mut self, value: bool) -> Self {
        self.threads = value;
        self
    }

    pub fn obj(mut self, value: bool) -> Self {
        self.obj = value;
        self
    }

    pub fn max_bytes(mut self, value: usize) -> Self {
        self.max_bytes = Some(value);
        self
    }

    pub fn max_size(mut self, value: usize) -> Self {
        self.max_size = Some(value);
        self
    }

    /// Sets the generation expiry source.
    ///
    /// The function is called once at wrapper construction and again each
    /// time the previously returned instant has passed; crossing it clears
    /// the wrapper's entire cache content.
    pub fn until(mut self, f: impl Fn() -> Instant + Send + Sync + 'static) -> Self {
        self.until = Some(Box::new(f));
        self
    }

    pub fn disabled(mut self, value: bool) -> Self {
        self.disabled = value;
        self
    }

    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Assigns one option by name.
    ///
    /// Unrecognized names are a configuration error; so is a value of the
    /// wrong shape for a recognized name. `until` is recognized but cannot
    /// be carried by the table.
    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<(), ConfigError> {
        match (name, value) {
            ("disable_kw", OptionValue::Bool(v)) => self.disable_kw = v,
            ("ignore_nulls", OptionValue::Bool(v)) => self.ignore_nulls = v,
            ("threads", OptionValue::Bool(v)) => self.threads = v,
            ("obj", OptionValue::Bool(v)) => self.obj = v,
            ("disabled", OptionValue::Bool(v)) => self.disabled = v,
            ("verbose", OptionValue::Bool(v)) => self.verbose = v,
            ("max_bytes", OptionValue::Size(v)) => self.max_bytes = Some(v),
            ("max_size", OptionValue::Size(v)) => self.max_size = Some(v),
            ("until", _) => {
                return Err(ConfigError::invalid(
                    "until",
                    "expiry functions cannot be supplied through the option table",
                ))
            }
            ("disable_kw", v)
            | ("ignore_nulls", v)
            | ("threads", v)
            | ("obj", v)
            | ("disabled", v)
            | ("verbose", v) => {
                return Err(ConfigError::invalid(
                    "flag",
                    format!("option `{}` expects a boolean, got {:?}", name, v),
                ))
            }
            ("max_bytes", v) | ("max_size", v) => {
                return Err(ConfigError::invalid(
                    "budget",
                    format!("option `{}` expects a size, got {:?}", name, v),
                ))
            }
            (unknown, _) => return Err(ConfigError::UnknownOption(unknown.to_string())),
        }
        Ok(())
    }

    /// Builds options from a flat `(name, value)` table.
    ///
    /// ```
    /// use memoizer::{MemoizeOptions, OptionValue};
    ///
    /// let opts = MemoizeOptions::from_table([
    ///     ("max_size", OptionValue::Size(2)),
    ///     ("threads", OptionValue::Bool(true)),
    /// ]).unwrap();
    /// assert_eq!(opts.max_size, Some(2));
    /// assert!(opts.threads);
    /// ```
    pub fn from_table<'a, I>(table: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, OptionValue)>,
    {
        let mut opts = Self::default();
        for (name, value) in table {
            opts.set(name, value)?;
        }
        opts.validate()?;
        Ok(opts)
    }

    /// Eager validation, run by the wrapper constructors before any cache
    /// state is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == Some(0) {
            return Err(ConfigError::invalid(
                "max_size",
                "entry-count budget must be at least 1",
            ));
        }
        if self.max_bytes == Some(0) {
            return Err(ConfigError::invalid(
                "max_bytes",
                "byte budget must be at least 1",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for MemoizeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoizeOptions")
            .field("disable_kw", &self.disable_kw)
            .field("ignore_nulls", &self.ignore_nulls)
            .field("threads", &self.threads)
            .field("obj", &self.obj)
            .field("max_bytes", &self.max_bytes)
            .field("max_size", &self.max_size)
            .field("until", &self.until.as_ref().map(|_| "<fn>"))
            .field("disabled", &self.disabled)
            .field("verbose", &self.verbose)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let opts = MemoizeOptions::default();
        assert!(!opts.disable_kw);
        assert!(!opts.ignore_nulls);
        assert!(!opts.threads);
        assert!(!opts.obj);
        assert_eq!(opts.max_bytes, None);
        assert_eq!(opts.max_size, None);
        assert!(opts.until.is_none());
        assert!(!opts.disabled);
        assert!(!opts.verbose);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_set_known_options() {
        let mut opts = MemoizeOptions::default();
        opts.set("threads", OptionValue::Bool(true)).unwrap();
        opts.set("max_size", OptionValue::Size(10)).unwrap();
        assert!(opts.threads);
        assert_eq!(opts.max_size, Some(10));
    }

    #[test]
    fn test_unknown_option_rejected() {
        let mut opts = MemoizeOptions::default();
        let err = opts.set("max_siez", OptionValue::Size(10)).unwrap_err();
        assert_eq!(err, ConfigError::UnknownOption("max_siez".to_string()));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut opts = MemoizeOptions::default();
        assert!(opts.set("threads", OptionValue::Size(1)).is_err());
        assert!(opts.set("max_size", OptionValue::Bool(true)).is_err());
    }

    #[test]
    fn test_until_not_table_settable() {
        let mut opts = MemoizeOptions::default();
        assert!(opts.set("until", OptionValue::Bool(true)).is_err());
    }

    #[test]
    fn test_from_table_stops_at_first_error() {
        let err = MemoizeOptions::from_table([
            ("max_size", OptionValue::Size(2)),
            ("bogus", OptionValue::Bool(true)),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::UnknownOption("bogus".to_string()));
    }

    #[test]
    fn test_zero_budgets_invalid() {
        assert!(MemoizeOptions::default().max_size(0).validate().is_err());
        assert!(MemoizeOptions::default().max_bytes(0).validate().is_err());
        assert!(MemoizeOptions::default().max_size(1).validate().is_ok());
    }

    #[test]
    fn test_until_builder() {
        let opts = MemoizeOptions::default().until(|| Instant::now() + Duration::from_secs(60));
        assert!(opts.until.is_some());
        let deadline = (opts.until.as_ref().unwrap())();
        assert!(deadline > Instant::now());
    }

    #[test]
    fn test_debug_elides_expiry_fn() {
        let opts = MemoizeOptions::default().until(Instant::now);
        let rendered = format!("{:?}", opts);
        assert!(rendered.contains("until"));
        assert!(rendered.contains("<fn>"));
    }
}
