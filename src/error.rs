use thiserror::Error;

/// Configuration errors surfaced eagerly at wrap time.
///
/// Both wrapper constructors ([`crate::Memoized::new`] and
/// [`crate::MemoizedMethod::new`]) validate their [`crate::MemoizeOptions`]
/// before any cache state is built, so a misconfigured wrapper never comes
/// into existence. Errors raised by the wrapped callable itself are *not*
/// part of this taxonomy: they propagate unchanged to the caller.
///
/// # Examples
///
/// ```
/// use memoizer::{ConfigError, MemoizeOptions, OptionValue};
///
/// let mut opts = MemoizeOptions::default();
/// let err = opts.set("max_siez", OptionValue::Size(10)).unwrap_err();
/// assert!(matches!(err, ConfigError::UnknownOption(_)));
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An option name that the configuration table does not recognize.
    #[error("unrecognized memoize option `{0}`")]
    UnknownOption(String),

    /// A recognized option with an unusable value (wrong type in the dynamic
    /// table, a zero budget, or a scope flag that contradicts the wrapper
    /// kind being constructed).
    #[error("invalid value for memoize option `{option}`: {reason}")]
    InvalidValue {
        option: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(option: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            option,
            reason: reason.into(),
        }
    }
}
