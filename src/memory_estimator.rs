/// Pluggable payload-size estimator for byte-budget eviction.
///
/// When a wrapper is configured with `max_bytes`, each stored result is
/// weighed through this trait and the cumulative estimate is held under the
/// budget by evicting least-recently-used entries. The estimate is a policy
/// input, not a byte-exact accounting of heap state: the goal is a stable,
/// cheap approximation of in-memory footprint.
///
/// The default method only counts stack size via `std::mem::size_of_val`.
/// Types owning heap data (`String`, `Vec`, maps, ...) should override it to
/// add their heap footprint.
///
/// # Examples
///
/// ```
/// use memoizer::MemoryEstimator;
///
/// #[derive(Clone)]
/// struct Row {
///     id: u64,
///     label: String,
/// }
///
/// impl MemoryEstimator for Row {
///     fn estimate_memory(&self) -> usize {
///         std::mem::size_of::<Self>() + self.label.capacity()
///     }
/// }
///
/// let row = Row { id: 7, label: "seven".to_string() };
/// assert!(row.estimate_memory() > std::mem::size_of::<Row>());
/// ```
pub trait MemoryEstimator {
    /// Estimated total size of this value in bytes, heap included.
    fn estimate_memory(&self) -> usize {
        std::mem::size_of_val(self)
    }
}

impl MemoryEstimator for i8 {}
impl MemoryEstimator for i16 {}
impl MemoryEstimator for i32 {}
impl MemoryEstimator for i64 {}
impl MemoryEstimator for i128 {}
impl MemoryEstimator for isize {}

impl MemoryEstimator for u8 {}
impl MemoryEstimator for u16 {}
impl MemoryEstimator for u32 {}
impl MemoryEstimator for u64 {}
impl MemoryEstimator for u128 {}
impl MemoryEstimator for usize {}

impl MemoryEstimator for f32 {}
impl MemoryEstimator for f64 {}

impl MemoryEstimator for bool {}
impl MemoryEstimator for char {}

impl MemoryEstimator for () {}

impl MemoryEstimator for String {
    fn estimate_memory(&self) -> usize {
        std::mem::size_of::<Self>() + self.capacity()
    }
}

impl<T> MemoryEstimator for Vec<T>
where
    T: MemoryEstimator,
{
    fn estimate_memory(&self) -> usize {
        std::mem::size_of::<Self>() + self.iter().map(T::estimate_memory).sum::<usize>()
    }
}

impl<T> MemoryEstimator for Option<T>
where
    T: MemoryEstimator,
{
    fn estimate_memory(&self) -> usize {
        std::mem::size_of::<Self>()
            + match self {
                Some(value) => value.estimate_memory(),
                None => 0,
            }
    }
}

impl<T, E> MemoryEstimator for Result<T, E>
where
    T: MemoryEstimator,
    E: MemoryEstimator,
{
    fn estimate_memory(&self) -> usize {
        std::mem::size_of::<Self>()
            + match self {
                Ok(value) => value.estimate_memory(),
                Err(err) => err.estimate_memory(),
            }
    }
}

impl<T1, T2> MemoryEstimator for (T1, T2)
where
    T1: MemoryEstimator,
    T2: MemoryEstimator,
{
    fn estimate_memory(&self) -> usize {
        std::mem::size_of::<Self>() + self.0.estimate_memory() + self.1.estimate_memory()
    }
}

impl<T1, T2, T3> MemoryEstimator for (T1, T2, T3)
where
    T1: MemoryEstimator,
    T2: MemoryEstimator,
    T3: MemoryEstimator,
{
    fn estimate_memory(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.0.estimate_memory()
            + self.1.estimate_memory()
            + self.2.estimate_memory()
    }
}

impl<T> MemoryEstimator for Box<T>
where
    T: MemoryEstimator,
{
    fn estimate_memory(&self) -> usize {
        std::mem::size_of::<Self>() + (**self).estimate_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_are_stack_sized() {
        assert_eq!(42i32.estimate_memory(), std::mem::size_of::<i32>());
        assert_eq!(true.estimate_memory(), std::mem::size_of::<bool>());
        assert_eq!(1.5f64.estimate_memory(), std::mem::size_of::<f64>());
    }

    #[test]
    fn test_string_counts_capacity() {
        let s = String::from("hello");
        assert_eq!(
            s.estimate_memory(),
            std::mem::size_of::<String>() + s.capacity()
        );
    }

    #[test]
    fn test_vec_counts_elements() {
        let v = vec![1i64, 2, 3];
        assert_eq!(
            v.estimate_memory(),
            std::mem::size_of::<Vec<i64>>() + 3 * std::mem::size_of::<i64>()
        );
    }

    #[test]
    fn test_option_none_is_base_size() {
        let none: Option<String> = None;
        assert_eq!(none.estimate_memory(), std::mem::size_of::<Option<String>>());
    }

    #[test]
    fn test_result_counts_active_variant() {
        let ok: Result<String, u8> = Ok("data".to_string());
        let err: Result<String, u8> = Err(1);
        assert!(ok.estimate_memory() > err.estimate_memory());
    }
}
