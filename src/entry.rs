/// One stored result plus its size bookkeeping.
///
/// Entries carry the estimated byte size computed at insertion time so the
/// store can maintain a running total without re-estimating on every
/// eviction decision. The estimate is zero whenever no byte budget is
/// configured for the owning wrapper.
///
/// Expiry is deliberately not tracked here: time-to-live is a property of
/// the wrapper generation, not of individual entries. When the configured
/// expiry instant elapses, the whole store is cleared at once.
///
/// Recency is implied by the entry's position in the store's order queue.
#[derive(Clone, Debug)]
pub struct CacheEntry<R> {
    pub value: R,
    pub bytes: usize,
}

impl<R> CacheEntry<R> {
    /// Creates an entry holding `value`, weighed at `bytes`.
    pub fn new(value: R, bytes: usize) -> Self {
        Self { value, bytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_holds_value_and_weight() {
        let entry = CacheEntry::new("payload", 24);
        assert_eq!(entry.value, "payload");
        assert_eq!(entry.bytes, 24);
    }

    #[test]
    fn test_unweighed_entry() {
        let entry = CacheEntry::new(7u32, 0);
        assert_eq!(entry.value, 7);
        assert_eq!(entry.bytes, 0);
    }
}
