use std::collections::{HashMap, VecDeque};

use crate::CacheEntry;

/// Ordered key→entry container with least-recently-used eviction.
///
/// The map holds the entries; the order queue tracks recency with the
/// least-recently-used key at the front. A hit promotes its key to the back
/// of the queue. Insertion evicts from the front, one entry at a time, until
/// both the entry-count budget and the cumulative byte budget are satisfied,
/// then places the new entry at the most-recently-used position.
///
/// A value whose own estimate exceeds the byte budget is refused outright:
/// evicting every other entry still could not make room, and draining the
/// store for an unstorable value would only hurt.
///
/// The store itself is not synchronized; the owning wrapper serializes
/// access.
///
/// # Examples
///
/// ```
/// use memoizer::LruStore;
///
/// let mut store: LruStore<i32> = LruStore::new(Some(2), None);
/// store.insert("a".into(), 1, 0);
/// store.insert("b".into(), 2, 0);
/// store.get("a"); // promote "a"
/// store.insert("c".into(), 3, 0); // evicts "b"
///
/// assert_eq!(store.get("a"), Some(&1));
/// assert_eq!(store.get("b"), None);
/// assert_eq!(store.get("c"), Some(&3));
/// ```
#[derive(Debug)]
pub struct LruStore<R> {
    map: HashMap<String, CacheEntry<R>>,
    order: VecDeque<String>,
    max_size: Option<usize>,
    max_bytes: Option<usize>,
    current_bytes: usize,
}

impl<R> LruStore<R> {
    /// Creates a store with the given budgets. `None` means unbounded.
    pub fn new(max_size: Option<usize>, max_bytes: Option<usize>) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            max_size,
            max_bytes,
            current_bytes: 0,
        }
    }

    /// Looks up `key`, promoting it to most-recently-used on a hit.
    pub fn get(&mut self, key: &str) -> Option<&R> {
        if !self.map.contains_key(key) {
            return None;
        }
        self.promote(key);
        self.map.get(key).map(|entry| &entry.value)
    }

    /// Inserts `value` under `key`, weighed at `bytes`, evicting
    /// least-recently-used entries as needed. Returns `false` when the value
    /// alone exceeds the byte budget and was not stored.
    pub fn insert(&mut self, key: String, value: R, bytes: usize) -> bool {
        // Re-inserting under an existing key replaces it outright.
        if let Some(old) = self.map.remove(&key) {
            self.current_bytes -= old.bytes;
            if let Some(pos) = self.order.iter().position(|k| *k == key) {
                self.order.remove(pos);
            }
        }

        if let Some(max_bytes) = self.max_bytes {
            if bytes > max_bytes {
                return false;
            }
            while self.current_bytes + bytes > max_bytes {
                if self.evict_lru().is_none() {
                    break;
                }
            }
        }

        if let Some(max_size) = self.max_size {
            while self.map.len() >= max_size {
                if self.evict_lru().is_none() {
                    break;
                }
            }
        }

        self.current_bytes += bytes;
        self.map.insert(key.clone(), CacheEntry::new(value, bytes));
        self.order.push_back(key);
        true
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Cumulative estimated size of stored entries.
    pub fn current_bytes(&self) -> usize {
        self.current_bytes
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
        self.current_bytes = 0;
    }

    /// Moves `key` to the most-recently-used position.
    fn promote(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    /// Evicts the least-recently-used entry, returning its key.
    fn evict_lru(&mut self) -> Option<String> {
        let key = self.order.pop_front()?;
        if let Some(entry) = self.map.remove(&key) {
            self.current_bytes -= entry.bytes;
        }
        log::trace!(target: "memoizer", "evicted lru key={}", key);
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_insert_get() {
        let mut store: LruStore<i32> = LruStore::new(None, None);
        store.insert("k1".into(), 100, 0);
        assert_eq!(store.get("k1"), Some(&100));
        assert_eq!(store.get("missing"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reinsert_replaces() {
        let mut store: LruStore<i32> = LruStore::new(None, None);
        store.insert("k".into(), 1, 0);
        store.insert("k".into(), 2, 0);
        assert_eq!(store.get("k"), Some(&2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_count_budget_evicts_lru() {
        let mut store: LruStore<i32> = LruStore::new(Some(2), None);
        store.insert("k1".into(), 1, 0);
        store.insert("k2".into(), 2, 0);
        store.insert("k3".into(), 3, 0);

        assert_eq!(store.len(), 2);
        assert!(!store.contains("k1"));
        assert!(store.contains("k2"));
        assert!(store.contains("k3"));
    }

    #[test]
    fn test_hit_promotes() {
        let mut store: LruStore<i32> = LruStore::new(Some(2), None);
        store.insert("k1".into(), 1, 0);
        store.insert("k2".into(), 2, 0);
        // Promote k1; k2 becomes the eviction victim.
        assert_eq!(store.get("k1"), Some(&1));
        store.insert("k3".into(), 3, 0);

        assert!(store.contains("k1"));
        assert!(!store.contains("k2"));
        assert!(store.contains("k3"));
    }

    #[test]
    fn test_byte_budget_running_total() {
        let mut store: LruStore<&str> = LruStore::new(None, Some(100));
        assert!(store.insert("k1".into(), "a", 40));
        assert!(store.insert("k2".into(), "b", 40));
        assert_eq!(store.current_bytes(), 80);

        // Needs 40 more; k1 (LRU) goes.
        assert!(store.insert("k3".into(), "c", 40));
        assert_eq!(store.current_bytes(), 80);
        assert!(!store.contains("k1"));
        assert!(store.contains("k2"));
        assert!(store.contains("k3"));
    }

    #[test]
    fn test_byte_budget_never_exceeded() {
        let mut store: LruStore<i32> = LruStore::new(None, Some(100));
        for i in 0..20 {
            store.insert(format!("k{}", i), i, 30);
            assert!(store.current_bytes() <= 100);
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_oversize_value_refused() {
        let mut store: LruStore<i32> = LruStore::new(None, Some(50));
        assert!(store.insert("small".into(), 1, 30));
        assert!(!store.insert("huge".into(), 2, 51));

        // The refused value must not have disturbed existing entries.
        assert!(store.contains("small"));
        assert!(!store.contains("huge"));
        assert_eq!(store.current_bytes(), 30);
    }

    #[test]
    fn test_both_budgets_apply() {
        let mut store: LruStore<i32> = LruStore::new(Some(3), Some(50));
        store.insert("k1".into(), 1, 20);
        store.insert("k2".into(), 2, 20);
        // Byte budget forces k1 out even though count budget has room.
        store.insert("k3".into(), 3, 20);
        assert_eq!(store.len(), 2);
        assert!(!store.contains("k1"));
    }

    #[test]
    fn test_clear_resets_bytes() {
        let mut store: LruStore<i32> = LruStore::new(None, Some(100));
        store.insert("k1".into(), 1, 40);
        store.insert("k2".into(), 2, 40);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.current_bytes(), 0);
        assert_eq!(store.get("k1"), None);
    }

    #[test]
    fn test_reinsert_under_byte_budget_releases_old_weight() {
        let mut store: LruStore<i32> = LruStore::new(None, Some(100));
        store.insert("k".into(), 1, 80);
        store.insert("k".into(), 2, 90);
        assert_eq!(store.current_bytes(), 90);
        assert_eq!(store.get("k"), Some(&2));
    }
}
