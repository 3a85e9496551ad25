//! Bounded FIFO cache of rows keyed by token.

use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

use crate::value::Row;

/// Default number of rows kept.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Default)]
struct Entries {
    order: VecDeque<String>,
    rows: HashMap<String, Row>,
}

/// Rows recently read, keyed by their token.
///
/// Eviction follows insertion order, not access order. Re-setting a key moves
/// it to the back of the queue. Lookups share a read lock; writes are
/// exclusive.
///
/// Keys are tokens only, so identical rows from two tables share one entry.
#[derive(Debug)]
pub struct RowCache {
    capacity: usize,
    inner: RwLock<Entries>,
}

impl RowCache {
    /// Creates a cache holding at most `capacity` rows.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(Entries::default()),
        }
    }

    /// Returns the capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stores `row` under `token`, evicting the oldest entries past capacity.
    pub fn set(&self, token: impl Into<String>, row: Row) {
        let token = token.into();
        let mut entries = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if entries.rows.insert(token.clone(), row).is_some() {
            entries.order.retain(|k| *k != token);
        }
        entries.order.push_back(token);

        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.rows.remove(&oldest);
            }
        }
    }

    /// Returns a copy of the row stored under `token`.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<Row> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .get(token)
            .cloned()
    }

    /// Removes `token`, if present.
    pub fn delete(&self, token: &str) {
        let mut entries = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if entries.rows.remove(token).is_some() {
            entries.order.retain(|k| k != token);
        }
    }

    /// Number of rows held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .len()
    }

    /// Returns true if no row is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RowCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::value::Value;

    fn row(n: i64) -> Row {
        vec![Value::Int(n)]
    }

    #[test]
    fn test_evicts_oldest() {
        let cache = RowCache::new(3);
        for n in 0..4 {
            cache.set(format!("t{n}"), row(n));
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.get("t0").is_none());
        assert_eq!(cache.get("t3"), Some(row(3)));
    }

    #[test]
    fn test_reset_moves_key_to_back() {
        let cache = RowCache::new(2);
        cache.set("a", row(1));
        cache.set("b", row(2));
        cache.set("a", row(10));
        cache.set("c", row(3));

        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a"), Some(row(10)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_get_does_not_refresh() {
        let cache = RowCache::new(2);
        cache.set("a", row(1));
        cache.set("b", row(2));
        let _ = cache.get("a");
        cache.set("c", row(3));
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_delete() {
        let cache = RowCache::new(2);
        cache.set("a", row(1));
        cache.delete("a");
        cache.delete("missing");
        assert!(cache.is_empty());

        cache.set("b", row(2));
        cache.set("c", row(3));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(RowCache::new(50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for n in 0..100 {
                        let key = format!("{t}-{n}");
                        cache.set(key.clone(), row(n));
                        let _ = cache.get(&key);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 50);
    }
}
