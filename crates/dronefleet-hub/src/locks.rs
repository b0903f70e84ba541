//! Keyed mutual exclusion
//!
//! The hub keeps one table keyed by drone id and one keyed by medication id.
//! Every read-modify-write of a drone or a medication runs while holding the
//! matching entry, so work on unrelated records never waits.
//!
//! Lock order: a drone entry is always taken before any medication entry,
//! and medication entries are taken in ascending id order.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;

/// Lock table keyed by record id
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }
}

impl<K: Copy + Ord + Hash> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: K) -> Arc<Mutex<()>> {
        // Clone the Arc out so the map shard is released before blocking.
        self.locks.entry(key).or_default().clone()
    }

    /// Run `f` while holding the lock of `key`
    pub fn with_key<T>(&self, key: K, f: impl FnOnce() -> T) -> T {
        let lock = self.entry(key);
        let _guard = lock.lock();
        f()
    }

    /// Run `f` while holding the locks of every key, taken in ascending order
    pub fn with_keys<T>(&self, keys: &[K], f: impl FnOnce() -> T) -> T {
        let mut keys = keys.to_vec();
        keys.sort_unstable();
        keys.dedup();
        let locks: Vec<Arc<Mutex<()>>> = keys.into_iter().map(|key| self.entry(key)).collect();
        let _guards: Vec<_> = locks.iter().map(|lock| lock.lock()).collect();
        f()
    }

    /// Number of keys that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
