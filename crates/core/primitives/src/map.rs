//! Thread-safe hash map guarded by a single re-entrant lock
//!
//! Every operation takes the map's [`ReentrantLock`] for its duration, so each
//! call is atomic with respect to other threads. Reads are treated like
//! writes for locking purposes; there is no reader/writer split.
//!
//! Sequences that must be atomic as a group (check-then-insert and friends)
//! hold [`ConcurrentMap::enter`] across the calls. Because the lock is
//! re-entrant, the individual operations keep working while the scope is
//! held by the same thread.

use crate::config::MapConfig;
use crate::lock::{LockSnapshot, ReentrantLock, ReentrantLockGuard};
use rustc_hash::FxBuildHasher;
use std::borrow::Borrow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::ops::Deref;

/// Hash map whose every access happens under one [`ReentrantLock`]
pub struct ConcurrentMap<K, V, S = FxBuildHasher> {
    lock: ReentrantLock,
    table: RefCell<HashMap<K, V, S>>,
}

// SAFETY: `table` is only borrowed inside `with_table`, which holds `lock`.
// `lock` is private and only released by guards owned by this module, so no
// caller can release it early. The lock admits a single owning thread at a
// time and its acquire/release pair orders the accesses, so the `RefCell` is
// never touched concurrently.
// A re-entrant borrow from the owning thread (for example from a `Hash`
// impl calling back into the map) panics in `RefCell` instead of aliasing.
unsafe impl<K: Send, V: Send, S: Send> Sync for ConcurrentMap<K, V, S> {}

impl<K, V> ConcurrentMap<K, V, FxBuildHasher> {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher)
    }

    /// Create an empty map with room for `capacity` entries
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, FxBuildHasher)
    }

    /// Create an empty map sized from configuration
    #[must_use]
    pub fn from_config(config: &MapConfig) -> Self {
        Self::with_capacity(config.initial_capacity)
    }
}

impl<K, V, S> ConcurrentMap<K, V, S> {
    /// Create an empty map using `hasher`
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            lock: ReentrantLock::new(),
            table: RefCell::new(HashMap::with_hasher(hasher)),
        }
    }

    /// Create an empty map with room for `capacity` entries using `hasher`
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            lock: ReentrantLock::new(),
            table: RefCell::new(HashMap::with_capacity_and_hasher(capacity, hasher)),
        }
    }

    /// Hold the map's lock until the returned guard is dropped
    ///
    /// Operations called through the guard (or directly on the map from the
    /// same thread) run without interleaving with any other thread.
    pub fn enter(&self) -> MapGuard<'_, K, V, S> {
        MapGuard {
            map: self,
            _lock: self.lock.lock(),
        }
    }

    /// Like [`enter`](Self::enter) but fails instead of blocking
    pub fn try_enter(&self) -> Option<MapGuard<'_, K, V, S>> {
        self.lock.try_lock().map(|lock| MapGuard {
            map: self,
            _lock: lock,
        })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.with_table(|table| table.len())
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.with_table(|table| table.is_empty())
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.with_table(HashMap::clear);
    }

    /// Whether any thread currently holds the map's lock
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Bookkeeping of the map's lock, for diagnostics
    pub fn lock_snapshot(&self) -> LockSnapshot {
        self.lock.snapshot()
    }

    fn with_table<R>(&self, f: impl FnOnce(&mut HashMap<K, V, S>) -> R) -> R {
        let _guard = self.lock.lock();
        let mut table = self.table.borrow_mut();
        f(&mut table)
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Whether `key` is present
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.with_table(|table| table.contains_key(key))
    }

    /// Insert `value` under `key`, returning the previous value
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.with_table(|table| table.insert(key, value))
    }

    /// Remove `key`, returning its value
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.with_table(|table| table.remove(key))
    }

    /// Remove `key`, returning its value or `default` if absent
    pub fn pop_or<Q>(&self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove(key).unwrap_or(default)
    }

    /// Insert every pair from `entries`, overwriting existing keys
    pub fn extend<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        // Collected first so a panicking iterator cannot leave a half-applied
        // update behind.
        let entries: Vec<(K, V)> = entries.into_iter().collect();
        self.with_table(|table| table.extend(entries));
    }

    /// Keep only the entries for which `keep` returns true
    ///
    /// `keep` runs under the map lock and must not call back into the map.
    pub fn retain(&self, keep: impl FnMut(&K, &mut V) -> bool) {
        self.with_table(|table| table.retain(keep));
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    /// Copy of the value stored under `key`
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.with_table(|table| table.get(key).cloned())
    }

    /// Copy of the value stored under `key`, or `default` if absent
    pub fn get_or<Q>(&self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    /// Value under `key`, inserting `default` first if absent
    pub fn get_or_insert(&self, key: K, default: V) -> V {
        self.with_table(|table| table.entry(key).or_insert(default).clone())
    }

    /// Value under `key`, inserting `make()` first if absent
    ///
    /// `make` runs under the map lock and must not call back into the map.
    pub fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> V {
        self.with_table(|table| table.entry(key).or_insert_with(make).clone())
    }

    /// Copies of all values
    pub fn values(&self) -> Vec<V> {
        self.with_table(|table| table.values().cloned().collect())
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Copies of all keys
    pub fn keys(&self) -> Vec<K> {
        self.with_table(|table| table.keys().cloned().collect())
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    /// Copies of all entries
    pub fn items(&self) -> Vec<(K, V)> {
        self.with_table(|table| {
            table
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
    }

    /// Consistent copy of the whole table
    pub fn snapshot(&self) -> HashMap<K, V, S>
    where
        S: Clone,
    {
        self.with_table(|table| table.clone())
    }
}

impl<K, V> Default for ConcurrentMap<K, V, FxBuildHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for ConcurrentMap<K, V, FxBuildHasher>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            lock: ReentrantLock::new(),
            table: RefCell::new(iter.into_iter().collect()),
        }
    }
}

impl<K, V, S> fmt::Debug for ConcurrentMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentMap")
            .field("len", &self.len())
            .field("lock", &self.lock)
            .finish()
    }
}

/// Scoped hold on a [`ConcurrentMap`]'s lock
///
/// Dereferences to the map, so a group of calls made through the guard is
/// atomic as a whole. The lock is released when the guard is dropped.
#[must_use = "the map lock is released as soon as the guard is dropped"]
pub struct MapGuard<'a, K, V, S = FxBuildHasher> {
    map: &'a ConcurrentMap<K, V, S>,
    _lock: ReentrantLockGuard<'a>,
}

impl<K, V, S> Deref for MapGuard<'_, K, V, S> {
    type Target = ConcurrentMap<K, V, S>;

    fn deref(&self) -> &Self::Target {
        self.map
    }
}

impl<K, V, S> fmt::Debug for MapGuard<'_, K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapGuard").field("map", self.map).finish()
    }
}
