//! Memoizing cache with one computation per key
//!
//! `get(key)` returns the value previously computed for `key`, or computes it
//! with the function supplied at construction, stores it and returns it.
//! The cache is unbounded: it grows with the number of distinct keys ever
//! requested until [`MemoizingCache::clear`] is called.
//!
//! Concurrent first requests for the same key are single-flight. Each key
//! maps to a once-cell in the backing [`ConcurrentMap`]; the first caller
//! computes while the others block on that cell, and every caller observes
//! the same value. Computations for different keys run in parallel, outside
//! the map lock.
//!
//! The compute function must be pure. It must not request its own key from
//! the same cache (that would wait on itself).

use crate::config::CacheConfig;
use crate::map::ConcurrentMap;
use once_cell::sync::OnceCell;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

type Slot<V> = Arc<OnceCell<V>>;

/// Cache computing each value at most once per key
pub struct MemoizingCache<K, V, F> {
    table: ConcurrentMap<K, Slot<V>>,
    compute: F,
    computations: AtomicU64,
}

impl<K, V, F> MemoizingCache<K, V, F>
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: Fn(&K) -> V,
{
    /// Create an empty cache around `compute`
    pub fn new(compute: F) -> Self {
        Self::with_table(ConcurrentMap::new(), compute)
    }

    /// Create an empty cache sized from configuration
    pub fn from_config(config: &CacheConfig, compute: F) -> Self {
        Self::with_table(ConcurrentMap::with_capacity(config.initial_capacity), compute)
    }

    fn with_table(table: ConcurrentMap<K, Slot<V>>, compute: F) -> Self {
        Self {
            table,
            compute,
            computations: AtomicU64::new(0),
        }
    }

    /// Value for `key`, computing and storing it on first request
    ///
    /// If `compute` panics the panic propagates, the key stays uncomputed
    /// and the next request retries.
    pub fn get<Q>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let slot = match self.table.get(key) {
            Some(slot) => slot,
            None => {
                let owned = key.to_owned();
                self.table
                    .get_or_insert_with(owned, || Arc::new(OnceCell::new()))
            }
        };

        slot.get_or_init(|| {
            let owned = key.to_owned();
            let value = (self.compute)(&owned);
            let total = self.computations.fetch_add(1, Ordering::Relaxed) + 1;
            trace!(total, "memoizing cache computed value");
            value
        })
        .clone()
    }

    /// Stored value for `key` without computing it
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Whether a value has been computed for `key`
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table
            .get(key)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Keys with a computed value
    pub fn keys(&self) -> Vec<K> {
        self.table
            .items()
            .into_iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(key, _)| key)
            .collect()
    }

    /// Number of keys with a computed value
    pub fn len(&self) -> usize {
        self.table
            .values()
            .iter()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    /// Whether no value has been computed yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored value
    ///
    /// Computations already in flight finish and are returned to their
    /// callers but are not kept.
    pub fn clear(&self) {
        self.table.clear();
    }

    /// Total number of times `compute` has completed
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }
}

impl<K, V, F> fmt::Debug for MemoizingCache<K, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoizingCache")
            .field("slots", &self.table.len())
            .field("computations", &self.computations.load(Ordering::Relaxed))
            .finish()
    }
}
