//! LruStore: thread-safe LRU store

use std::hash::Hash;
use std::num::NonZeroUsize;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::lru::LruCache;
use crate::stats::CacheStats;

/// Fixed-capacity LRU store shared between threads
///
/// One mutex guards the key index and the recency list together, so every
/// operation is atomic with respect to every other. Values are cloned out;
/// no reference into the store outlives the lock.
pub struct LruStore<K, V> {
    /// Recency list and key index
    cache: Mutex<LruCache<K, V>>,

    /// Store statistics
    stats: CacheStats,

    /// Store capacity
    capacity: usize,
}

impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a new store holding at most `capacity` entries
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries
    ///
    /// # Returns
    /// * `Result<LruStore>` - `Error::ZeroCapacity` if `capacity` is 0
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or(Error::ZeroCapacity)?;
        Ok(Self::with_capacity(capacity))
    }

    /// Create a new store from an already validated capacity
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        debug!(capacity = capacity.get(), "creating lru store");

        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            stats: CacheStats::new(),
            capacity: capacity.get(),
        }
    }

    /// Insert or update a value
    ///
    /// An existing key is overwritten and becomes most recently used. A new
    /// key on a full store silently evicts the least recently used entry.
    pub fn put(&self, key: K, value: V) {
        let mut cache = self.cache.lock();

        if cache.contains(&key) {
            cache.put(key, value);
            self.stats.record_update();
            return;
        }

        if cache.put(key, value).is_some() {
            trace!(capacity = self.capacity, "evicted least recently used entry");
            self.stats.record_eviction();
        }
        self.stats.record_insert();
    }

    /// Get a value and mark it most recently used
    ///
    /// # Returns
    /// * `Option<V>` - `None` if the key is not held; a miss changes nothing
    pub fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.cache.lock();

        match cache.get(key) {
            Some(value) => {
                self.stats.record_hit();
                Some(value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Get a value without changing its recency
    pub fn peek(&self, key: &K) -> Option<V> {
        self.cache.lock().peek(key).cloned()
    }

    /// Check if a key is held, without changing its recency
    pub fn contains(&self, key: &K) -> bool {
        self.cache.lock().contains(key)
    }

    /// Remove a single entry
    pub fn remove(&self, key: &K) -> Option<V> {
        self.cache.lock().remove(key)
    }

    /// Discard every entry and reset statistics; capacity is unchanged
    pub fn reset(&self) {
        let mut cache = self.cache.lock();
        let dropped = cache.len();
        cache.clear();
        self.stats.reset();
        self.stats.record_reset();
        debug!(dropped, capacity = self.capacity, "reset lru store");
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> Vec<K> {
        self.cache.lock().keys()
    }

    /// Get store statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get current number of entries
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Get store capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Verify that the key index and the recency list agree
    pub fn check_invariants(&self) -> Result<()> {
        self.cache.lock().check_invariants()
    }
}
