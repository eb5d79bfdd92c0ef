//! # Result Cache
//!
//! Bounded least-recently-used store backing [`crate::Memoize`].
//!
//! ## Rules
//!
//! - BTreeMap storage, so iteration and eviction order are deterministic
//! - Recency is a logical clock (a counter bumped per access), never wall time
//! - Eviction removes a batch of the oldest entries at once
//! - Integer-only statistics

use std::collections::BTreeMap;

/// Default maximum number of entries.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default number of entries dropped when the cache is full.
pub const DEFAULT_EVICTION_BATCH: usize = 100;

// =============================================================================
// SLOT
// =============================================================================

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    /// Logical time of the last read or write.
    stamp: u64,
}

// =============================================================================
// LRU CACHE
// =============================================================================

/// Deterministic LRU cache keyed by any ordered key.
#[derive(Debug, Clone)]
pub struct LruCache<K: Ord + Clone, V> {
    slots: BTreeMap<K, Slot<V>>,
    capacity: usize,
    eviction_batch: usize,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl<K: Ord + Clone, V> Default for LruCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<K: Ord + Clone, V> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries (at least 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: BTreeMap::new(),
            capacity: capacity.max(1),
            eviction_batch: DEFAULT_EVICTION_BATCH,
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Builder: number of entries dropped per eviction (at least 1).
    #[must_use]
    pub fn with_eviction_batch(mut self, batch: usize) -> Self {
        self.eviction_batch = batch.max(1);
        self
    }

    fn tick(&mut self) -> u64 {
        self.clock = self.clock.saturating_add(1);
        self.clock
    }

    /// Look up `key`, refreshing its recency and counting a hit or miss.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let stamp = self.tick();
        match self.slots.get_mut(key) {
            Some(slot) => {
                slot.stamp = stamp;
                self.hits = self.hits.saturating_add(1);
                Some(&slot.value)
            }
            None => {
                self.misses = self.misses.saturating_add(1);
                None
            }
        }
    }

    /// Look up `key` without touching recency or statistics.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.slots.get(key).map(|slot| &slot.value)
    }

    /// Store `value` under `key`, evicting old entries first when full.
    pub fn insert(&mut self, key: K, value: V) {
        let stamp = self.tick();

        if let Some(slot) = self.slots.get_mut(&key) {
            slot.value = value;
            slot.stamp = stamp;
            return;
        }

        if self.slots.len() >= self.capacity {
            self.evict();
        }
        self.slots.insert(key, Slot { value, stamp });
    }

    /// Drop `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.slots.remove(key).map(|slot| slot.value)
    }

    /// Drop every entry. Statistics and the clock are kept.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.slots.keys()
    }

    /// Snapshot of size and hit/miss counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits.saturating_add(self.misses);
        let hit_rate_percent = if lookups == 0 {
            0
        } else {
            (self.hits.saturating_mul(100) / lookups) as u8
        };

        CacheStats {
            size: self.slots.len(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            hit_rate_percent,
        }
    }

    /// Remove the `eviction_batch` least recently used entries.
    fn evict(&mut self) {
        // Stamps are unique, so ordering by (stamp, key) is total.
        let mut by_age: Vec<(u64, K)> = self
            .slots
            .iter()
            .map(|(key, slot)| (slot.stamp, key.clone()))
            .collect();
        by_age.sort_unstable_by_key(|(stamp, _)| *stamp);

        for (_, key) in by_age.into_iter().take(self.eviction_batch) {
            self.slots.remove(&key);
        }
    }
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently stored.
    pub size: usize,
    /// Maximum entries.
    pub capacity: usize,
    /// Lookups that found a value.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// `hits * 100 / (hits + misses)`, 0 before the first lookup.
    pub hit_rate_percent: u8,
}

// =============================================================================
// TESTS
// =============================================================================
