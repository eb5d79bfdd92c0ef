//! # Memoize
//!
//! Caches successful method results keyed by method name and argument
//! fingerprint. Failures pass through and are never stored.
//!
//! A `Memoize` keeps its entries across calls, so declare it with
//! [`DecoratorRef::shared`](veneer_core::DecoratorRef::shared). Use one
//! instance per target: the key does not include the target, so an instance
//! shared by two targets hands one target's results to the other. Resolving
//! it by name would build a fresh, empty cache on every call.

use crate::cache::{CacheStats, DEFAULT_CAPACITY, DEFAULT_EVICTION_BATCH, LruCache};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use tracing::trace;
use veneer_core::{Arguments, Decoratable, Decorator, Next, Result};

/// Memoize settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoizeConfig {
    /// Maximum cached results.
    pub capacity: usize,
    /// Results dropped at once when full.
    pub eviction_batch: usize,
}

impl Default for MemoizeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            eviction_batch: DEFAULT_EVICTION_BATCH,
        }
    }
}

/// Cache key: (method, argument fingerprint).
type MemoKey = (String, String);

/// Result cache decorator.
#[derive(Debug)]
pub struct Memoize<O> {
    entries: RefCell<LruCache<MemoKey, O>>,
}

impl<O> Default for Memoize<O> {
    fn default() -> Self {
        Self::new(MemoizeConfig::default())
    }
}

impl<O> Memoize<O> {
    #[must_use]
    pub fn new(config: MemoizeConfig) -> Self {
        Self {
            entries: RefCell::new(
                LruCache::new(config.capacity).with_eviction_batch(config.eviction_batch),
            ),
        }
    }

    /// Cache counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.entries.borrow().stats()
    }

    /// Number of cached results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Forget every cached result.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl<T> Decorator<T> for Memoize<T::Output>
where
    T: Decoratable,
    T::Output: Clone + Default,
{
    fn handle(
        &self,
        _instance: &T,
        method: &str,
        args: &Arguments,
        next: Option<Next<'_, T::Output>>,
    ) -> Result<T::Output> {
        let key = (method.to_string(), args.fingerprint());

        // The borrow ends here so the inner chain may reach this cache again.
        let cached = self.entries.borrow_mut().get(&key).cloned();
        if let Some(value) = cached {
            trace!(method, "Memoize hit");
            return Ok(value);
        }

        let Some(next) = next else {
            return Ok(T::Output::default());
        };

        let value = next.run()?;
        trace!(method, "Memoize store");
        self.entries.borrow_mut().insert(key, value.clone());
        Ok(value)
    }

    fn name(&self) -> &str {
        "memoize"
    }
}

// =============================================================================
// TESTS
// =============================================================================
