//! # Registry Module
//!
//! Identifier to factory map for decorators declared by name.
//!
//! The registry is injected into each decorated object; nothing is looked up
//! from global state. Every resolution builds a fresh, default-constructed
//! instance, so decorators registered here should keep no per-call state.
//! Share a stateful decorator with [`DecoratorRef::shared`](crate::DecoratorRef::shared) instead.

use crate::decorator::Decorator;
use crate::method::Decoratable;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Builds one decorator instance.
pub type DecoratorFactory<T> = Box<dyn Fn() -> Arc<dyn Decorator<T>>>;

/// Decorator factories keyed by identifier.
///
/// Uses BTreeMap so `identifiers()` is deterministic.
pub struct DecoratorRegistry<T: Decoratable> {
    factories: BTreeMap<String, DecoratorFactory<T>>,
}

impl<T: Decoratable> DecoratorRegistry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a default-constructible decorator under `identifier`.
    ///
    /// Re-registering an identifier replaces the previous factory.
    pub fn register<D>(&mut self, identifier: impl Into<String>)
    where
        D: Decorator<T> + Default + 'static,
    {
        self.register_with(identifier, D::default);
    }

    /// Register a custom factory under `identifier`.
    pub fn register_with<D, F>(&mut self, identifier: impl Into<String>, factory: F)
    where
        D: Decorator<T> + 'static,
        F: Fn() -> D + 'static,
    {
        self.factories.insert(
            identifier.into(),
            Box::new(move || Arc::new(factory()) as Arc<dyn Decorator<T>>),
        );
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with<D>(mut self, identifier: impl Into<String>) -> Self
    where
        D: Decorator<T> + Default + 'static,
    {
        self.register::<D>(identifier);
        self
    }

    /// Check if an identifier is registered.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// Build a fresh instance for `identifier`.
    ///
    /// Returns `None` if the identifier is unknown.
    #[must_use]
    pub fn resolve(&self, identifier: &str) -> Option<Arc<dyn Decorator<T>>> {
        self.factories.get(identifier).map(|factory| factory())
    }

    /// All registered identifiers (sorted).
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Number of registered identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<T: Decoratable> Default for DecoratorRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Decoratable> fmt::Debug for DecoratorRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorRegistry")
            .field("identifiers", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
