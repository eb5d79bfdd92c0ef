//! # Decorator Module
//!
//! The contract every cross-cutting behavior implements, the continuation
//! handed to it, and the declaration record that points at one.
//!
//! A decorator receives the target, the method name, the captured arguments
//! and `next`. It decides whether `next` runs at all, how often, and what
//! happens to its result.

use crate::arguments::Arguments;
use crate::error::{Error, Result};
use crate::method::Decoratable;
use crate::registry::DecoratorRegistry;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// DECORATOR TRAIT
// =============================================================================

/// A unit of cross-cutting behavior wrapped around a method call.
pub trait Decorator<T: Decoratable> {
    /// Run this layer of the chain.
    ///
    /// `next` runs the remainder of the chain. The engine always passes
    /// `Some`; a decorator driven by hand as the terminal wrapper may get
    /// `None` and must treat it as "nothing to call".
    fn handle(
        &self,
        instance: &T,
        method: &str,
        args: &Arguments,
        next: Option<Next<'_, T::Output>>,
    ) -> Result<T::Output>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

// =============================================================================
// NEXT (CONTINUATION)
// =============================================================================

/// Zero-argument continuation for the rest of the chain.
///
/// `Next` borrows the inner chain for the duration of one call. It is `Copy`
/// and may be run any number of times.
pub struct Next<'a, O> {
    inner: &'a (dyn Fn() -> Result<O> + 'a),
}

impl<'a, O> Next<'a, O> {
    /// Wrap a borrowed continuation.
    pub fn new(inner: &'a (dyn Fn() -> Result<O> + 'a)) -> Self {
        Self { inner }
    }

    /// Run the remainder of the chain.
    pub fn run(&self) -> Result<O> {
        (self.inner)()
    }
}

impl<O> Clone for Next<'_, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O> Copy for Next<'_, O> {}

impl<O> fmt::Debug for Next<'_, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}

// =============================================================================
// CLOSURE DECORATOR
// =============================================================================

/// Adapter that lets a closure act as a [`Decorator`].
pub struct FnDecorator<F> {
    name: String,
    f: F,
}

impl<F> FnDecorator<F> {
    /// Wrap `f` under the given diagnostic name.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<T, F> Decorator<T> for FnDecorator<F>
where
    T: Decoratable,
    F: Fn(&T, &str, &Arguments, Option<Next<'_, T::Output>>) -> Result<T::Output>,
{
    fn handle(
        &self,
        instance: &T,
        method: &str,
        args: &Arguments,
        next: Option<Next<'_, T::Output>>,
    ) -> Result<T::Output> {
        (self.f)(instance, method, args, next)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build a closure decorator for targets of type `T`.
///
/// The bound pins down the closure signature so its arguments need no
/// annotations beyond the target type.
pub fn decorator_fn<T, F>(name: &str, f: F) -> FnDecorator<F>
where
    T: Decoratable,
    F: Fn(&T, &str, &Arguments, Option<Next<'_, T::Output>>) -> Result<T::Output>,
{
    FnDecorator::new(name, f)
}

// =============================================================================
// DECORATOR REFERENCE (DECLARATION)
// =============================================================================

/// One decoration declaration: a decorator instance or the identifier of one.
pub enum DecoratorRef<T: Decoratable> {
    /// A ready-to-use decorator.
    Instance(Arc<dyn Decorator<T>>),
    /// An identifier resolved through a [`DecoratorRegistry`].
    Named(String),
}

impl<T: Decoratable> DecoratorRef<T> {
    /// Declare a concrete decorator.
    pub fn instance(decorator: impl Decorator<T> + 'static) -> Self {
        Self::Instance(Arc::new(decorator))
    }

    /// Declare a decorator through an existing `Arc`.
    ///
    /// The same instance runs on every call, so its state persists between
    /// calls. Whether it may also be shared between targets depends on the
    /// decorator: one whose state is keyed only by method and arguments
    /// needs an instance per target.
    pub fn shared(decorator: Arc<dyn Decorator<T>>) -> Self {
        Self::Instance(decorator)
    }

    /// Declare a decorator by identifier.
    pub fn named(identifier: impl Into<String>) -> Self {
        Self::Named(identifier.into())
    }

    /// The identifier, for named declarations.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Instance(_) => None,
            Self::Named(id) => Some(id),
        }
    }

    /// Turn the declaration attached to `method` into a decorator.
    ///
    /// Named declarations are default-constructed through `registry`; an
    /// unknown identifier is a [`Error::DecoratorNotFound`] naming `T` and
    /// `method`.
    pub fn resolve(
        &self,
        registry: &DecoratorRegistry<T>,
        method: &str,
    ) -> Result<Arc<dyn Decorator<T>>> {
        match self {
            Self::Instance(decorator) => Ok(Arc::clone(decorator)),
            Self::Named(id) => registry
                .resolve(id)
                .ok_or_else(|| Error::decorator_not_found(T::type_name(), method, id.as_str())),
        }
    }
}

impl<T: Decoratable> Clone for DecoratorRef<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Instance(decorator) => Self::Instance(Arc::clone(decorator)),
            Self::Named(id) => Self::Named(id.clone()),
        }
    }
}

impl<T: Decoratable> fmt::Debug for DecoratorRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(decorator) => f.debug_tuple("Instance").field(&decorator.name()).finish(),
            Self::Named(id) => f.debug_tuple("Named").field(id).finish(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
