//! # Guard
//!
//! Authorization check in front of a method. The predicate sees the target,
//! the method name and the arguments; a rejection short-circuits the chain
//! with [`Denied`] wrapped in `Error::Failed`.

use thiserror::Error;
use tracing::debug;
use veneer_core::{Arguments, Decoratable, Decorator, Error as VeneerError, Next, Result};

/// Raised when a guard rejects a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Access to {type_name}::{method}() denied")]
pub struct Denied {
    /// Declared type name of the target.
    pub type_name: String,
    /// Rejected method.
    pub method: String,
}

/// Authorization predicate.
pub type Predicate<T> = Box<dyn Fn(&T, &str, &Arguments) -> bool>;

/// Predicate-driven access check.
pub struct Guard<T> {
    predicate: Predicate<T>,
}

impl<T: Decoratable> Guard<T> {
    /// Allow a call only when `predicate` returns true.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T, &str, &Arguments) -> bool + 'static,
    {
        Self {
            predicate: Box::new(predicate),
        }
    }

    /// Reject every call.
    #[must_use]
    pub fn deny_all() -> Self {
        Self::new(|_, _, _| false)
    }

    /// Whether a call would be let through.
    pub fn permits(&self, instance: &T, method: &str, args: &Arguments) -> bool {
        (self.predicate)(instance, method, args)
    }
}

impl<T> Decorator<T> for Guard<T>
where
    T: Decoratable,
    T::Output: Default,
{
    fn handle(
        &self,
        instance: &T,
        method: &str,
        args: &Arguments,
        next: Option<Next<'_, T::Output>>,
    ) -> Result<T::Output> {
        if !self.permits(instance, method, args) {
            debug!(type_name = T::type_name(), method, "Guard rejected call");
            return Err(VeneerError::failed(Denied {
                type_name: T::type_name().to_string(),
                method: method.to_string(),
            }));
        }

        next.map_or_else(|| Ok(T::Output::default()), |next| next.run())
    }

    fn name(&self) -> &str {
        "guard"
    }
}

impl<T> std::fmt::Debug for Guard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}
