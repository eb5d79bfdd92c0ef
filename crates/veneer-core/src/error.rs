//! # Error Module
//!
//! The single error type surfaced by every Veneer operation.
//!
//! Three kinds originate in the dispatch engine itself:
//! - `UndefinedMethod`: no method and no ancestor fallback
//! - `NoDecoratorForRestrictedMethod`: a restricted method resolved zero decorators
//! - `DecoratorNotFound`: a declaration named an unregistered decorator
//!
//! Everything raised by a method body or a decorator travels as `Failed`
//! and is forwarded untouched.

use thiserror::Error;

/// Boxed error raised by a method or decorator body.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across Veneer.
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors from Veneer dispatch and from the code it wraps.
#[derive(Debug, Error)]
pub enum Error {
    /// The method exists neither on the target nor behind an ancestor fallback.
    #[error("Call to undefined method {type_name}::{method}()")]
    UndefinedMethod { type_name: String, method: String },

    /// A restricted method was reached without a single decorator.
    #[error("Call to protected method {type_name}::{method}()")]
    NoDecoratorForRestrictedMethod { type_name: String, method: String },

    /// A declaration on `type_name::method` referenced an identifier the
    /// registry does not know.
    #[error("Decorator {identifier} does not exist.")]
    DecoratorNotFound {
        type_name: String,
        method: String,
        identifier: String,
    },

    /// An argument was missing or could not be converted.
    #[error("Invalid argument #{index}: {message}")]
    Argument { index: usize, message: String },

    /// A manifest or config document could not be parsed.
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Raised by a method or decorator body.
    #[error(transparent)]
    Failed(BoxError),
}

impl Error {
    /// Wrap a failure raised by user code.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }

    /// Build an `UndefinedMethod` error.
    pub fn undefined_method(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UndefinedMethod {
            type_name: type_name.into(),
            method: method.into(),
        }
    }

    /// Build a `NoDecoratorForRestrictedMethod` error.
    pub fn restricted_method(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::NoDecoratorForRestrictedMethod {
            type_name: type_name.into(),
            method: method.into(),
        }
    }

    /// Build a `DecoratorNotFound` error.
    pub fn decorator_not_found(
        type_name: impl Into<String>,
        method: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self::DecoratorNotFound {
            type_name: type_name.into(),
            method: method.into(),
            identifier: identifier.into(),
        }
    }

    /// True for the three failure kinds raised by the engine itself.
    ///
    /// These signal misconfiguration and are never worth retrying.
    #[must_use]
    pub fn is_dispatch_failure(&self) -> bool {
        matches!(
            self,
            Self::UndefinedMethod { .. }
                | Self::NoDecoratorForRestrictedMethod { .. }
                | Self::DecoratorNotFound { .. }
        )
    }

    /// Borrow the user error carried by `Failed`, downcast to `E`.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Failed(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("quota exceeded")]
    struct QuotaExceeded;

    #[test]
    fn messages_name_type_and_method() {
        let err = Error::undefined_method("Invoice", "total");
        assert_eq!(err.to_string(), "Call to undefined method Invoice::total()");

        let err = Error::restricted_method("Invoice", "recalculate");
        assert_eq!(
            err.to_string(),
            "Call to protected method Invoice::recalculate()"
        );

        let err = Error::decorator_not_found("Invoice", "total", "NonExistentDecorator");
        assert_eq!(
            err.to_string(),
            "Decorator NonExistentDecorator does not exist."
        );
        assert!(matches!(
            err,
            Error::DecoratorNotFound { ref type_name, ref method, .. }
                if type_name == "Invoice" && method == "total"
        ));
    }

    #[test]
    fn dispatch_failures_are_classified() {
        assert!(Error::undefined_method("A", "b").is_dispatch_failure());
        assert!(Error::restricted_method("A", "b").is_dispatch_failure());
        assert!(Error::decorator_not_found("A", "b", "X").is_dispatch_failure());
        assert!(!Error::failed("boom").is_dispatch_failure());
    }

    #[test]
    fn failed_is_transparent_and_downcastable() {
        let err = Error::failed(QuotaExceeded);
        assert_eq!(err.to_string(), "quota exceeded");
        assert!(err.downcast_ref::<QuotaExceeded>().is_some());
        assert!(Error::failed("plain").downcast_ref::<QuotaExceeded>().is_none());
    }
}
