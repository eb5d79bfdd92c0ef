//! # Veneer Std - The Kit
//!
//! Ready-made decorators for Veneer targets:
//! - [`Trace`]: span + timing per call
//! - [`Memoize`]: deterministic LRU cache of successful results
//! - [`Retry`]: re-run the inner chain after a failure
//! - [`Guard`]: authorization predicate that short-circuits with [`Denied`]
//!
//! `Trace` and `Retry` are stateless (or default-configured) and can be
//! resolved by name; [`register_defaults`] adds them to a registry. `Memoize`
//! and `Guard` carry state or a closure and are declared as instances.

pub mod cache;
pub mod guard;
pub mod memoize;
pub mod retry;
pub mod trace;

pub use cache::{CacheStats, LruCache};
pub use guard::{Denied, Guard, Predicate};
pub use memoize::{Memoize, MemoizeConfig};
pub use retry::{Retry, RetryConfig, is_retryable};
pub use trace::Trace;

use veneer_core::{Decoratable, DecoratorRegistry};

/// Identifier under which [`Trace`] is registered.
pub const TRACE: &str = "trace";

/// Identifier under which [`Retry`] is registered.
pub const RETRY: &str = "retry";

/// Register the name-resolvable decorators of this crate.
pub fn register_defaults<T>(registry: &mut DecoratorRegistry<T>)
where
    T: Decoratable,
    T::Output: Default,
{
    registry.register::<Trace>(TRACE);
    registry.register::<Retry>(RETRY);
}
