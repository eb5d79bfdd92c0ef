//! # Dispatch Engine
//!
//! The interception proxy for Veneer.
//!
//! `Decorated<T>` owns a target and routes every `invoke` through:
//!
//! ```text
//! Lookup ──found──► Resolve ──► Build Chain ──► Invoke ──► result / error
//!    │                 │
//!    │                 └─ restricted + zero decorators ─► NoDecoratorForRestrictedMethod
//!    └─missing──► Delegation ──► ancestor fallback ──► result / error
//!                     └─ no fallback ─► UndefinedMethod
//! ```
//!
//! The chain is rebuilt per call from boxed closures that borrow the
//! captured arguments; nothing outlives the call except the declaration
//! cache.

use crate::arguments::Arguments;
use crate::config::{CachePolicy, DispatchConfig};
use crate::declaration::DeclarationSource;
use crate::decorator::{Decorator, DecoratorRef, Next};
use crate::error::{Error, Result};
use crate::method::{Decoratable, Fallback, MethodDef, MethodTable, Visibility};
use crate::registry::DecoratorRegistry;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Cache slot shared by every method under `CachePolicy::PerObject`.
///
/// Method names are never empty, so this cannot collide with a real method.
const OBJECT_SLOT: &str = "";

/// One link of the call chain.
type Link<'a, O> = Box<dyn Fn() -> Result<O> + 'a>;

// =============================================================================
// DECORATED PROXY
// =============================================================================

/// A target whose method calls go through the decorator chain.
///
/// Single-threaded: the declaration cache lives in a `RefCell`, so the proxy
/// is `!Sync`. No cache borrow is held while the chain runs, so a decorator
/// may call back into the same proxy.
pub struct Decorated<T: Decoratable> {
    /// The wrapped object.
    target: T,

    /// Method table built once from `T::methods()`.
    methods: MethodTable<T>,

    /// Factories for declarations that name their decorator.
    registry: DecoratorRegistry<T>,

    /// Replaces the method table as declaration source when set.
    source: Option<Box<dyn DeclarationSource<T>>>,

    /// Dispatch settings.
    config: DispatchConfig,

    /// Resolved declarations: cache key -> ordered declarations.
    cache: RefCell<BTreeMap<String, Vec<DecoratorRef<T>>>>,
}

impl<T: Decoratable> Decorated<T> {
    /// Wrap a target with an empty registry and default settings.
    pub fn new(target: T) -> Self {
        Self {
            target,
            methods: T::methods(),
            registry: DecoratorRegistry::new(),
            source: None,
            config: DispatchConfig::default(),
            cache: RefCell::new(BTreeMap::new()),
        }
    }

    /// Use `registry` to resolve named declarations.
    #[must_use]
    pub fn with_registry(mut self, registry: DecoratorRegistry<T>) -> Self {
        self.registry = registry;
        self
    }

    /// Read declarations from `source` instead of the method table.
    #[must_use]
    pub fn with_source(mut self, source: impl DeclarationSource<T> + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Apply dispatch settings.
    #[must_use]
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Borrow the wrapped target.
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Unwrap the target, dropping the declaration cache.
    pub fn into_inner(self) -> T {
        self.target
    }

    /// Current dispatch settings.
    #[must_use]
    pub fn config(&self) -> DispatchConfig {
        self.config
    }

    /// The target's method table.
    pub fn methods(&self) -> &MethodTable<T> {
        &self.methods
    }

    /// The registry used for named declarations.
    pub fn registry(&self) -> &DecoratorRegistry<T> {
        &self.registry
    }

    // =========================================================================
    // INVOCATION
    // =========================================================================

    /// Call `method` with `args` through its decorator chain.
    ///
    /// Decorator and method failures come back exactly as raised.
    pub fn invoke(&self, method: &str, args: Arguments) -> Result<T::Output> {
        let Some(def) = self.methods.get(method) else {
            return self.delegate(method, args);
        };

        let decorators = self.resolve(method)?;

        if decorators.is_empty() && def.visibility() == Visibility::Restricted {
            return Err(Error::restricted_method(T::type_name(), method));
        }

        debug!(
            type_name = T::type_name(),
            method,
            decorators = decorators.len(),
            "Dispatching call"
        );

        Self::run_chain(&self.target, def, method, &args, &decorators)
    }

    /// Build the chain so the first decorator ends up outermost, then run it.
    fn run_chain<'a>(
        target: &'a T,
        def: &'a MethodDef<T>,
        method: &'a str,
        args: &'a Arguments,
        decorators: &'a [Arc<dyn Decorator<T>>],
    ) -> Result<T::Output> {
        let mut chain: Link<'a, T::Output> = Box::new(move || def.call(target, args));

        for decorator in decorators.iter().rev() {
            trace!(decorator = decorator.name(), method, "Wrapping chain");
            let inner = chain;
            chain = Box::new(move || {
                decorator.handle(target, method, args, Some(Next::new(&*inner)))
            });
        }

        chain()
    }

    /// Forward an unknown call to the nearest ancestor with a fallback.
    fn delegate(&self, method: &str, args: Arguments) -> Result<T::Output> {
        for ancestor in self.target.ancestors() {
            if let Some(fallback) = ancestor.fallback() {
                debug!(
                    type_name = T::type_name(),
                    ancestor = ancestor.type_name(),
                    method,
                    "Delegating to ancestor fallback"
                );
                return fallback.handle_call(method, args);
            }
        }

        Err(Error::undefined_method(T::type_name(), method))
    }

    // =========================================================================
    // RESOLUTION
    // =========================================================================

    /// Resolve the ordered decorators that apply to `method`.
    ///
    /// May populate the declaration cache. Fails with
    /// [`Error::DecoratorNotFound`] on the first unknown identifier.
    pub fn resolve(&self, method: &str) -> Result<Vec<Arc<dyn Decorator<T>>>> {
        self.declarations(method)
            .iter()
            .map(|declaration| declaration.resolve(&self.registry, method))
            .collect()
    }

    /// Inject the declarations used for `method`, bypassing the source.
    ///
    /// Under `CachePolicy::PerObject` the list applies to every method. An
    /// empty list is ignored.
    pub fn set_declarations(&self, method: &str, declarations: Vec<DecoratorRef<T>>) {
        if declarations.is_empty() {
            return;
        }

        let key = self.cache_key(method).to_string();
        trace!(type_name = T::type_name(), method, "Injecting declarations");
        self.cache.borrow_mut().insert(key, declarations);
    }

    /// Check whether declarations are cached for `method`.
    #[must_use]
    pub fn is_cached(&self, method: &str) -> bool {
        self.cache.borrow().contains_key(self.cache_key(method))
    }

    /// Cached declarations, or a fresh read from the source.
    ///
    /// Only non-empty reads are cached, so an undecorated method is looked up
    /// again on every call.
    fn declarations(&self, method: &str) -> Vec<DecoratorRef<T>> {
        let key = self.cache_key(method);

        if let Some(cached) = self.cache.borrow().get(key) {
            return cached.clone();
        }

        let declarations = match &self.source {
            Some(source) => source.declarations(T::type_name(), method),
            None => self.methods.declarations(T::type_name(), method),
        };

        if !declarations.is_empty() {
            debug!(
                type_name = T::type_name(),
                method,
                declarations = declarations.len(),
                "Caching declarations"
            );
            self.cache
                .borrow_mut()
                .insert(key.to_string(), declarations.clone());
        }

        declarations
    }

    fn cache_key<'m>(&self, method: &'m str) -> &'m str {
        match self.config.cache_policy {
            CachePolicy::PerMethod => method,
            CachePolicy::PerObject => OBJECT_SLOT,
        }
    }
}

impl<T: Decoratable> Fallback<T::Output> for Decorated<T> {
    fn handle_call(&self, method: &str, args: Arguments) -> Result<T::Output> {
        self.invoke(method, args)
    }
}

impl<T: Decoratable> fmt::Debug for Decorated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorated")
            .field("type_name", &T::type_name())
            .field("methods", &self.methods.names().collect::<Vec<_>>())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("cached", &self.cache.borrow().len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::decorator_fn;
    use serde_json::{Value, json};

    struct Greeter;

    impl Decoratable for Greeter {
        type Output = Value;

        fn methods() -> MethodTable<Self> {
            MethodTable::new()
                .method(MethodDef::public("hello", |_: &Greeter, args| {
                    Ok(json!(format!("hello {}", args.get::<String>(0)?)))
                }))
                .method(MethodDef::restricted("secret", |_: &Greeter, _| {
                    Ok(json!("s3cr3t"))
                }))
        }

        fn type_name() -> &'static str {
            "Greeter"
        }
    }

    fn shout() -> DecoratorRef<Greeter> {
        DecoratorRef::instance(decorator_fn::<Greeter, _>("shout", |_, _, _, next| {
            let Some(next) = next else {
                return Ok(Value::Null);
            };
            let value = next.run()?;
            Ok(json!(value.as_str().unwrap_or_default().to_uppercase()))
        }))
    }

    #[test]
    fn public_method_without_decorators_runs_directly() {
        let greeter = Decorated::new(Greeter);
        let result = greeter.invoke("hello", crate::args!["ada"]);
        assert_eq!(result.ok(), Some(json!("hello ada")));
    }

    #[test]
    fn injected_declaration_wraps_public_method() {
        let greeter = Decorated::new(Greeter);
        greeter.set_declarations("hello", vec![shout()]);

        let result = greeter.invoke("hello", crate::args!["ada"]);
        assert_eq!(result.ok(), Some(json!("HELLO ADA")));
        assert!(greeter.is_cached("hello"));
    }

    #[test]
    fn restricted_method_needs_a_decorator() {
        let greeter = Decorated::new(Greeter);
        let result = greeter.invoke("secret", Arguments::new());

        assert!(matches!(
            result,
            Err(Error::NoDecoratorForRestrictedMethod { ref type_name, ref method })
                if type_name == "Greeter" && method == "secret"
        ));
    }

    #[test]
    fn empty_injection_is_ignored() {
        let greeter = Decorated::new(Greeter);
        greeter.set_declarations("hello", Vec::new());
        assert!(!greeter.is_cached("hello"));
    }

    #[test]
    fn per_object_policy_shares_one_slot() {
        let greeter = Decorated::new(Greeter)
            .with_config(DispatchConfig::default().with_cache_policy(CachePolicy::PerObject));
        greeter.set_declarations("hello", vec![shout()]);

        assert!(greeter.is_cached("secret"));
        let result = greeter.invoke("secret", Arguments::new());
        assert_eq!(result.ok(), Some(json!("S3CR3T")));
    }

    #[test]
    fn undefined_without_ancestors() {
        let greeter = Decorated::new(Greeter);
        let result = greeter.invoke("wave", Arguments::new());

        assert!(matches!(
            result,
            Err(Error::UndefinedMethod { ref type_name, ref method })
                if type_name == "Greeter" && method == "wave"
        ));
    }

    #[test]
    fn method_errors_propagate_unchanged() {
        let greeter = Decorated::new(Greeter);
        let result = greeter.invoke("hello", Arguments::new());
        assert!(matches!(result, Err(Error::Argument { index: 0, .. })));
    }
}
