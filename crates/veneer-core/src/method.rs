//! # Method Module
//!
//! What a decoratable type exposes to the dispatch engine:
//! - its method table (name, visibility, body, attached declarations)
//! - its ancestors, which may carry a fallback handler for unknown calls
//!
//! The method table plays the role of annotation metadata: declarations are
//! attached next to the method they decorate, in order.

use crate::arguments::Arguments;
use crate::decorator::DecoratorRef;
use crate::error::Result;
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// DECORATABLE TRAIT
// =============================================================================

/// A type whose method calls are routed through the dispatch engine.
///
/// ```ignore
/// impl Decoratable for Invoice {
///     type Output = Value;
///
///     fn methods() -> MethodTable<Self> {
///         MethodTable::new().method(
///             MethodDef::restricted("total", |invoice: &Invoice, _| Ok(json!(invoice.total())))
///                 .decorated_with(DecoratorRef::named("trace")),
///         )
///     }
/// }
/// ```
pub trait Decoratable: Sized + 'static {
    /// What every method of this type returns.
    ///
    /// Pick a future here to route asynchronous methods; the engine forwards
    /// it without polling.
    type Output;

    /// Build the method table for this type.
    ///
    /// Called once when the target is wrapped.
    fn methods() -> MethodTable<Self>;

    /// Declared type name used in diagnostics and manifest lookups.
    ///
    /// Defaults to the full Rust path (`my_crate::Invoice`). Override it
    /// when a [`Manifest`](crate::Manifest) keys this type by a short name.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Ancestor types, nearest first.
    ///
    /// Consulted only when a call names a method the table does not define.
    fn ancestors(&self) -> Vec<Ancestor<'_, Self::Output>> {
        Vec::new()
    }
}

// =============================================================================
// METHODS
// =============================================================================

/// Whether outside code may call a method without any decorator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    /// Callable directly; decorators are optional.
    Public,
    /// Reachable only through at least one decorator.
    Restricted,
}

/// Body of a method: target and captured arguments in, output out.
pub type MethodBody<T> = Box<dyn Fn(&T, &Arguments) -> Result<<T as Decoratable>::Output>>;

/// One method definition with its attached declarations.
pub struct MethodDef<T: Decoratable> {
    name: String,
    visibility: Visibility,
    body: MethodBody<T>,
    declarations: Vec<DecoratorRef<T>>,
}

impl<T: Decoratable> MethodDef<T> {
    /// Define a method with the given visibility.
    pub fn new<F>(name: impl Into<String>, visibility: Visibility, body: F) -> Self
    where
        F: Fn(&T, &Arguments) -> Result<T::Output> + 'static,
    {
        Self {
            name: name.into(),
            visibility,
            body: Box::new(body),
            declarations: Vec::new(),
        }
    }

    /// Define a public method.
    pub fn public<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&T, &Arguments) -> Result<T::Output> + 'static,
    {
        Self::new(name, Visibility::Public, body)
    }

    /// Define a restricted method.
    pub fn restricted<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&T, &Arguments) -> Result<T::Output> + 'static,
    {
        Self::new(name, Visibility::Restricted, body)
    }

    /// Attach a declaration. Order of calls is execution order.
    #[must_use]
    pub fn decorated_with(mut self, declaration: DecoratorRef<T>) -> Self {
        self.declarations.push(declaration);
        self
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method visibility.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Attached declarations, in declared order.
    #[must_use]
    pub fn declarations(&self) -> &[DecoratorRef<T>] {
        &self.declarations
    }

    /// Run the undecorated body.
    pub fn call(&self, target: &T, args: &Arguments) -> Result<T::Output> {
        (self.body)(target, args)
    }
}

impl<T: Decoratable> fmt::Debug for MethodDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("declarations", &self.declarations)
            .finish()
    }
}

/// All methods of one type, keyed by name.
pub struct MethodTable<T: Decoratable> {
    methods: BTreeMap<String, MethodDef<T>>,
}

impl<T: Decoratable> MethodTable<T> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: BTreeMap::new(),
        }
    }

    /// Add a method. A later definition with the same name replaces the
    /// earlier one.
    #[must_use]
    pub fn method(mut self, def: MethodDef<T>) -> Self {
        self.insert(def);
        self
    }

    /// Add a method in place.
    pub fn insert(&mut self, def: MethodDef<T>) {
        self.methods.insert(def.name.clone(), def);
    }

    /// Lookup a method by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MethodDef<T>> {
        self.methods.get(name)
    }

    /// Check if a method exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Method names in deterministic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Number of methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Check if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl<T: Decoratable> Default for MethodTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Decoratable> fmt::Debug for MethodTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.methods.values()).finish()
    }
}

// =============================================================================
// ANCESTORS & FALLBACK
// =============================================================================

/// Catch-all handler for calls a type does not define itself.
pub trait Fallback<O> {
    /// Handle a call to `method` that no method table matched.
    fn handle_call(&self, method: &str, args: Arguments) -> Result<O>;
}

/// One ancestor in a type's lineage.
pub struct Ancestor<'a, O> {
    type_name: &'a str,
    fallback: Option<&'a dyn Fallback<O>>,
}

impl<'a, O> Ancestor<'a, O> {
    /// An ancestor without a fallback handler.
    #[must_use]
    pub fn plain(type_name: &'a str) -> Self {
        Self {
            type_name,
            fallback: None,
        }
    }

    /// An ancestor that handles unknown calls.
    pub fn with_fallback(type_name: &'a str, fallback: &'a dyn Fallback<O>) -> Self {
        Self {
            type_name,
            fallback: Some(fallback),
        }
    }

    /// Ancestor type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.type_name
    }

    /// The fallback handler, if this ancestor has one.
    #[must_use]
    pub fn fallback(&self) -> Option<&'a dyn Fallback<O>> {
        self.fallback
    }
}

impl<O> fmt::Debug for Ancestor<'_, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ancestor")
            .field("type_name", &self.type_name)
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
