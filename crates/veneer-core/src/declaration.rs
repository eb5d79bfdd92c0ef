//! # Declaration Module
//!
//! Where the ordered decoration declarations for a method come from.
//!
//! The dispatch engine only ever asks one question: "given this type and
//! method name, which declarations apply, in order?". Two answers ship here:
//! - [`MethodTable`]: declarations attached next to each method definition
//! - [`Manifest`]: a config map `type -> method -> [identifier]` parsed from JSON
//!
//! Anything else (generated code, a host's own config) implements
//! [`DeclarationSource`].

use crate::decorator::DecoratorRef;
use crate::error::Result;
use crate::method::{Decoratable, MethodTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// DECLARATION SOURCE TRAIT
// =============================================================================

/// Supplies the ordered declarations attached to a method.
pub trait DeclarationSource<T: Decoratable> {
    /// Declarations for `type_name::method`, in declared order.
    ///
    /// An empty list means the method is undecorated.
    fn declarations(&self, type_name: &str, method: &str) -> Vec<DecoratorRef<T>>;
}

impl<T: Decoratable> DeclarationSource<T> for MethodTable<T> {
    fn declarations(&self, _type_name: &str, method: &str) -> Vec<DecoratorRef<T>> {
        self.get(method)
            .map(|def| def.declarations().to_vec())
            .unwrap_or_default()
    }
}

// =============================================================================
// MANIFEST
// =============================================================================

/// Declarations kept as data: type name -> method name -> identifiers.
///
/// ```text
/// {
///   "Invoice": {
///     "total":  ["trace", "memoize"],
///     "refund": ["guard", "retry"]
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    types: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl Manifest {
    /// Create an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize back to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Append `identifier` to the declarations of `type_name::method`.
    #[must_use]
    pub fn declare(
        mut self,
        type_name: impl Into<String>,
        method: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        self.types
            .entry(type_name.into())
            .or_default()
            .entry(method.into())
            .or_default()
            .push(identifier.into());
        self
    }

    /// Identifiers declared for `type_name::method`.
    #[must_use]
    pub fn identifiers(&self, type_name: &str, method: &str) -> &[String] {
        self.types
            .get(type_name)
            .and_then(|methods| methods.get(method))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Type names with at least one entry (sorted).
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

impl<T: Decoratable> DeclarationSource<T> for Manifest {
    fn declarations(&self, type_name: &str, method: &str) -> Vec<DecoratorRef<T>> {
        self.identifiers(type_name, method)
            .iter()
            .map(|id| DecoratorRef::named(id.as_str()))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
