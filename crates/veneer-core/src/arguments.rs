//! # Arguments Module
//!
//! The argument list captured for one dispatched call.
//!
//! Arguments are dynamic `serde_json::Value`s so that a single `invoke`
//! entry point can serve every method of a target. Method bodies pull typed
//! values back out with [`Arguments::get`].

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered, owned argument list for a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    /// Create an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from already-built values.
    #[must_use]
    pub fn from_values(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Create from a JSON value: an array spreads into one argument per
    /// element, anything else becomes a single argument.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(values) => Self(values),
            other => Self(vec![other]),
        }
    }

    /// Append a value.
    #[must_use]
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.0.push(value.into());
        self
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the raw value at `index`.
    #[must_use]
    pub fn raw(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Deserialize the argument at `index` into `T`.
    ///
    /// Fails with [`Error::Argument`] when the index is out of range or the
    /// value does not fit `T`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let value = self.0.get(index).ok_or_else(|| Error::Argument {
            index,
            message: format!("missing (only {} supplied)", self.0.len()),
        })?;

        T::deserialize(value).map_err(|e| Error::Argument {
            index,
            message: e.to_string(),
        })
    }

    /// Iterate over the raw values in order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    /// Stable textual form of the whole list.
    ///
    /// Object keys are written in sorted order at every depth, so two
    /// argument lists that compare equal produce equal fingerprints whatever
    /// order their keys were inserted in. Usable as a cache key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        Value::Array(self.0.iter().map(canonical).collect()).to_string()
    }

    /// Consume into the underlying values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

/// Copy of `value` with every object rebuilt in sorted key order.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(key, item)| (key, canonical(item))).collect();
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(key, item)| (key.clone(), item))
                    .collect(),
            )
        }
        other => other.clone(),
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Arguments {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build an [`Arguments`] list from JSON-like literals.
///
/// ```ignore
/// use veneer_core::args;
///
/// let args = args![-2, "EUR", { "rounding": "half-even" }];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Arguments::new()
    };
    ($($tt:tt)+) => {
        $crate::Arguments::from_json($crate::json!([$($tt)+]))
    };
}

// =============================================================================
// TESTS
// =============================================================================
