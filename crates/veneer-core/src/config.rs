//! # Config Module
//!
//! Dispatch settings for a decorated object.
//!
//! Settings are plain serde data so they can be embedded in a host
//! application's own configuration document.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// How resolved declarations are cached on a decorated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// One cache slot per method name.
    #[default]
    PerMethod,
    /// One cache slot for the whole object: the first non-empty list
    /// resolved is reused for every later call, whatever the method.
    PerObject,
}

/// Settings for a `Decorated` proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Declaration cache keying.
    pub cache_policy: CachePolicy,
}

impl DispatchConfig {
    /// Parse from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder: set the cache policy.
    #[must_use]
    pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
