//! Host context
//!
//! The host resolution pipeline owns the lookup cache, the interpolation
//! engine, and diagnostic tracing. The provider only calls into it through
//! [`HostContext`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::lookup::Lookup;
use crate::value::Value;

/// Capabilities the host hands to every lookup.
///
/// Implementations are responsible for synchronizing their own cache; the
/// provider never holds locks across calls.
pub trait HostContext: Send + Sync {
    /// Whether a value has been cached for `key`
    fn has_cached(&self, key: &str) -> bool;

    /// The cached value for `key`, if any
    fn get_cached(&self, key: &str) -> Option<Value>;

    /// Cache `value` under `key` and return the stored value
    fn set_cached(&self, key: &str, value: Value) -> Value;

    /// The host's "not found" signal. Lets the host continue down its
    /// hierarchy instead of treating the key as resolved.
    fn not_found(&self) -> Lookup {
        Lookup::NotFound
    }

    /// Interpolate a single string
    fn interpolate(&self, input: &str) -> Result<String>;

    /// Emit a diagnostic message. The message is only built when tracing is on.
    fn explain(&self, message: &dyn Fn() -> String);
}

/// Interpolation function used by [`MemoryContext`]
pub type InterpolateFn = dyn Fn(&str) -> Result<String> + Send + Sync;

/// A self-contained host context with an in-memory cache.
///
/// Interpolation defaults to identity; explain messages go to the `log`
/// facade at debug level and are also recorded for inspection.
pub struct MemoryContext {
    cache: RwLock<HashMap<String, Value>>,
    interpolate: Arc<InterpolateFn>,
    explained: RwLock<Vec<String>>,
}

impl MemoryContext {
    /// Create a context with identity interpolation
    pub fn new() -> Self {
        Self::with_interpolation(|s| Ok(s.to_string()))
    }

    /// Create a context with a custom interpolation function
    pub fn with_interpolation<F>(interpolate: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            cache: RwLock::new(HashMap::new()),
            interpolate: Arc::new(interpolate),
            explained: RwLock::new(Vec::new()),
        }
    }

    /// Messages passed to [`HostContext::explain`], oldest first
    pub fn explanations(&self) -> Vec<String> {
        self.explained
            .read()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Drop every cached value
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }
}

impl Default for MemoryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.cache.read().map(|c| c.len()).unwrap_or_default();
        f.debug_struct("MemoryContext")
            .field("cached", &cached)
            .finish_non_exhaustive()
    }
}

impl HostContext for MemoryContext {
    fn has_cached(&self, key: &str) -> bool {
        self.cache
            .read()
            .map(|c| c.contains_key(key))
            .unwrap_or(false)
    }

    fn get_cached(&self, key: &str) -> Option<Value> {
        self.cache.read().ok()?.get(key).cloned()
    }

    fn set_cached(&self, key: &str, value: Value) -> Value {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key.to_string(), value.clone());
        }
        value
    }

    fn interpolate(&self, input: &str) -> Result<String> {
        (self.interpolate)(input)
    }

    fn explain(&self, message: &dyn Fn() -> String) {
        let message = message();
        log::debug!("{}", message);
        if let Ok(mut explained) = self.explained.write() {
            explained.push(message);
        }
    }
}

/// Interpolation that fails on any string containing `marker`. Test helper.
#[cfg(test)]
pub(crate) fn failing_on(marker: &'static str) -> impl Fn(&str) -> Result<String> + Send + Sync {
    move |s: &str| {
        if s.contains(marker) {
            Err(crate::error::Error::interpolation(format!("Undefined variable in '{}'", s)))
        } else {
            Ok(s.to_string())
        }
    }
}
