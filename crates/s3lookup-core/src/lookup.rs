//! Lookup orchestration
//!
//! Ties the pieces together for one key:
//!
//! 1. Return the host-cached value if there is one.
//! 2. Validate the options (before any object-store access).
//! 3. Build the effective key (`prefix + key`).
//! 4. Retrieve from the primary target, failing over on error.
//! 5. Signal "not found" to the host if no object exists.
//! 6. Decode, interpolate, cache, and return the value.

use indexmap::IndexMap;

use crate::context::HostContext;
use crate::decode::decode;
use crate::error::{Error, Result};
use crate::failover::retrieve_with_failover;
use crate::options::LookupOptions;
use crate::propagate::propagate;
use crate::store::ObjectStore;
use crate::value::Value;

/// Outcome of a lookup, as seen by the host
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The key resolved to a value
    Found(Value),
    /// No object exists for the key; the host should keep searching
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// The resolved value, if found
    pub fn value(&self) -> Option<&Value> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound => None,
        }
    }
}

/// Lookup provider bound to an object store.
///
/// Holds no per-lookup state, so one provider can serve concurrent lookups.
#[derive(Debug, Clone)]
pub struct S3Lookup<S> {
    store: S,
}

impl<S: ObjectStore> S3Lookup<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying object store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve `key` with host-supplied options
    pub fn resolve(
        &self,
        key: &str,
        options: &IndexMap<String, Value>,
        ctx: &dyn HostContext,
    ) -> Result<Lookup> {
        if let Some(cached) = cached(key, ctx) {
            return Ok(cached);
        }

        let options = LookupOptions::from_mapping(options)?;
        self.lookup_uncached(key, &options, ctx)
    }

    /// Resolve `key` with already validated options
    pub fn resolve_with(
        &self,
        key: &str,
        options: &LookupOptions,
        ctx: &dyn HostContext,
    ) -> Result<Lookup> {
        if let Some(cached) = cached(key, ctx) {
            return Ok(cached);
        }

        self.lookup_uncached(key, options, ctx)
    }

    fn lookup_uncached(
        &self,
        key: &str,
        options: &LookupOptions,
        ctx: &dyn HostContext,
    ) -> Result<Lookup> {
        if key.is_empty() {
            return Err(Error::configuration("key", "Lookup key must not be empty"));
        }

        let effective_key = options.effective_key(key);

        let Some(bytes) = retrieve_with_failover(&self.store, options, &effective_key, ctx)?
        else {
            return Ok(ctx.not_found());
        };

        let decoded = decode(bytes)?.into_value();
        let value = propagate(decoded, &mut |s: &str| ctx.interpolate(s))?;

        Ok(Lookup::Found(ctx.set_cached(key, value)))
    }
}

fn cached(key: &str, ctx: &dyn HostContext) -> Option<Lookup> {
    if !ctx.has_cached(key) {
        return None;
    }
    let value = ctx.get_cached(key)?;
    log::debug!("Using cached value for '{}'", key);
    Some(Lookup::Found(value))
}

/// Resolve `key` against `store` in one call.
///
/// Convenience for hosts that do not keep an [`S3Lookup`] around.
pub fn lookup_key<S: ObjectStore>(
    key: &str,
    options: &IndexMap<String, Value>,
    ctx: &dyn HostContext,
    store: S,
) -> Result<Lookup> {
    S3Lookup::new(store).resolve(key, options, ctx)
}
