//! Primary/failover sequencing
//!
//! Failover covers an unreachable primary, not a missing object: only a
//! primary [`RetrievalOutcome::Error`] sends the request to the failover
//! target. An error there, or a primary error with no failover configured,
//! is terminal.

use crate::context::HostContext;
use crate::error::{Error, Result};
use crate::options::{LookupOptions, Target};
use crate::retrieve::{fetch, RetrievalOutcome};
use crate::store::ObjectStore;

/// Retrieve `key` from the primary target, falling back to the failover
/// target on error.
///
/// Returns `Ok(Some(bytes))` when found, `Ok(None)` when the object does not
/// exist at the last target queried, and a lookup error when no target
/// remains after a failure.
pub fn retrieve_with_failover(
    store: &dyn ObjectStore,
    options: &LookupOptions,
    key: &str,
    ctx: &dyn HostContext,
) -> Result<Option<Vec<u8>>> {
    let primary = attempt(store, &options.primary, key, ctx);

    if let (RetrievalOutcome::Error(cause), Some(failover)) = (&primary, &options.failover) {
        log::warn!(
            "Primary bucket failure: {} [{}]. Trying {}",
            cause,
            options.primary.uri(key),
            failover
        );
        return settle(attempt(store, failover, key, ctx), failover, key);
    }

    settle(primary, &options.primary, key)
}

fn settle(outcome: RetrievalOutcome, target: &Target, key: &str) -> Result<Option<Vec<u8>>> {
    match outcome {
        RetrievalOutcome::Found(bytes) => Ok(Some(bytes)),
        RetrievalOutcome::NotFound => Ok(None),
        RetrievalOutcome::Error(cause) => Err(Error::lookup(target.uri(key), cause)),
    }
}

fn attempt(
    store: &dyn ObjectStore,
    target: &Target,
    key: &str,
    ctx: &dyn HostContext,
) -> RetrievalOutcome {
    ctx.explain(&|| format!("Looking for {}", target.uri(key)));
    fetch(store, target, key)
}
