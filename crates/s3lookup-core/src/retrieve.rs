//! Single-target retrieval
//!
//! Wraps one object-store call and normalizes the result into a
//! [`RetrievalOutcome`].

use crate::options::Target;
use crate::store::{ObjectStore, StoreError};

/// Result of querying one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalOutcome {
    /// The object exists; its full body
    Found(Vec<u8>),
    /// The object legitimately does not exist at this target
    NotFound,
    /// Anything else went wrong; the cause as reported by the store
    Error(String),
}

impl RetrievalOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, RetrievalOutcome::Error(_))
    }
}

/// Fetch `key` from `target`.
///
/// Only [`StoreError::NoSuchKey`] becomes [`RetrievalOutcome::NotFound`];
/// every other store failure is an [`RetrievalOutcome::Error`].
pub fn fetch(store: &dyn ObjectStore, target: &Target, key: &str) -> RetrievalOutcome {
    log::debug!("Fetching {} from region {}", target.uri(key), target.region);

    match store.get_object(&target.bucket, &target.region, key) {
        Ok(bytes) => RetrievalOutcome::Found(bytes),
        Err(StoreError::NoSuchKey) => {
            log::debug!("{} does not exist", target.uri(key));
            RetrievalOutcome::NotFound
        }
        Err(StoreError::Other(cause)) => RetrievalOutcome::Error(cause),
    }
}
