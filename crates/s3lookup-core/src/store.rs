//! Object store seam
//!
//! The provider reads objects through [`ObjectStore`]. Credentials,
//! transport, and retries belong to the implementation. The one thing every
//! implementation must get right is keeping "the object does not exist"
//! apart from every other failure.

use std::collections::HashMap;
use std::sync::RwLock;

/// Failure reported by an object store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The bucket exists but holds no object under the key
    #[error("no such key")]
    NoSuchKey,
    /// Any other failure: network, permissions, malformed request, timeout
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn other(message: impl Into<String>) -> Self {
        StoreError::Other(message.into())
    }
}

/// Read access to an S3-compatible object store
pub trait ObjectStore: Send + Sync {
    /// Fetch the full body of `key` in `bucket`, talking to `region`
    fn get_object(
        &self,
        bucket: &str,
        region: &str,
        key: &str,
    ) -> std::result::Result<Vec<u8>, StoreError>;
}

impl<S: ObjectStore + ?Sized> ObjectStore for &S {
    fn get_object(
        &self,
        bucket: &str,
        region: &str,
        key: &str,
    ) -> std::result::Result<Vec<u8>, StoreError> {
        (**self).get_object(bucket, region, key)
    }
}

impl<S: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<S> {
    fn get_object(
        &self,
        bucket: &str,
        region: &str,
        key: &str,
    ) -> std::result::Result<Vec<u8>, StoreError> {
        (**self).get_object(bucket, region, key)
    }
}

/// One recorded call to [`MemoryStore::get_object`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub bucket: String,
    pub region: String,
    pub key: String,
}

/// In-memory object store that records every request.
///
/// Objects are addressed by bucket and key; a bucket can be marked as
/// failing to simulate an unreachable target.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    failing: RwLock<HashMap<String, String>>,
    calls: RwLock<Vec<StoreCall>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object
    pub fn with_object(self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) -> Self {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert((bucket.to_string(), key.to_string()), body.into());
        }
        self
    }

    /// Make every request against `bucket` fail with `message`
    pub fn with_failing_bucket(self, bucket: &str, message: &str) -> Self {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(bucket.to_string(), message.to_string());
        }
        self
    }

    /// Requests made so far, oldest first
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }
}

impl ObjectStore for MemoryStore {
    fn get_object(
        &self,
        bucket: &str,
        region: &str,
        key: &str,
    ) -> std::result::Result<Vec<u8>, StoreError> {
        if let Ok(mut calls) = self.calls.write() {
            calls.push(StoreCall {
                bucket: bucket.to_string(),
                region: region.to_string(),
                key: key.to_string(),
            });
        }

        let failing = self
            .failing
            .read()
            .map_err(|_| StoreError::other("store lock poisoned"))?;
        if let Some(message) = failing.get(bucket) {
            return Err(StoreError::Other(message.clone()));
        }

        self.objects
            .read()
            .map_err(|_| StoreError::other("store lock poisoned"))?
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or(StoreError::NoSuchKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memory_store_found() {
        let store = MemoryStore::new().with_object("config", "db_host", "db.internal");
        assert_eq!(
            store.get_object("config", "us-east-1", "db_host").unwrap(),
            b"db.internal".to_vec()
        );
    }

    #[test]
    fn test_memory_store_missing_key() {
        let store = MemoryStore::new();
        assert_eq!(
            store.get_object("config", "us-east-1", "db_host"),
            Err(StoreError::NoSuchKey)
        );
    }

    #[test]
    fn test_memory_store_failing_bucket() {
        let store = MemoryStore::new()
            .with_object("config", "db_host", "db.internal")
            .with_failing_bucket("config", "AccessDenied");
        assert_eq!(
            store.get_object("config", "us-east-1", "db_host"),
            Err(StoreError::Other("AccessDenied".into()))
        );
    }

    #[test]
    fn test_memory_store_records_calls() {
        let store = MemoryStore::new();
        let _ = store.get_object("config", "eu-west-1", "a");
        let _ = store.get_object("replica", "eu-central-1", "b");

        assert_eq!(
            store.calls(),
            vec![
                StoreCall {
                    bucket: "config".into(),
                    region: "eu-west-1".into(),
                    key: "a".into(),
                },
                StoreCall {
                    bucket: "replica".into(),
                    region: "eu-central-1".into(),
                    key: "b".into(),
                },
            ]
        );
    }

    #[test]
    fn test_store_error_display() {
        assert_eq!(StoreError::NoSuchKey.to_string(), "no such key");
        assert_eq!(StoreError::other("timeout").to_string(), "timeout");
    }
}
