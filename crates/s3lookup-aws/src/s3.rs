//! S3 object store
//!
//! Implements [`ObjectStore`] on top of the AWS SDK. The SDK handles
//! credentials, retries, and timeouts; this module only maps its errors onto
//! [`StoreError`].

use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use s3lookup_core::store::{ObjectStore, StoreError};
use tokio::runtime::Runtime;

use crate::client_cache;

/// Object store backed by Amazon S3 (or any S3-compatible endpoint).
///
/// Requests are driven on an owned Tokio runtime, so the store must not be
/// used from inside another Tokio runtime.
///
/// The region passed with each request selects the client; endpoint and
/// profile come from [`crate::configure`] and [`crate::configure_s3`].
pub struct S3ObjectStore {
    runtime: Runtime,
}

impl S3ObjectStore {
    /// Create a new S3 object store.
    pub fn new() -> std::io::Result<Self> {
        let runtime = Runtime::new()?;
        Ok(Self { runtime })
    }

    /// Fetch an object from S3 as raw bytes.
    async fn fetch_object_bytes(
        &self,
        bucket: &str,
        region: &str,
        key: &str,
    ) -> Result<Vec<u8>, StoreError> {
        let (endpoint, profile) = crate::resolve_s3_config();

        // Get cached client (creates one if needed)
        let client =
            client_cache::get_client(region, profile.as_deref(), endpoint.as_deref()).await;

        let response = client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        // Read the body as raw bytes
        let body: ByteStream = response.body;
        let bytes = body.collect().await.map_err(|e| {
            StoreError::other(format!("Failed to read S3 object body: {}", e))
        })?;

        Ok(bytes.into_bytes().to_vec())
    }
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore").finish_non_exhaustive()
    }
}

impl ObjectStore for S3ObjectStore {
    fn get_object(&self, bucket: &str, region: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.runtime
            .block_on(self.fetch_object_bytes(bucket, region, key))
    }
}

/// Map a GetObject failure: `NoSuchKey` is absence, everything else
/// (transport, timeouts, AccessDenied, NoSuchBucket, ...) is an error.
fn classify<R: std::fmt::Debug>(err: SdkError<GetObjectError, R>) -> StoreError {
    match err.as_service_error() {
        Some(service) => classify_service_error(service),
        None => StoreError::Other(DisplayErrorContext(&err).to_string()),
    }
}

fn classify_service_error(err: &GetObjectError) -> StoreError {
    if err.is_no_such_key() {
        StoreError::NoSuchKey
    } else {
        StoreError::Other(DisplayErrorContext(err).to_string())
    }
}
