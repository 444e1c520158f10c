//! Shared S3 client cache.
//!
//! Caches service clients (not just SdkConfig) to enable connection pool reuse.
//! Each unique (region, profile, endpoint) combination gets its own client.

use std::collections::HashMap;
use std::sync::RwLock;

use aws_config::BehaviorVersion;
use once_cell::sync::Lazy;

/// Cache key: (region, profile, endpoint)
type CacheKey = (String, Option<String>, Option<String>);

static CLIENT_CACHE: Lazy<RwLock<HashMap<CacheKey, aws_sdk_s3::Client>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Get or create an S3 client for the given region/profile/endpoint.
///
/// Clients are cached and reused, including their HTTP connection pools.
/// A custom endpoint (LocalStack, moto, MinIO) switches the client to
/// path-style addressing.
pub async fn get_client(
    region: &str,
    profile: Option<&str>,
    endpoint: Option<&str>,
) -> aws_sdk_s3::Client {
    let key = (
        region.to_string(),
        profile.map(|s| s.to_string()),
        endpoint.map(|s| s.to_string()),
    );

    // Try read lock first (fast path for cached clients)
    {
        let cache = CLIENT_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(client) = cache.get(&key) {
            return client.clone();
        }
    }

    // Build new client (slow path - only on first access)
    let mut config_loader = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()));

    if let Some(profile) = profile {
        config_loader = config_loader.profile_name(profile);
    }

    let sdk_config = config_loader.load().await;
    let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
    if let Some(endpoint) = endpoint {
        log::debug!("Using S3 endpoint {}", endpoint);
        s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
    }
    let client = aws_sdk_s3::Client::from_conf(s3_config.build());

    // Cache for future use
    {
        let mut cache = CLIENT_CACHE.write().unwrap_or_else(|e| e.into_inner());
        // Double-check after acquiring write lock (another thread may have inserted)
        cache.entry(key).or_insert_with(|| client.clone());
    }

    client
}

/// Drop every cached client
pub fn clear() {
    CLIENT_CACHE
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .clear();
}
