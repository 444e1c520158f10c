//! Amazon S3 object store for s3lookup
//!
//! Provides [`S3ObjectStore`], an [`s3lookup_core::ObjectStore`] backed by
//! the AWS SDK, and process-wide defaults for profile and endpoint. The region of each
//! request always comes from the lookup target.
//!
//! ```rust,ignore
//! use s3lookup_aws::S3ObjectStore;
//! use s3lookup_core::S3Lookup;
//!
//! s3lookup_aws::configure_s3(Some("http://localhost:4566".to_string()), None);
//! let lookup = S3Lookup::new(S3ObjectStore::new()?);
//! ```

use once_cell::sync::Lazy;
use std::sync::RwLock;

#[cfg(feature = "s3")]
mod client_cache;

#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;

// =============================================================================
// Configuration
// =============================================================================

/// Global configuration (applies to all AWS access)
#[derive(Clone, Default, Debug)]
struct GlobalConfig {
    profile: Option<String>,
}

/// S3-specific configuration
#[derive(Clone, Default, Debug)]
struct S3Config {
    endpoint: Option<String>,
    profile: Option<String>,
}

static GLOBAL_CONFIG: Lazy<RwLock<GlobalConfig>> = Lazy::new(Default::default);
static S3_CONFIG: Lazy<RwLock<S3Config>> = Lazy::new(Default::default);

/// Configure global AWS defaults.
///
/// Regions always come from the lookup target, so only the profile is
/// configurable here. Profile precedence (highest to lowest):
/// 1. S3-specific configuration (`configure_s3()`)
/// 2. Global configuration (`configure()`)
/// 3. AWS SDK defaults (environment variables, credentials file)
///
/// Pass `None` to leave the value unchanged.
pub fn configure(profile: Option<String>) {
    let mut config = GLOBAL_CONFIG.write().unwrap_or_else(|e| e.into_inner());
    if let Some(p) = profile {
        config.profile = Some(p);
    }
}

/// Configure S3-specific defaults.
///
/// * `endpoint` - S3 endpoint URL (for LocalStack/moto/MinIO, e.g., "http://localhost:4566").
/// * `profile` - AWS profile name (overrides global profile).
///
/// Pass `None` to leave a value unchanged.
pub fn configure_s3(endpoint: Option<String>, profile: Option<String>) {
    let mut config = S3_CONFIG.write().unwrap_or_else(|e| e.into_inner());
    if let Some(e) = endpoint {
        config.endpoint = Some(e);
    }
    if let Some(p) = profile {
        config.profile = Some(p);
    }
}

/// Reset all configuration and clear the client cache.
///
/// Useful for test isolation.
pub fn reset() {
    *GLOBAL_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = Default::default();
    *S3_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = Default::default();
    #[cfg(feature = "s3")]
    client_cache::clear();
}

/// Resolve the configured S3 endpoint and profile.
///
/// Precedence: S3 config > global config. Returns `(endpoint, profile)`.
pub(crate) fn resolve_s3_config() -> (Option<String>, Option<String>) {
    let global = GLOBAL_CONFIG.read().unwrap_or_else(|e| e.into_inner());
    let service = S3_CONFIG.read().unwrap_or_else(|e| e.into_inner());

    let endpoint = service.endpoint.clone();
    let profile = service.profile.clone().or_else(|| global.profile.clone());

    (endpoint, profile)
}
