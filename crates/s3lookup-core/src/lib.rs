//! s3lookup-core: configuration key lookup against S3-compatible storage
//!
//! A lookup provider for a hierarchical configuration host. Given a key and
//! a set of options, it fetches `prefix + key` from a primary bucket (with
//! optional failover to a second bucket), decodes the object as YAML with a
//! plain-string fallback, and runs every string through the host's
//! interpolation.
//!
//! # Example
//!
//! ```rust
//! use indexmap::IndexMap;
//! use s3lookup_core::{Lookup, MemoryContext, MemoryStore, S3Lookup, Value};
//!
//! let store = MemoryStore::new().with_object("config", "env/db_host", "db.internal");
//! let lookup = S3Lookup::new(store);
//!
//! let mut options = IndexMap::new();
//! options.insert("primary_bucket".to_string(), Value::from("config"));
//! options.insert("primary_region".to_string(), Value::from("us-east-1"));
//! options.insert("prefix".to_string(), Value::from("env/"));
//!
//! let ctx = MemoryContext::new();
//! let result = lookup.resolve("db_host", &options, &ctx).unwrap();
//! assert_eq!(result, Lookup::Found(Value::from("db.internal")));
//! ```

pub mod context;
pub mod decode;
pub mod error;
pub mod failover;
pub mod lookup;
pub mod options;
pub mod propagate;
pub mod retrieve;
pub mod store;
pub mod value;

pub use context::{HostContext, MemoryContext};
pub use error::{Error, ErrorKind, Result};
pub use lookup::{lookup_key, Lookup, S3Lookup};
pub use options::{LookupOptions, Target};
pub use store::{MemoryStore, ObjectStore, StoreError};
pub use value::Value;
