//! Lookup option validation
//!
//! Hosts hand the provider a mapping of option names to values. Validation
//! turns that mapping into [`LookupOptions`] or fails with a configuration
//! error naming the offending option, before any object-store access.
//!
//! ```yaml
//! primary_bucket: config-prod
//! primary_region: us-east-1
//! prefix: env/
//! failover_bucket: config-prod-replica
//! failover_region: us-west-2
//! ```
//!
//! Regions are strict: `primary_region` is always required and
//! `failover_region` is required whenever `failover_bucket` is set. No
//! region is ever defaulted.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::value::Value;

pub const PRIMARY_BUCKET: &str = "primary_bucket";
pub const PRIMARY_REGION: &str = "primary_region";
pub const PREFIX: &str = "prefix";
pub const FAILOVER_BUCKET: &str = "failover_bucket";
pub const FAILOVER_REGION: &str = "failover_region";

const KNOWN_OPTIONS: [&str; 5] = [
    PRIMARY_BUCKET,
    PRIMARY_REGION,
    PREFIX,
    FAILOVER_BUCKET,
    FAILOVER_REGION,
];

/// A storage location: one bucket in one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub bucket: String,
    pub region: String,
}

impl Target {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// The `s3://bucket/key` URI for an object in this target
    pub fn uri(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{} ({})", self.bucket, self.region)
    }
}

/// Validated lookup options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOptions {
    /// Where lookups go first
    pub primary: Target,
    /// Prepended to every lookup key with no separator
    pub prefix: String,
    /// Tried only when the primary target fails with an error
    pub failover: Option<Target>,
}

impl LookupOptions {
    /// Options with a primary target only and no prefix
    pub fn new(primary: Target) -> Self {
        Self {
            primary,
            prefix: String::new(),
            failover: None,
        }
    }

    /// Set the key prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the failover target
    pub fn with_failover(mut self, failover: Target) -> Self {
        self.failover = Some(failover);
        self
    }

    /// Validate a host option mapping
    pub fn from_mapping(options: &IndexMap<String, Value>) -> Result<Self> {
        for name in options.keys() {
            if !KNOWN_OPTIONS.contains(&name.as_str()) {
                log::debug!("Ignoring unknown lookup option '{}'", name);
            }
        }

        let primary_bucket = required_string(options, PRIMARY_BUCKET)?;
        let primary_region = required_string(options, PRIMARY_REGION)?;
        let prefix = optional_string(options, PREFIX)?.unwrap_or_default();

        let failover = match optional_string(options, FAILOVER_BUCKET)? {
            Some(bucket) => {
                let region = optional_string(options, FAILOVER_REGION)?.ok_or_else(|| {
                    Error::configuration(
                        FAILOVER_REGION,
                        format!(
                            "'{}' must be defined if '{}' is",
                            FAILOVER_REGION, FAILOVER_BUCKET
                        ),
                    )
                })?;
                non_empty(FAILOVER_BUCKET, &bucket)?;
                non_empty(FAILOVER_REGION, &region)?;
                Some(Target::new(bucket, region))
            }
            None => None,
        };

        non_empty(PRIMARY_BUCKET, &primary_bucket)?;
        non_empty(PRIMARY_REGION, &primary_region)?;

        Ok(Self {
            primary: Target::new(primary_bucket, primary_region),
            prefix,
            failover,
        })
    }

    /// Validate options given as a [`Value`]; anything but a mapping is rejected
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Mapping(map) => Self::from_mapping(map),
            other => Err(Error::configuration(
                "<root>",
                format!("Lookup options must be a mapping, got {}", other.type_name()),
            )),
        }
    }

    /// Parse options from YAML (or JSON) text.
    ///
    /// The options may sit at the top level or be nested under an `options`
    /// key, as in a hierarchy backend entry.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Self::from_value(&Self::mapping_from_yaml(content)?)
    }

    /// Load options from a YAML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_value(&Self::mapping_from_file(path)?)
    }

    /// Read an option mapping from YAML text without validating it
    pub fn mapping_from_yaml(content: &str) -> Result<Value> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| {
            Error::configuration("<root>", format!("Failed to parse options: {}", e))
        })?;
        let value = Value::from_yaml(yaml)?;

        Ok(match value {
            Value::Mapping(mut map) if map.get("options").is_some_and(Value::is_mapping) => {
                map.shift_remove("options").unwrap_or_default()
            }
            other => other,
        })
    }

    /// Read an option mapping from a file without validating it
    pub fn mapping_from_file(path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(
                "<root>",
                format!("Failed to read options file {}: {}", path.display(), e),
            )
        })?;
        Self::mapping_from_yaml(&content)
    }

    /// The object key actually queried: prefix followed by the lookup key
    pub fn effective_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Targets in the order they may be tried
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        std::iter::once(&self.primary).chain(self.failover.as_ref())
    }
}

fn optional_string(options: &IndexMap<String, Value>, name: &str) -> Result<Option<String>> {
    match options.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::configuration(
            name,
            format!("'{}' must be a string, got {}", name, other.type_name()),
        )),
    }
}

fn required_string(options: &IndexMap<String, Value>, name: &str) -> Result<String> {
    optional_string(options, name)?.ok_or_else(|| Error::missing_option(name))
}

fn non_empty(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::configuration(
            name,
            format!("'{}' must not be empty", name),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn mapping(pairs: &[(&str, &str)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    fn option_of(err: &Error) -> &str {
        match &err.kind {
            ErrorKind::Configuration { option } => option.as_str(),
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_minimal_options() {
        let options = LookupOptions::from_mapping(&mapping(&[
            ("primary_bucket", "config"),
            ("primary_region", "us-east-1"),
        ]))
        .unwrap();

        assert_eq!(options, LookupOptions::new(Target::new("config", "us-east-1")));
        assert_eq!(options.prefix, "");
        assert!(options.failover.is_none());
    }

    #[test]
    fn test_full_options() {
        let options = LookupOptions::from_mapping(&mapping(&[
            ("primary_bucket", "config"),
            ("primary_region", "us-east-1"),
            ("prefix", "env/"),
            ("failover_bucket", "replica"),
            ("failover_region", "us-west-2"),
        ]))
        .unwrap();

        assert_eq!(
            options,
            LookupOptions::new(Target::new("config", "us-east-1"))
                .with_prefix("env/")
                .with_failover(Target::new("replica", "us-west-2"))
        );
        assert_eq!(options.targets().count(), 2);
    }

    #[test]
    fn test_missing_primary_bucket() {
        let err = LookupOptions::from_mapping(&mapping(&[("primary_region", "us-east-1")]))
            .unwrap_err();
        assert_eq!(option_of(&err), "primary_bucket");
    }

    #[test]
    fn test_missing_primary_region() {
        let err =
            LookupOptions::from_mapping(&mapping(&[("primary_bucket", "config")])).unwrap_err();
        assert_eq!(option_of(&err), "primary_region");
    }

    #[test]
    fn test_failover_bucket_requires_region() {
        let err = LookupOptions::from_mapping(&mapping(&[
            ("primary_bucket", "config"),
            ("primary_region", "us-east-1"),
            ("failover_bucket", "replica"),
        ]))
        .unwrap_err();

        assert_eq!(option_of(&err), "failover_region");
        assert!(err
            .to_string()
            .contains("'failover_region' must be defined if 'failover_bucket' is"));
    }

    #[test]
    fn test_failover_region_alone_is_ignored() {
        let options = LookupOptions::from_mapping(&mapping(&[
            ("primary_bucket", "config"),
            ("primary_region", "us-east-1"),
            ("failover_region", "us-west-2"),
        ]))
        .unwrap();
        assert!(options.failover.is_none());
    }

    #[test]
    fn test_empty_primary_bucket_rejected() {
        let err = LookupOptions::from_mapping(&mapping(&[
            ("primary_bucket", ""),
            ("primary_region", "us-east-1"),
        ]))
        .unwrap_err();
        assert_eq!(option_of(&err), "primary_bucket");
    }

    #[test]
    fn test_non_string_option_rejected() {
        let mut options = mapping(&[("primary_region", "us-east-1")]);
        options.insert("primary_bucket".into(), Value::Integer(7));

        let err = LookupOptions::from_mapping(&options).unwrap_err();
        assert_eq!(option_of(&err), "primary_bucket");
        assert!(err.to_string().contains("must be a string, got integer"));
    }

    #[test]
    fn test_null_prefix_means_empty() {
        let mut options = mapping(&[("primary_bucket", "config"), ("primary_region", "us-east-1")]);
        options.insert("prefix".into(), Value::Null);

        let options = LookupOptions::from_mapping(&options).unwrap();
        assert_eq!(options.prefix, "");
    }

    #[test]
    fn test_effective_key_concatenates() {
        let options = LookupOptions::new(Target::new("config", "us-east-1")).with_prefix("env/");
        assert_eq!(options.effective_key("db_host"), "env/db_host");

        let options = LookupOptions::new(Target::new("config", "us-east-1")).with_prefix("env");
        assert_eq!(options.effective_key("db_host"), "envdb_host");

        let options = LookupOptions::new(Target::new("config", "us-east-1"));
        assert_eq!(options.effective_key("db_host"), "db_host");
    }

    #[test]
    fn test_from_yaml_top_level() {
        let options = LookupOptions::from_yaml(
            "primary_bucket: config\nprimary_region: eu-west-1\nprefix: common/\n",
        )
        .unwrap();

        assert_eq!(options.primary, Target::new("config", "eu-west-1"));
        assert_eq!(options.prefix, "common/");
    }

    #[test]
    fn test_from_yaml_nested_options() {
        let yaml = r#"
name: s3 data
lookup_key: s3_lookup_key
options:
  primary_bucket: config
  primary_region: eu-west-1
"#;
        let options = LookupOptions::from_yaml(yaml).unwrap();
        assert_eq!(options.primary, Target::new("config", "eu-west-1"));
    }

    #[test]
    fn test_from_json() {
        let options =
            LookupOptions::from_yaml(r#"{"primary_bucket": "config", "primary_region": "ap-south-1"}"#)
                .unwrap();
        assert_eq!(options.primary.region, "ap-south-1");
    }

    #[test]
    fn test_from_yaml_not_mapping() {
        let err = LookupOptions::from_yaml("- a\n- b").unwrap_err();
        assert!(err.to_string().contains("must be a mapping, got sequence"));
    }

    #[test]
    fn test_target_uri() {
        let target = Target::new("config", "us-east-1");
        assert_eq!(target.uri("env/db_host"), "s3://config/env/db_host");
        assert_eq!(target.to_string(), "s3://config (us-east-1)");
    }
}
