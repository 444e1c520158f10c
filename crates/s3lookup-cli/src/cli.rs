//! s3lookup CLI - resolve configuration keys from S3 from the command line
//!
//! Usage:
//!   s3lookup get db_host --primary-bucket config --primary-region us-east-1
//!   s3lookup get db_host --options hiera-s3.yaml --format json
//!   s3lookup check db_host --options hiera-s3.yaml

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use s3lookup_aws::S3ObjectStore;
use s3lookup_core::options::{
    FAILOVER_BUCKET, FAILOVER_REGION, PREFIX, PRIMARY_BUCKET, PRIMARY_REGION,
};
use s3lookup_core::{Lookup, LookupOptions, MemoryContext, S3Lookup, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// s3lookup - Resolve configuration keys from S3-compatible object storage
#[derive(Parser, Debug)]
#[command(name = "s3lookup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a key and print its value
    Get {
        /// Lookup key (prefix is prepended)
        key: String,

        #[command(flatten)]
        options: OptionArgs,

        /// S3 endpoint URL (LocalStack, moto, MinIO)
        #[arg(long)]
        endpoint: Option<String>,

        /// AWS profile name
        #[arg(long)]
        profile: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Value to print if the key is not found
        #[arg(short, long)]
        default: Option<String>,
    },

    /// Validate options and show where a key would be looked up, without
    /// contacting S3
    Check {
        /// Lookup key (prefix is prepended)
        key: String,

        #[command(flatten)]
        options: OptionArgs,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Scalars bare, collections as YAML
    Text,
    Json,
    Yaml,
}

/// Lookup options, from a file and/or flags (flags win)
#[derive(Args, Debug, Default)]
struct OptionArgs {
    /// YAML/JSON file with lookup options (top level or under `options:`)
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Primary bucket name
    #[arg(long)]
    primary_bucket: Option<String>,

    /// Primary bucket region
    #[arg(long)]
    primary_region: Option<String>,

    /// Prefix prepended to the key (no separator is added)
    #[arg(long)]
    prefix: Option<String>,

    /// Bucket to try when the primary bucket fails
    #[arg(long)]
    failover_bucket: Option<String>,

    /// Region of the failover bucket
    #[arg(long)]
    failover_region: Option<String>,
}

impl OptionArgs {
    /// Merge the options file (if any) with flag overrides
    fn to_mapping(&self) -> Result<Value, String> {
        let mut mapping = match &self.options {
            Some(path) => LookupOptions::mapping_from_file(path).map_err(|e| e.to_string())?,
            None => Value::Mapping(Default::default()),
        };

        // A non-mapping file is left as is for validation to report
        if let Value::Mapping(map) = &mut mapping {
            let overrides = [
                (PRIMARY_BUCKET, &self.primary_bucket),
                (PRIMARY_REGION, &self.primary_region),
                (PREFIX, &self.prefix),
                (FAILOVER_BUCKET, &self.failover_bucket),
                (FAILOVER_REGION, &self.failover_region),
            ];
            for (name, value) in overrides {
                if let Some(v) = value {
                    map.insert(name.to_string(), Value::String(v.clone()));
                }
            }
        }

        Ok(mapping)
    }

    fn load(&self) -> Result<LookupOptions, String> {
        LookupOptions::from_value(&self.to_mapping()?).map_err(|e| e.to_string())
    }
}

/// Run the CLI with the given arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Get {
            key,
            options,
            endpoint,
            profile,
            format,
            default,
        } => cmd_get(&key, &options, endpoint, profile, format, default),

        Commands::Check { key, options } => cmd_check(&key, &options),
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Also bridges `log` records from the library crates
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn cmd_get(
    key: &str,
    option_args: &OptionArgs,
    endpoint: Option<String>,
    profile: Option<String>,
    format: OutputFormat,
    default: Option<String>,
) -> ExitCode {
    let options = match option_args.load() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    s3lookup_aws::configure_s3(endpoint, profile);

    let store = match S3ObjectStore::new() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start async runtime".red(), e);
            return ExitCode::from(2);
        }
    };

    let lookup = S3Lookup::new(store);
    let ctx = MemoryContext::new();

    match lookup.resolve_with(key, &options, &ctx) {
        Ok(Lookup::Found(value)) => match render(&value, format) {
            Ok(output) => {
                print!("{}", output);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                ExitCode::from(1)
            }
        },
        Ok(Lookup::NotFound) => {
            if let Some(default_val) = default {
                println!("{}", default_val);
                ExitCode::SUCCESS
            } else {
                eprintln!("{}: Key '{}' not found", "Error".red(), key);
                ExitCode::from(1)
            }
        }
        Err(e) if e.is_configuration() => {
            eprintln!("{}", e.to_string().red());
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_check(key: &str, option_args: &OptionArgs) -> ExitCode {
    let options = match option_args.load() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            return ExitCode::from(2);
        }
    };

    if key.is_empty() {
        eprintln!("{} Lookup key must not be empty", "✗".red());
        return ExitCode::from(2);
    }

    let effective_key = options.effective_key(key);
    println!("{} options are valid", "✓".green());
    for (i, target) in options.targets().enumerate() {
        let role = if i == 0 { "primary" } else { "failover" };
        println!(
            "  {}: {} ({})",
            role,
            target.uri(&effective_key),
            target.region
        );
    }

    ExitCode::SUCCESS
}

/// Format a resolved value for output
fn render(value: &Value, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map(|s| format!("{}\n", s))
            .map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        OutputFormat::Text => match value {
            Value::String(s) => Ok(format!("{}\n", s)),
            Value::Integer(i) => Ok(format!("{}\n", i)),
            Value::Float(f) => Ok(format!("{}\n", f)),
            Value::Bool(b) => Ok(format!("{}\n", b)),
            Value::Null => Ok("null\n".to_string()),
            // For complex values, output as YAML
            _ => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use s3lookup_core::Target;

    #[test]
    fn test_parse_get_with_flags() {
        let cli = Cli::try_parse_from([
            "s3lookup",
            "get",
            "db_host",
            "--primary-bucket",
            "config",
            "--primary-region",
            "us-east-1",
            "--prefix",
            "env/",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Get {
                key,
                options,
                format,
                ..
            } => {
                assert_eq!(key, "db_host");
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(
                    options.load().unwrap(),
                    LookupOptions::new(Target::new("config", "us-east-1")).with_prefix("env/")
                );
            }
            other => panic!("Expected get, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_get_defaults_to_text() {
        let cli = Cli::try_parse_from(["s3lookup", "get", "db_host"]).unwrap();
        match cli.command {
            Commands::Get { format, .. } => assert_eq!(format, OutputFormat::Text),
            other => panic!("Expected get, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_format_rejected() {
        let err = Cli::try_parse_from(["s3lookup", "get", "db_host", "--format", "toml"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_parse_verbose_count() {
        let cli = Cli::try_parse_from(["s3lookup", "-vv", "check", "k"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_missing_region_flag_fails_validation() {
        let args = OptionArgs {
            primary_bucket: Some("config".into()),
            ..Default::default()
        };
        let err = args.load().unwrap_err();
        assert!(err.contains("primary_region"));
    }

    #[test]
    fn test_flags_override_options_file() {
        let dir = std::env::temp_dir().join(format!("s3lookup-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("options.yaml");
        std::fs::write(
            &path,
            "options:\n  primary_bucket: from-file\n  primary_region: us-east-1\n  prefix: file/\n",
        )
        .unwrap();

        let args = OptionArgs {
            options: Some(path.clone()),
            primary_bucket: Some("from-flag".into()),
            ..Default::default()
        };
        let options = args.load().unwrap();

        assert_eq!(options.primary, Target::new("from-flag", "us-east-1"));
        assert_eq!(options.prefix, "file/");

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_render_text_scalar() {
        assert_eq!(render(&Value::from("db.internal"), OutputFormat::Text).unwrap(), "db.internal\n");
        assert_eq!(render(&Value::Integer(5432), OutputFormat::Text).unwrap(), "5432\n");
    }

    #[test]
    fn test_render_json_mapping() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), Value::Integer(1));
        let output = render(&Value::Mapping(map), OutputFormat::Json).unwrap();
        assert_eq!(output, "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn test_render_text_mapping_as_yaml() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), Value::Integer(1));
        assert_eq!(render(&Value::Mapping(map), OutputFormat::Text).unwrap(), "a: 1\n");
    }
}
