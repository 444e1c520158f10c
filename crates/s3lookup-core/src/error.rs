//! Error types for s3lookup
//!
//! Errors are structured: a kind, the option or storage location involved,
//! the underlying cause, and an actionable help message.

use std::fmt;

/// Result type alias for s3lookup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for lookup operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Storage location involved (e.g., "s3://bucket/env/db_host")
    pub location: Option<String>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A lookup option is missing, malformed, or inconsistent with another.
    /// Always raised before any object-store access.
    Configuration { option: String },
    /// Retrieval failed for a reason other than absence and no further
    /// target remains.
    Lookup,
    /// The host interpolation function failed, or interpolated mapping keys
    /// collided.
    Interpolation,
    /// Internal error (e.g., a decode failure that is not a syntax error)
    Internal,
}

impl Error {
    /// Create a configuration error naming the offending option
    pub fn configuration(option: impl Into<String>, message: impl Into<String>) -> Self {
        let opt = option.into();
        Self {
            kind: ErrorKind::Configuration { option: opt.clone() },
            location: None,
            help: Some(format!("Check the '{}' lookup option", opt)),
            cause: Some(message.into()),
        }
    }

    /// Create a missing required option error
    pub fn missing_option(option: impl Into<String>) -> Self {
        let opt = option.into();
        Self {
            kind: ErrorKind::Configuration { option: opt.clone() },
            location: None,
            help: Some(format!("Define '{}' in the lookup options", opt)),
            cause: Some(format!("'{}' must be defined as an option", opt)),
        }
    }

    /// Create a retrieval error for a storage location
    pub fn lookup(location: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Lookup,
            location: Some(location.into()),
            help: Some(
                "Check bucket permissions, region, and network access to the object store".into(),
            ),
            cause: Some(cause.into()),
        }
    }

    /// Create an interpolation error
    pub fn interpolation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Interpolation,
            location: None,
            help: None,
            cause: Some(message.into()),
        }
    }

    /// Create an error for two mapping keys that interpolate to the same key
    pub fn key_collision(first: &str, second: &str, interpolated: &str) -> Self {
        Self {
            kind: ErrorKind::Interpolation,
            location: None,
            help: Some("Rename one of the keys so they stay distinct after interpolation".into()),
            cause: Some(format!(
                "Keys '{}' and '{}' both interpolate to '{}'",
                first, second, interpolated
            )),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            location: None,
            help: Some("This is likely a bug in s3lookup. Please report it.".into()),
            cause: Some(message.into()),
        }
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// True if this error was raised by option validation
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, ErrorKind::Configuration { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Configuration { option } => {
                write!(f, "Invalid lookup option '{}'", option)?
            }
            ErrorKind::Lookup => write!(f, "Error while getting object")?,
            ErrorKind::Interpolation => write!(f, "Interpolation failed")?,
            ErrorKind::Internal => write!(f, "Internal error")?,
        }

        if let Some(location) = &self.location {
            write!(f, "\n  Location: {}", location)?;
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
