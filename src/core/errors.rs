//! Error types for the hat-rs library.
//!
//! Structured error variants that preserve context as they propagate from the
//! host scene, the file system and the configuration layer. Check findings are
//! never errors: they are report entries. These types cover everything else.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main result type for hat operations.
pub type Result<T> = std::result::Result<T, HatError>;

/// Error type for all hat operations.
#[derive(Error, Debug)]
pub enum HatError {
    /// I/O related errors (file renames, reads, saves)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The host scene rejected an operation
    #[error("Host error: {message}")]
    Host {
        /// Error description
        message: String,
        /// Datablock or path the operation targeted
        target: Option<String>,
    },

    /// An action was invoked in a state that does not allow it
    #[error("{message}")]
    Precondition {
        /// User-facing explanation
        message: String,
    },

    /// A check routine could not complete
    #[error("Check '{check}' failed: {message}")]
    CheckFailed {
        /// Qualified check name
        check: String,
        /// Error description
        message: String,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl HatError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new I/O error naming the path involved
    pub fn io_at(action: &str, path: &std::path::Path, source: io::Error) -> Self {
        Self::io(format!("Failed to {} {}", action, path.display()), source)
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new host error naming the datablock or path involved
    pub fn host_target(message: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
            target: Some(target.into()),
        }
    }

    /// Create a new precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Create a new check failure
    pub fn check_failed(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CheckFailed {
            check: check.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Internal { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            Self::Io { message, .. } | Self::Serialization { message, .. } => {
                *message = format!("{}: {}", context.into(), message);
            }
            _ => {}
        }
        self
    }
}

impl From<io::Error> for HatError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for HatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for HatError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<walkdir::Error> for HatError {
    fn from(err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(PathBuf::from)
            .unwrap_or_default()
            .display()
            .to_string();
        match err.into_io_error() {
            Some(source) => Self::io(format!("Failed to walk {path}"), source),
            None => Self::internal(format!("Directory walk failed at {path}")),
        }
    }
}

impl From<globset::Error> for HatError {
    fn from(err: globset::Error) -> Self {
        Self::config(format!("Invalid glob pattern: {err}"))
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<HatError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}
