//! Errors and load warnings for the configuration bundle.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while writing bundle sources through the admin API.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The target is not one of the bundle's source files.
    #[error("file not allowed: {0}")]
    FileNotAllowed(String),

    /// Filesystem failure at a specific path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The payload could not be serialized for a JSON source.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BundleError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Non-fatal issues found while loading the bundle. The affected source falls back
/// to its empty default.
#[derive(Debug, Clone, PartialEq)]
pub enum BundleWarning {
    /// The source file does not exist.
    Missing { file: &'static str },
    /// The source exists but could not be read.
    Unreadable { file: &'static str, error: String },
    /// A JSON source failed to parse or had the wrong shape.
    InvalidJson { file: &'static str, error: String },
    /// An intent pattern failed to compile and was dropped.
    InvalidPattern { intent: String, error: String },
    /// A `settings.json` key had an unusable value; only that key uses its default.
    InvalidSetting { key: &'static str, value: String },
}

/// Log load warnings the way startup and reload report them.
pub fn log_load_warnings(warnings: &[BundleWarning]) {
    use tracing::warn;

    for w in warnings {
        match w {
            BundleWarning::Missing { file } => {
                warn!(file = %file, "Config source missing, using empty default");
            }
            BundleWarning::Unreadable { file, error } => {
                warn!(file = %file, error = %error, "Config source unreadable, using empty default");
            }
            BundleWarning::InvalidJson { file, error } => {
                warn!(file = %file, error = %error, "Config source is not valid JSON, using empty default");
            }
            BundleWarning::InvalidPattern { intent, error } => {
                warn!(intent = %intent, error = %error, "Skipping invalid intent pattern");
            }
            BundleWarning::InvalidSetting { key, value } => {
                warn!(key = %key, value = %value, "Invalid setting, using its default");
            }
        }
    }
}
