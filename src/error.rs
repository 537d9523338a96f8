//! Error types for schema preparation

use std::path::PathBuf;

use thiserror::Error;

/// Result type for schema preparation
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Startup failures raised while staging a schema directory.
///
/// Every variant is fatal: schema sources are static developer inputs, so
/// nothing here is retried.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema directory `{reference}` must start with one of the supported prefixes: {supported}")]
    UnsupportedScheme { reference: String, supported: String },

    #[error("Schema directory `{0}` does not exist")]
    SourceNotFound(String),

    #[error("Failed to copy schema directory `{reference}` to {}: {source}", .target.display())]
    CopyFailure {
        reference: String,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema validation failed for {path}:\n  {}", .violations.join("\n  "))]
    ValidationFailure { path: String, violations: Vec<String> },

    #[error("Unknown lint rule: {0}")]
    UnknownLintRule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    /// Validation failure with a single message
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::ValidationFailure {
            path: path.into(),
            violations: vec![message.into()],
        }
    }
}
