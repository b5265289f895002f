//! Configuration error types.

use std::path::PathBuf;

use prism_core::BindingError;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found at the specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The file extension is unknown or its format feature is disabled.
    #[error("Unsupported or disabled configuration file format: .{0}")]
    UnsupportedFormat(String),

    /// The merged configuration could not be extracted.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {message}")]
    ValidationError { message: String },

    /// Missing required field.
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Two pipelines share a name.
    #[error("Duplicate pipeline name: {0}")]
    DuplicatePipeline(String),

    /// No attribute with this name exists in any spec version.
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// A configured value does not fit its attribute or extension.
    #[error("Invalid value for '{field}': {source}")]
    InvalidValue {
        field: String,
        #[source]
        source: BindingError,
    },

    /// A transformer setting could not be built.
    #[error("Pipeline '{pipeline}', transformer #{index}: {source}")]
    InvalidTransformer {
        pipeline: String,
        index: usize,
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Wraps an error raised while building a pipeline's transformer.
    pub fn transformer(pipeline: impl Into<String>, index: usize, source: ConfigError) -> Self {
        Self::InvalidTransformer {
            pipeline: pipeline.into(),
            index,
            source: Box::new(source),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
