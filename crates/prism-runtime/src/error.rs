//! Runtime error types.

use prism_core::BindingError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A message could not be transformed.
    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    /// Pipeline not found.
    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
