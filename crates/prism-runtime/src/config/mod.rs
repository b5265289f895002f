//! Configuration module for the Prism runtime.
//!
//! This module provides layered configuration loading (files, environment,
//! programmatic overrides) and validation for logging and transformer
//! pipelines.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, PipelineConfig, PrismConfig,
    ScalarValue, SpanEventConfig, TransformerConfig,
};
pub use validation::validate_config;
