//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use prism_core::spec::{AttributeKind, SpecVersion, Versions};
use prism_core::{BoxedTransformer, Value, ValueKind, transformer};
use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PrismConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Named transformer pipelines.
    #[serde(default)]
    pub pipelines: Vec<PipelineConfig>,
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, used when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Log file rotation, used when `output` is `file`.
    #[serde(default)]
    pub rotation: LogRotation,

    /// Span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread IDs.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `prism_core = "trace"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            rotation: LogRotation::default(),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            filters: BTreeMap::new(),
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format.
///
/// `json` requires the `json-log` feature; without it, compact output is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    Json,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Log file rotation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Span lifecycle events to log.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

// =============================================================================
// Pipelines
// =============================================================================

/// A named, ordered list of transformers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Unique pipeline name.
    pub name: String,

    /// Transformers, applied in order.
    #[serde(default)]
    pub transformers: Vec<TransformerConfig>,
}

impl PipelineConfig {
    /// Builds every transformer of this pipeline.
    pub fn build_transformers(&self) -> ConfigResult<Vec<BoxedTransformer>> {
        self.transformers
            .iter()
            .enumerate()
            .map(|(index, config)| {
                config
                    .to_transformer()
                    .map_err(|e| ConfigError::transformer(&self.name, index, e))
            })
            .collect()
    }
}

/// A single transformer setting.
///
/// ```yaml
/// transformers:
///   - type: add-attribute
///     attribute: subject
///     value: orders
///   - type: add-extension
///     name: tenant
///     value: acme
///   - type: version
///     to: "1.0"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TransformerConfig {
    /// Set an attribute unless present.
    AddAttribute { attribute: String, value: ScalarValue },

    /// Set an extension unless present.
    AddExtension { name: String, value: ScalarValue },

    /// Remove an optional attribute.
    DeleteAttribute { attribute: String },

    /// Remove an extension.
    DeleteExtension { name: String },

    /// Convert to another spec version.
    Version { to: SpecVersion },
}

impl TransformerConfig {
    /// Builds the configured transformer.
    pub fn to_transformer(&self) -> ConfigResult<BoxedTransformer> {
        match self {
            Self::AddAttribute { attribute, value } => {
                let (kind, value_kind) = resolve_attribute(attribute)?;
                let value = value.to_value(attribute, value_kind)?;
                Ok(transformer::add_attribute(kind, value))
            }
            Self::AddExtension { name, value } => {
                let value = value.to_value(name, value.natural_kind())?;
                Ok(transformer::add_extension(name.clone(), value))
            }
            Self::DeleteAttribute { attribute } => {
                let (kind, _) = resolve_attribute(attribute)?;
                Ok(transformer::delete_attribute(kind))
            }
            Self::DeleteExtension { name } => Ok(transformer::delete_extension(name.clone())),
            Self::Version { to } => Ok(transformer::version(*to)),
        }
    }
}

/// Finds an attribute by its name in any registered version.
fn resolve_attribute(name: &str) -> ConfigResult<(AttributeKind, ValueKind)> {
    Versions::standard()
        .attribute(name)
        .map(|spec| (spec.kind, spec.value_kind))
        .ok_or_else(|| ConfigError::UnknownAttribute(name.to_string()))
}

/// A scalar configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Integer(i64),
    String(String),
}

impl ScalarValue {
    fn natural_kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::String(_) => ValueKind::String,
        }
    }

    /// Converts to a typed value; strings are parsed as `kind`.
    fn to_value(&self, field: &str, kind: ValueKind) -> ConfigResult<Value> {
        let value = match self {
            Self::Bool(b) => Ok(Value::Boolean(*b)),
            Self::Integer(i) => i32::try_from(*i).map(Value::Integer).map_err(|e| {
                prism_core::BindingError::InvalidValue {
                    kind: ValueKind::Integer,
                    input: i.to_string(),
                    reason: e.to_string(),
                }
            }),
            Self::String(s) => Value::parse(kind, s),
        };
        value.map_err(|source| ConfigError::InvalidValue {
            field: field.to_string(),
            source,
        })
    }
}
