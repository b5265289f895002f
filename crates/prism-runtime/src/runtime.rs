//! Runtime orchestration: configuration, logging and pipelines.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use prism_runtime::PrismRuntime;
//!
//! // Simplest way - auto-loads config from current directory
//! let runtime = PrismRuntime::new();
//!
//! // Custom configuration path
//! let runtime = PrismRuntime::builder()
//!     .config_file("config/prism.yaml")
//!     .build()?;
//!
//! // Use pre-loaded config
//! let config = load_config()?;
//! let runtime = PrismRuntime::from_config(&config)?;
//!
//! let message = runtime.process("ingest", message)?;
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use prism_core::{Message, Transformers};
use tracing::info;

use crate::config::{ConfigLoader, PrismConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::pipeline::{Pipeline, PipelineRegistry, PipelineStats};

/// The Prism runtime: validated configuration plus the pipelines it defines.
///
/// # Custom Configuration
///
/// ```rust,ignore
/// // Load from specific file
/// let runtime = PrismRuntime::builder()
///     .config_file("deploy/prism.toml")
///     .profile("production")
///     .build()?;
///
/// // Or use pre-loaded config
/// let config = load_config_from_file("prism.toml")?;
/// let runtime = PrismRuntime::from_config(&config)?;
/// ```
pub struct PrismRuntime {
    /// The configuration.
    config: PrismConfig,
    /// Pipelines by name.
    pipelines: PipelineRegistry,
}

impl PrismRuntime {
    /// Creates a new runtime with automatic configuration loading.
    ///
    /// This will:
    /// 1. Search for `prism.toml` / `prism.yaml` in the current directory
    /// 2. Initialize logging based on the configuration
    /// 3. Build every configured pipeline
    ///
    /// If no usable configuration is found, default settings are used.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .and_then(|config| validate_config(&config).map(|()| config))
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                PrismConfig::default()
            });

        Self::from_config(&config).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to build pipelines ({e}), starting without pipelines");
            Self {
                config,
                pipelines: PipelineRegistry::new(),
            }
        })
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a new runtime from configuration.
    ///
    /// The configuration is validated, logging is initialized (a no-op if a
    /// subscriber is already installed) and every pipeline is built.
    pub fn from_config(config: &PrismConfig) -> RuntimeResult<Self> {
        validate_config(config)?;
        logging::init_from_config(&config.logging);

        let pipelines = PipelineRegistry::from_configs(&config.pipelines)?;

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            pipelines = pipelines.len(),
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config: config.clone(),
            pipelines,
        })
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &PrismConfig {
        &self.config
    }

    /// Registers a pipeline built in code.
    pub fn register_pipeline(
        &mut self,
        name: impl Into<String>,
        transformers: Transformers,
    ) -> RuntimeResult<Arc<Pipeline>> {
        Ok(self.pipelines.register(Pipeline::new(name, transformers))?)
    }

    /// Gets a pipeline by name.
    pub fn pipeline(&self, name: &str) -> Option<Arc<Pipeline>> {
        self.pipelines.get(name)
    }

    /// Returns the pipeline registry.
    pub fn pipelines(&self) -> &PipelineRegistry {
        &self.pipelines
    }

    /// Runs a message through the named pipeline.
    pub fn process(&self, pipeline: &str, message: Message) -> RuntimeResult<Message> {
        let pipeline = self
            .pipelines
            .get(pipeline)
            .ok_or_else(|| RuntimeError::PipelineNotFound(pipeline.to_string()))?;
        Ok(pipeline.process(message)?)
    }

    /// Returns statistics about every pipeline.
    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            pipelines: self.pipelines.stats(),
        }
    }
}

impl Default for PrismRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the runtime.
#[derive(Debug, Clone, Default)]
pub struct RuntimeStats {
    /// Per-pipeline counters, sorted by name.
    pub pipelines: Vec<PipelineStats>,
}

impl RuntimeStats {
    /// Total messages transformed successfully.
    pub fn processed(&self) -> u64 {
        self.pipelines.iter().map(|p| p.processed).sum()
    }

    /// Total messages rejected.
    pub fn failed(&self) -> u64 {
        self.pipelines.iter().map(|p| p.failed).sum()
    }
}

impl fmt::Display for RuntimeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pipelines, {} processed, {} failed",
            self.pipelines.len(),
            self.processed(),
            self.failed()
        )
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a `PrismRuntime` with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = PrismRuntime::builder()
///     .config_file("deploy/prism.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: PrismConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> RuntimeResult<PrismRuntime> {
        let config = self.config_loader.load()?;
        PrismRuntime::from_config(&config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineConfig, TransformerConfig};
    use prism_core::{BindingError, SpecVersion, transformer};
    use prism_testkit::{full_event, min_event};

    fn config() -> PrismConfig {
        PrismConfig {
            logging: Default::default(),
            pipelines: vec![PipelineConfig {
                name: "upgrade".to_string(),
                transformers: vec![TransformerConfig::Version { to: SpecVersion::V03 }],
            }],
        }
    }

    #[test]
    fn test_from_config_builds_pipelines() {
        let runtime = PrismRuntime::from_config(&config()).unwrap();
        assert_eq!(runtime.pipelines().names(), vec!["upgrade".to_string()]);

        let event = runtime
            .process("upgrade", Message::from(full_event()))
            .unwrap()
            .into_event()
            .unwrap();
        assert_eq!(event.spec_version(), SpecVersion::V03);
        assert_eq!(runtime.stats().processed(), 1);
    }

    #[test]
    fn test_unknown_pipeline() {
        let runtime = PrismRuntime::from_config(&PrismConfig::default()).unwrap();
        let err = runtime
            .process("missing", Message::from(min_event()))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::PipelineNotFound(name) if name == "missing"));
    }

    #[test]
    fn test_register_pipeline_and_errors() {
        let mut runtime = PrismRuntime::from_config(&PrismConfig::default()).unwrap();
        runtime
            .register_pipeline(
                "strict",
                Transformers::new().with(transformer::add_extension("id", "x")),
            )
            .unwrap();

        let err = runtime
            .process("strict", Message::from(min_event()))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Binding(BindingError::ReservedName { .. })));
        assert_eq!(runtime.stats().failed(), 1);
        assert_eq!(runtime.stats().to_string(), "1 pipelines, 0 processed, 1 failed");

        assert!(matches!(
            runtime.register_pipeline("strict", Transformers::new()),
            Err(RuntimeError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = config();
        config.pipelines.push(config.pipelines[0].clone());
        assert!(matches!(
            PrismRuntime::from_config(&config),
            Err(RuntimeError::Config(_))
        ));
    }
}
