//! Prism Runtime - configuration, logging and pipelines for Prism.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `PrismConfig`)
//! - Logging setup over `tracing-subscriber` (`LoggingBuilder`)
//! - Named transformer pipelines built from configuration (`Pipeline`, `PipelineRegistry`)
//! - Runtime orchestration (`PrismRuntime`)
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "pretty"
//!
//! [[pipelines]]
//! name = "ingest"
//!
//! [[pipelines.transformers]]
//! type = "add-attribute"
//! attribute = "subject"
//! value = "orders"
//!
//! [[pipelines.transformers]]
//! type = "add-extension"
//! name = "tenant"
//! value = "acme"
//! ```
//!
//! ```ignore
//! use prism_runtime::PrismRuntime;
//!
//! let runtime = PrismRuntime::builder().config_file("prism.toml").build()?;
//! let message = runtime.process("ingest", message)?;
//! println!("{}", runtime.stats());
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod runtime;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, PipelineConfig, PrismConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, init_from_config};
pub use pipeline::{Pipeline, PipelineRegistry, PipelineStats};
pub use runtime::{PrismRuntime, RuntimeBuilder, RuntimeStats};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
