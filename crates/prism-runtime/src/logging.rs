//! Logging setup over `tracing-subscriber`.
//!
//! Prism logs through `tracing`: `prism_core` traces representation changes
//! and dropped attributes, `prism_runtime` reports pipeline registration and
//! rejected messages. Every processed message runs inside a `pipeline` span
//! carrying the pipeline name and the message encoding, so enabling span
//! events shows when each message enters and leaves a pipeline.
//!
//! ```rust,ignore
//! use prism_runtime::config::load_config;
//! use prism_runtime::logging;
//!
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//! ```
//!
//! `RUST_LOG` takes precedence over the configured level; per-module
//! `filters` are added on top of either.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{Level, Subscriber, debug, warn};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::{LogFormat, LogOutput, LogRotation, LoggingConfig, SpanEventConfig};

/// Installs the global subscriber described by `config`.
///
/// Does nothing if a subscriber is already installed, so tests and embedding
/// applications can set up their own.
pub fn init_from_config(config: &LoggingConfig) {
    LoggingBuilder::from_config(config).init();
}

/// Converts the configured span events to `fmt` span flags.
pub fn span_events(config: &SpanEventConfig) -> FmtSpan {
    [
        (config.new, FmtSpan::NEW),
        (config.enter, FmtSpan::ENTER),
        (config.exit, FmtSpan::EXIT),
        (config.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .fold(FmtSpan::NONE, |flags, (_, flag)| flags | flag)
}

/// Subscriber settings, built from a [`LoggingConfig`] or by hand.
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    directives: Vec<String>,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    rotation: LogRotation,
    span_events: FmtSpan,
    thread_ids: bool,
    file_location: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::from_config(&LoggingConfig::default())
    }
}

impl LoggingBuilder {
    /// Creates a builder with the default configuration: `info`, compact, stdout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from the `[logging]` configuration section.
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.to_tracing_level(),
            directives: config
                .filters
                .iter()
                .map(|(module, level)| format!("{module}={}", level.as_str()))
                .collect(),
            format: config.format,
            output: config.output,
            file_path: config.file_path.clone(),
            rotation: config.rotation,
            span_events: span_events(&config.span_events),
            thread_ids: config.thread_ids,
            file_location: config.file_location,
        }
    }

    /// Sets the base level used when `RUST_LOG` is unset.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Adds a filter directive such as `prism_core=trace`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Sets the output format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Logs span lifecycle events, e.g. `FmtSpan::NEW | FmtSpan::CLOSE`.
    pub fn span_events(mut self, span_events: FmtSpan) -> Self {
        self.span_events = span_events;
        self
    }

    /// Writes to a file, rotated as given.
    pub fn file(mut self, path: impl Into<PathBuf>, rotation: LogRotation) -> Self {
        self.output = LogOutput::File;
        self.file_path = Some(path.into());
        self.rotation = rotation;
        self
    }

    fn filter(&self) -> EnvFilter {
        let base = self.level.as_str().to_ascii_lowercase();
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base));
        for directive in &self.directives {
            match directive.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(e) => warn!(%directive, error = %e, "Ignoring invalid log filter"),
            }
        }
        filter
    }

    fn writer(&self) -> BoxMakeWriter {
        match (self.output, &self.file_path) {
            (LogOutput::Stdout, _) => BoxMakeWriter::new(std::io::stdout),
            (LogOutput::Stderr, _) => BoxMakeWriter::new(std::io::stderr),
            (LogOutput::File, Some(path)) => {
                let directory = path.parent().unwrap_or_else(|| Path::new("."));
                let file_name = path.file_name().unwrap_or_else(|| OsStr::new("prism.log"));
                let appender = match self.rotation {
                    LogRotation::Never => tracing_appender::rolling::never(directory, file_name),
                    LogRotation::Hourly => tracing_appender::rolling::hourly(directory, file_name),
                    LogRotation::Daily => tracing_appender::rolling::daily(directory, file_name),
                };
                BoxMakeWriter::new(appender)
            }
            (LogOutput::File, None) => {
                warn!("File output requested without a file path, logging to stdout");
                BoxMakeWriter::new(std::io::stdout)
            }
        }
    }

    fn layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_writer(self.writer())
            .with_span_events(self.span_events.clone())
            .with_thread_ids(self.thread_ids)
            .with_file(self.file_location)
            .with_line_number(self.file_location);

        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => {
                warn!("JSON log format requires the `json-log` feature, using compact");
                layer.compact().boxed()
            }
        }
    }

    /// Installs the subscriber, failing if one is already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        tracing_subscriber::registry()
            .with(self.layer())
            .with(self.filter())
            .try_init()
    }

    /// Installs the subscriber, ignoring an already installed one.
    pub fn init(self) {
        if self.try_init().is_err() {
            debug!("Global subscriber already installed, keeping it");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_span_events_flags() {
        assert_eq!(span_events(&SpanEventConfig::default()), FmtSpan::NONE);

        let lifecycle = SpanEventConfig {
            new: true,
            close: true,
            ..Default::default()
        };
        assert_eq!(span_events(&lifecycle), FmtSpan::NEW | FmtSpan::CLOSE);

        let all = SpanEventConfig {
            new: true,
            enter: true,
            exit: true,
            close: true,
        };
        assert_eq!(span_events(&all), FmtSpan::FULL);
    }

    #[test]
    fn test_builder_from_config() {
        let mut config = LoggingConfig::default();
        config.level = LogLevel::Debug;
        config.filters.insert("prism_core".to_string(), LogLevel::Trace);
        config.thread_ids = true;

        let builder = LoggingBuilder::from_config(&config).directive("prism_runtime=warn");
        assert_eq!(builder.level, Level::DEBUG);
        assert!(builder.thread_ids);
        assert_eq!(
            builder.directives,
            vec!["prism_core=trace".to_string(), "prism_runtime=warn".to_string()]
        );
    }

    #[test]
    fn test_file_output() {
        let builder = LoggingBuilder::new().file("logs/prism.log", LogRotation::Daily);
        assert_eq!(builder.output, LogOutput::File);
        assert_eq!(builder.rotation, LogRotation::Daily);
        assert_eq!(builder.file_path.as_deref(), Some(Path::new("logs/prism.log")));
    }
}
