//! Named transformer pipelines.
//!
//! A [`Pipeline`] is a [`Transformers`] chain with a name and counters.
//! Pipelines are built from [`PipelineConfig`]s and kept in a
//! [`PipelineRegistry`] so transports can look them up by name.
//!
//! # Example
//!
//! ```rust
//! use prism_core::prelude::*;
//! use prism_runtime::pipeline::Pipeline;
//!
//! let pipeline = Pipeline::new(
//!     "ingest",
//!     Transformers::new().with(transformer::add_extension("tenant", "acme")),
//! );
//!
//! let event = Event::builder().id("aaa").source("/s").ty("t").build().unwrap();
//! let event = pipeline.process(Message::from(event)).unwrap().into_event().unwrap();
//! assert!(event.extension("tenant").is_some());
//! assert_eq!(pipeline.stats().processed, 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use prism_core::{BindingResult, Event, Message, Transformers};
use tracing::{debug, debug_span, info, warn};

use crate::config::{ConfigError, ConfigResult, PipelineConfig};

// =============================================================================
// Pipeline
// =============================================================================

/// A named chain of transformers with processing counters.
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    transformers: Transformers,
    processed: AtomicU64,
    failed: AtomicU64,
}

impl Pipeline {
    /// Creates a pipeline from a transformer chain.
    pub fn new(name: impl Into<String>, transformers: Transformers) -> Self {
        Self {
            name: name.into(),
            transformers,
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Builds a pipeline from its configuration.
    pub fn from_config(config: &PipelineConfig) -> ConfigResult<Self> {
        let transformers = config.build_transformers()?;
        debug!(
            pipeline = %config.name,
            transformers = transformers.len(),
            "Built pipeline"
        );
        Ok(Self::new(config.name.clone(), Transformers::from(transformers)))
    }

    /// Returns the pipeline name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the transformer chain.
    pub fn transformers(&self) -> &Transformers {
        &self.transformers
    }

    /// Applies every transformer to a message.
    ///
    /// Binary messages stay binary; their transformation errors surface when
    /// the returned message is read and are not counted here.
    pub fn process(&self, message: Message) -> BindingResult<Message> {
        let span = debug_span!("pipeline", pipeline = %self.name, encoding = %message.encoding());
        let _enter = span.enter();

        self.record(self.transformers.apply(message))
    }

    /// Applies every transformer to a decoded event in place.
    pub fn process_event(&self, event: &mut Event) -> BindingResult<()> {
        let span = debug_span!("pipeline", pipeline = %self.name, encoding = "event");
        let _enter = span.enter();

        self.record(self.transformers.transform_event(event))
    }

    fn record<T>(&self, result: BindingResult<T>) -> BindingResult<T> {
        match &result {
            Ok(_) => {
                self.processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(pipeline = %self.name, error = %e, "Message rejected");
            }
        }
        result
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            name: self.name.clone(),
            transformers: self.transformers.len(),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Counters of a single pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Pipeline name.
    pub name: String,
    /// Number of transformers.
    pub transformers: usize,
    /// Messages transformed successfully.
    pub processed: u64,
    /// Messages rejected with an error.
    pub failed: u64,
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pipeline '{}': {} transformers, {} processed, {} failed",
            self.name, self.transformers, self.processed, self.failed
        )
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Pipelines indexed by name.
#[derive(Debug, Default)]
pub struct PipelineRegistry {
    pipelines: HashMap<String, Arc<Pipeline>>,
}

impl PipelineRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds every configured pipeline.
    pub fn from_configs(configs: &[PipelineConfig]) -> ConfigResult<Self> {
        let mut registry = Self::new();
        for config in configs {
            registry.register(Pipeline::from_config(config)?)?;
        }
        Ok(registry)
    }

    /// Registers a pipeline; names must be unique.
    pub fn register(&mut self, pipeline: Pipeline) -> ConfigResult<Arc<Pipeline>> {
        if self.pipelines.contains_key(pipeline.name()) {
            return Err(ConfigError::DuplicatePipeline(pipeline.name().to_string()));
        }
        let pipeline = Arc::new(pipeline);
        self.pipelines
            .insert(pipeline.name().to_string(), Arc::clone(&pipeline));
        info!(pipeline = %pipeline.name(), "Registered pipeline");
        Ok(pipeline)
    }

    /// Gets a pipeline by name.
    pub fn get(&self, name: &str) -> Option<Arc<Pipeline>> {
        self.pipelines.get(name).cloned()
    }

    /// Returns all pipeline names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pipelines.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of pipelines.
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Returns whether no pipeline is registered.
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Returns the counters of every pipeline, sorted by name.
    pub fn stats(&self) -> Vec<PipelineStats> {
        let mut stats: Vec<PipelineStats> = self.pipelines.values().map(|p| p.stats()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScalarValue, TransformerConfig};
    use prism_core::spec::AttributeKind;
    use prism_core::{BindingError, transformer};
    use prism_testkit::{MockBinaryMessage, min_event, mock_structured_message};

    fn config(name: &str) -> PipelineConfig {
        PipelineConfig {
            name: name.to_string(),
            transformers: vec![
                TransformerConfig::AddAttribute {
                    attribute: "subject".to_string(),
                    value: ScalarValue::String("sub".to_string()),
                },
                TransformerConfig::AddExtension {
                    name: "retries".to_string(),
                    value: ScalarValue::Integer(3),
                },
            ],
        }
    }

    #[test]
    fn test_config_pipeline_matches_hand_built() {
        let configured = Pipeline::from_config(&config("ingest")).unwrap();
        let hand_built = Pipeline::new(
            "ingest",
            Transformers::new()
                .with(transformer::add_attribute(AttributeKind::Subject, "sub"))
                .with(transformer::add_extension("retries", 3)),
        );

        let messages = || {
            vec![
                Message::from(min_event()),
                mock_structured_message(&min_event()),
                MockBinaryMessage::new(min_event()).into_message(),
            ]
        };
        for (a, b) in messages().into_iter().zip(messages()) {
            let a = configured.process(a).unwrap().into_event().unwrap();
            let b = hand_built.process(b).unwrap().into_event().unwrap();
            assert_eq!(a, b);
            assert_eq!(a.subject(), Some("sub"));
        }
        assert_eq!(configured.stats().processed, 3);
    }

    #[test]
    fn test_failures_are_counted() {
        let pipeline = Pipeline::new(
            "broken",
            Transformers::new().with(transformer::add_extension("type", "x")),
        );
        let err = pipeline.process(Message::from(min_event())).unwrap_err();
        assert!(matches!(err, BindingError::ReservedName { .. }));

        let stats = pipeline.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.processed, 0);
        assert_eq!(
            stats.to_string(),
            "Pipeline 'broken': 1 transformers, 0 processed, 1 failed"
        );
    }

    #[test]
    fn test_registry() {
        let registry = PipelineRegistry::from_configs(&[config("b"), config("a")]).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
        assert!(registry.get("a").is_some());
        assert!(registry.get("c").is_none());

        let mut registry = registry;
        let err = registry.register(Pipeline::new("a", Transformers::new())).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePipeline(name) if name == "a"));
    }
}
