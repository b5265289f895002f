//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, PipelineConfig, PrismConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &PrismConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_pipelines_config(&config.pipelines)?;
    Ok(())
}

/// Validates logging configuration.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter module names cannot be empty"));
    }

    Ok(())
}

/// Validates all pipeline configurations.
fn validate_pipelines_config(pipelines: &[PipelineConfig]) -> ConfigResult<()> {
    let mut seen_names = HashSet::new();

    for pipeline in pipelines {
        if !seen_names.insert(pipeline.name.as_str()) {
            return Err(ConfigError::DuplicatePipeline(pipeline.name.clone()));
        }

        validate_pipeline_config(pipeline)?;
    }

    Ok(())
}

/// Validates a single pipeline configuration.
fn validate_pipeline_config(pipeline: &PipelineConfig) -> ConfigResult<()> {
    if pipeline.name.is_empty() {
        return Err(ConfigError::missing_field("pipeline.name"));
    }

    if pipeline.name.contains(char::is_whitespace) {
        return Err(ConfigError::validation("Pipeline name cannot contain whitespace"));
    }

    pipeline.build_transformers()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ScalarValue, TransformerConfig};

    fn pipeline(name: &str) -> PipelineConfig {
        PipelineConfig {
            name: name.to_string(),
            transformers: vec![TransformerConfig::AddExtension {
                name: "tenant".to_string(),
                value: ScalarValue::String("acme".to_string()),
            }],
        }
    }

    #[test]
    fn test_validate_empty_config() {
        let config = PrismConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_file_output_requires_path() {
        let mut config = PrismConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_validate_duplicate_pipeline() {
        let config = PrismConfig {
            logging: Default::default(),
            pipelines: vec![pipeline("ingest"), pipeline("ingest")],
        };

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::DuplicatePipeline(_))));
    }

    #[test]
    fn test_validate_pipeline_name() {
        let config = PrismConfig {
            logging: Default::default(),
            pipelines: vec![pipeline("bad name")],
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_unbuildable_transformer() {
        let mut bad = pipeline("ingest");
        bad.transformers.push(TransformerConfig::AddAttribute {
            attribute: "colour".to_string(),
            value: ScalarValue::String("red".to_string()),
        });
        let config = PrismConfig {
            logging: Default::default(),
            pipelines: vec![bad],
        };

        let result = validate_config(&config);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTransformer { index: 1, .. })
        ));
    }
}
