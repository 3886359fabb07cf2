use crate::config::{parse_duration, Config};
use crate::error::{JobSearchError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_llm(config, &mut errors);
        Self::validate_engine(config, &mut errors);
        Self::validate_search(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(JobSearchError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_llm(config: &Config, errors: &mut Vec<ValidationError>) {
        let provider = &config.llm.provider;
        let valid_providers = ["gemini", "mock"];
        if !valid_providers.contains(&provider.as_str()) {
            errors.push(ValidationError::new(
                "llm.provider",
                format!(
                    "Provider must be one of {:?}, got '{}'",
                    valid_providers, provider
                ),
            ));
        }

        let temp = config.llm.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "llm.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }

        if config.llm.max_tokens == 0 {
            errors.push(ValidationError::new(
                "llm.max_tokens",
                "Max tokens must be greater than 0",
            ));
        }

        if config.llm.model.is_empty() {
            errors.push(ValidationError::new("llm.model", "Model name cannot be empty"));
        }

        if config.llm.endpoint.is_empty() {
            errors.push(ValidationError::new(
                "llm.endpoint",
                "Endpoint cannot be empty",
            ));
        }

        if parse_duration(&config.llm.timeout).is_none() {
            errors.push(ValidationError::new(
                "llm.timeout",
                format!("Invalid duration format: {}", config.llm.timeout),
            ));
        }
    }

    fn validate_engine(config: &Config, errors: &mut Vec<ValidationError>) {
        let engine = &config.engine;

        if engine.url.is_empty() {
            errors.push(ValidationError::new("engine.url", "Engine URL cannot be empty"));
        }

        if engine.collection.is_empty() {
            errors.push(ValidationError::new(
                "engine.collection",
                "Collection name cannot be empty",
            ));
        }

        if engine.sparse_model.is_empty() {
            errors.push(ValidationError::new(
                "engine.sparse_model",
                "Sparse model name cannot be empty",
            ));
        }

        if engine.dense_model.is_empty() {
            errors.push(ValidationError::new(
                "engine.dense_model",
                "Dense model name cannot be empty",
            ));
        }

        if engine.prefetch_limit == 0 {
            errors.push(ValidationError::new(
                "engine.prefetch_limit",
                "Prefetch limit must be greater than 0",
            ));
        }

        if !engine.rrf_k.is_finite() || engine.rrf_k < 0.0 {
            errors.push(ValidationError::new(
                "engine.rrf_k",
                format!("RRF constant must be a non-negative number, got {}", engine.rrf_k),
            ));
        }

        if parse_duration(&engine.timeout).is_none() {
            errors.push(ValidationError::new(
                "engine.timeout",
                format!("Invalid duration format: {}", engine.timeout),
            ));
        }
    }

    fn validate_search(config: &Config, errors: &mut Vec<ValidationError>) {
        let search = &config.search;

        if search.default_top == 0 {
            errors.push(ValidationError::new(
                "search.default_top",
                "Default top must be greater than 0",
            ));
        }

        if search.default_top > search.max_top {
            errors.push(ValidationError::new(
                "search.default_top",
                format!(
                    "Default top ({}) cannot exceed max top ({})",
                    search.default_top, search.max_top
                ),
            ));
        }

        if search.retrieval_multiplier == 0 {
            errors.push(ValidationError::new(
                "search.retrieval_multiplier",
                "Retrieval multiplier must be greater than 0",
            ));
        }

        if search.min_query_chars == 0 || search.min_query_chars > search.max_query_chars {
            errors.push(ValidationError::new(
                "search.min_query_chars",
                format!(
                    "Query length bounds are inconsistent: {}..={}",
                    search.min_query_chars, search.max_query_chars
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_provider() {
        let mut config = Config::default();
        config.llm.provider = "invalid".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.llm.temperature = 3.5;
        config.engine.prefetch_limit = 0;
        config.engine.timeout = "soon".to_string();
        config.search.default_top = 50;

        match ConfigValidator::validate(&config) {
            Err(JobSearchError::ConfigValidation { errors }) => {
                let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
                assert_eq!(
                    paths,
                    vec![
                        "llm.temperature",
                        "engine.prefetch_limit",
                        "engine.timeout",
                        "search.default_top"
                    ]
                );
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_rrf_constant() {
        let mut config = Config::default();
        config.engine.rrf_k = -1.0;
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
