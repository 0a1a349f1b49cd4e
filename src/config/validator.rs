use crate::config::Config;
use crate::error::{HuntError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_chunking(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_llm(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_generation(config, &mut errors);
        Self::validate_originality(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(HuntError::ConfigValidation { errors })
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

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.data_dir",
                "Data directory cannot be empty",
            ));
        }
    }

    fn validate_chunking(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.chunking.max_chars == 0 {
            errors.push(ValidationError::new(
                "chunking.max_chars",
                "max_chars must be greater than 0",
            ));
        }

        // The cursor would never advance past a window
        if config.chunking.overlap >= config.chunking.max_chars {
            errors.push(ValidationError::new(
                "chunking.overlap",
                format!(
                    "overlap ({}) must be smaller than max_chars ({})",
                    config.chunking.overlap, config.chunking.max_chars
                ),
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        let mode = &config.embedding.mode;
        if mode != "offline" && mode != "online" {
            errors.push(ValidationError::new(
                "embedding.mode",
                format!("Mode must be 'offline' or 'online', got '{}'", mode),
            ));
        }

        if config.embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }

        if config.embedding.dimension == 0 {
            errors.push(ValidationError::new(
                "embedding.dimension",
                "Dimension must be greater than 0",
            ));
        }

        if config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }

        if mode == "online" && config.embedding.base_url.is_empty() {
            errors.push(ValidationError::new(
                "embedding.base_url",
                "Base URL is required in online mode",
            ));
        }
    }

    fn validate_llm(config: &Config, errors: &mut Vec<ValidationError>) {
        let temp = config.llm.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "llm.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }

        let provider = &config.llm.provider;
        let valid_providers = ["groq", "openai", "anthropic", "ollama"];
        if !valid_providers.contains(&provider.as_str()) {
            errors.push(ValidationError::new(
                "llm.provider",
                format!(
                    "Provider must be one of {:?}, got '{}'",
                    valid_providers, provider
                ),
            ));
        }

        if config.llm.model.is_empty() {
            errors.push(ValidationError::new("llm.model", "Model name cannot be empty"));
        }

        if config.llm.max_tokens == 0 {
            errors.push(ValidationError::new(
                "llm.max_tokens",
                "max_tokens must be greater than 0",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.retrieval.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }

        let min = config.retrieval.min_similarity;
        if !(-1.0..=1.0).contains(&min) {
            errors.push(ValidationError::new(
                "retrieval.min_similarity",
                format!("min_similarity must be between -1.0 and 1.0, got {}", min),
            ));
        }
    }

    fn validate_generation(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.generation.max_attempts == 0 {
            errors.push(ValidationError::new(
                "generation.max_attempts",
                "max_attempts must be at least 1",
            ));
        }

        if config.generation.max_attempts > 1 && config.generation.style_hints.is_empty() {
            errors.push(ValidationError::new(
                "generation.style_hints",
                "At least one style hint is required when retries are enabled",
            ));
        }

        if config
            .generation
            .style_hints
            .iter()
            .any(|hint| hint.trim().is_empty())
        {
            errors.push(ValidationError::new(
                "generation.style_hints",
                "Style hints cannot be blank",
            ));
        }
    }

    fn validate_originality(config: &Config, errors: &mut Vec<ValidationError>) {
        let cosine = config.originality.max_cosine_similarity;
        if !(0.0..=1.0).contains(&cosine) {
            errors.push(ValidationError::new(
                "originality.max_cosine_similarity",
                format!("Must be between 0.0 and 1.0, got {}", cosine),
            ));
        }

        let jaccard = config.originality.max_jaccard_overlap;
        if !(0.0..=1.0).contains(&jaccard) {
            errors.push(ValidationError::new(
                "originality.max_jaccard_overlap",
                format!("Must be between 0.0 and 1.0, got {}", jaccard),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_paths(config: &Config) -> Vec<String> {
        match ConfigValidator::validate(config) {
            Err(HuntError::ConfigValidation { errors }) => {
                errors.into_iter().map(|e| e.path).collect()
            }
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_overlap_not_smaller_than_window() {
        let mut config = Config::default();
        config.chunking.max_chars = 300;
        config.chunking.overlap = 300;
        assert_eq!(error_paths(&config), vec!["chunking.overlap"]);
    }

    #[test]
    fn test_invalid_mode() {
        let mut config = Config::default();
        config.embedding.mode = "invalid".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_collects_every_violation() {
        let mut config = Config::default();
        config.llm.provider = "unknown".to_string();
        config.generation.max_attempts = 0;
        config.originality.max_jaccard_overlap = 1.5;

        let paths = error_paths(&config);
        assert!(paths.contains(&"llm.provider".to_string()));
        assert!(paths.contains(&"generation.max_attempts".to_string()));
        assert!(paths.contains(&"originality.max_jaccard_overlap".to_string()));
    }

    #[test]
    fn test_retries_need_a_style_hint() {
        let mut config = Config::default();
        config.generation.style_hints.clear();
        assert_eq!(error_paths(&config), vec!["generation.style_hints"]);

        config.generation.max_attempts = 1;
        assert!(ConfigValidator::validate(&config).is_ok());
    }
}
