//! Configuration management for huntsmith
//!
//! Loads the TOML configuration file, applies named profiles and
//! `HUNTSMITH_SECTION__KEY` environment overrides, then validates the result.

use crate::error::{HuntError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub originality: OriginalityConfig,
    #[serde(default)]
    pub patterns: PatternsConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Path of the knowledge-base database inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("knowledge.sqlite")
    }
}

/// Chunking window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 3000,
            overlap: 300,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub mode: String, // "offline" or "online"
    pub batch_size: usize,
    /// Declared vector dimension of the model
    pub dimension: usize,
    /// Base URL of the OpenAI-compatible endpoint used in online mode
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub api_key_env: String,
    pub model: String,
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Overrides the provider's default endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_max_tokens() -> usize {
    2048
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key_env: default_openai_key_env(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.9,
            max_tokens: default_max_tokens(),
            base_url: None,
        }
    }
}

/// Reference retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub min_similarity: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 8,
            min_similarity: 0.55,
        }
    }
}

/// Retry loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_attempts: usize,
    /// Tone overrides applied on successive retries; the last one repeats
    pub style_hints: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            style_hints: vec![
                "more metaphorical, different names and structure".to_string(),
                "strongly metaphorical, invent new names, places and objects, reorder the structure"
                    .to_string(),
                "completely reimagined: new setting, new characters, new puzzle structure, allegorical voice"
                    .to_string(),
            ],
        }
    }
}

/// Default originality thresholds, used when the policy store has no record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginalityConfig {
    pub max_cosine_similarity: f32,
    pub max_jaccard_overlap: f32,
}

impl Default for OriginalityConfig {
    fn default() -> Self {
        Self {
            max_cosine_similarity: 0.82,
            max_jaccard_overlap: 0.18,
        }
    }
}

/// Pattern configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternsConfig {
    /// Replaces the built-in leak patterns when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leak_file: Option<PathBuf>,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<usize>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HuntError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| HuntError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| HuntError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| HuntError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(mode) = overrides.embedding_mode {
            self.embedding.mode = mode;
        }
        if let Some(model) = overrides.embedding_model {
            self.embedding.model = model;
        }
        if let Some(provider) = overrides.llm_provider {
            self.llm.provider = provider;
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(max_attempts) = overrides.max_attempts {
            self.generation.max_attempts = max_attempts;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: HUNTSMITH_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("HUNTSMITH_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "STORAGE__DATA_DIR" => {
                self.storage.data_dir = PathBuf::from(value);
            }
            "LLM__PROVIDER" => {
                self.llm.provider = value.to_string();
            }
            "LLM__MODEL" => {
                self.llm.model = value.to_string();
            }
            "LLM__TEMPERATURE" => {
                self.llm.temperature = parse_env(path, value)?;
            }
            "EMBEDDING__MODE" => {
                self.embedding.mode = value.to_string();
            }
            "EMBEDDING__MODEL" => {
                self.embedding.model = value.to_string();
            }
            "RETRIEVAL__TOP_K" => {
                self.retrieval.top_k = parse_env(path, value)?;
            }
            "RETRIEVAL__MIN_SIMILARITY" => {
                self.retrieval.min_similarity = parse_env(path, value)?;
            }
            "GENERATION__MAX_ATTEMPTS" => {
                self.generation.max_attempts = parse_env(path, value)?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| HuntError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("huntsmith").join("config.toml"))
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| HuntError::Config("Cannot determine home directory".to_string()))?;

        Ok(home_dir.join(".huntsmith"))
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| HuntError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| HuntError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| HuntError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("~/.huntsmith"),
            },
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig {
                model: "all-MiniLM-L6-v2".to_string(),
                mode: "offline".to_string(),
                batch_size: 32,
                dimension: 384,
                base_url: default_openai_base_url(),
                api_key_env: default_openai_key_env(),
            },
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            originality: OriginalityConfig::default(),
            patterns: PatternsConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let config = Config::default();
        assert_eq!(config.chunking.max_chars, 3000);
        assert_eq!(config.chunking.overlap, 300);
        assert_eq!(config.retrieval.top_k, 8);
        assert!((config.retrieval.min_similarity - 0.55).abs() < f32::EPSILON);
        assert_eq!(config.generation.max_attempts, 4);
        assert!((config.originality.max_cosine_similarity - 0.82).abs() < f32::EPSILON);
        assert!((config.originality.max_jaccard_overlap - 0.18).abs() < f32::EPSILON);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let config = Config::default();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.meta.schema_version, "1.0.0");
        assert_eq!(loaded.generation.style_hints.len(), 3);
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(&temp.path().join("nope.toml"));
        assert!(matches!(result, Err(HuntError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_apply_profile() {
        let mut config = Config::default();
        config.profiles.insert(
            "local".to_string(),
            ProfileOverrides {
                embedding_mode: None,
                embedding_model: None,
                llm_provider: Some("ollama".to_string()),
                llm_model: Some("llama3.1".to_string()),
                max_attempts: Some(2),
            },
        );

        config.apply_profile("local").unwrap();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "llama3.1");
        assert_eq!(config.generation.max_attempts, 2);

        assert!(config.apply_profile("missing").is_err());
    }

    #[test]
    fn test_env_value_parsing() {
        let mut config = Config::default();
        config
            .set_value_from_env("RETRIEVAL__TOP_K", "12")
            .unwrap();
        assert_eq!(config.retrieval.top_k, 12);

        let err = config.set_value_from_env("RETRIEVAL__MIN_SIMILARITY", "high");
        assert!(matches!(err, Err(HuntError::InvalidConfigValue { .. })));
    }

    #[test]
    fn test_expand_path_passthrough() {
        let path = PathBuf::from("/tmp/huntsmith");
        assert_eq!(expand_path(&path).unwrap(), path);
    }
}
