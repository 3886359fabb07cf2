//! Configuration management for jobsearch
//!
//! Configuration is loaded from a TOML file, then environment overrides are
//! applied, then the whole thing is validated in one pass.

use crate::error::{JobSearchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub llm: LlmConfig,
    pub engine: EngineConfig,
    pub search: SearchConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Generative model (oracle) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String, // "gemini" or "mock"
    pub endpoint: String,
    pub api_key_env: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: String,
}

/// Hybrid retrieval engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub url: String,
    pub api_key_env: String,
    pub collection: String,
    pub sparse_model: String,
    pub dense_model: String,
    /// Candidates fetched per channel before fusion
    pub prefetch_limit: usize,
    /// Reciprocal Rank Fusion constant
    pub rrf_k: f32,
    pub timeout: String,
}

/// Request shaping and result rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_top: usize,
    pub max_top: usize,
    /// Over-fetch factor so deduplication still leaves `top` results
    pub retrieval_multiplier: usize,
    pub min_query_chars: usize,
    pub max_query_chars: usize,
    pub snippet_max_length: usize,
    pub missing_value: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top: 3,
            max_top: 20,
            retrieval_multiplier: 3,
            min_query_chars: 2,
            max_query_chars: 120,
            snippet_max_length: 300,
            missing_value: "N/A".to_string(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(&self.timeout).ok_or_else(|| JobSearchError::InvalidConfigValue {
            path: "llm.timeout".to_string(),
            message: format!("Invalid duration format: {}", self.timeout),
        })
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        read_key(&self.api_key_env, "llm.api_key_env")
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(&self.timeout).ok_or_else(|| JobSearchError::InvalidConfigValue {
            path: "engine.timeout".to_string(),
            message: format!("Invalid duration format: {}", self.timeout),
        })
    }

    /// Read the API key, if any. Local engines run without one.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

fn read_key(env_var: &str, path: &str) -> Result<String> {
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        Ok(_) => Err(JobSearchError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Environment variable {} is empty", env_var),
        }),
        Err(_) => Err(JobSearchError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Environment variable {} is not set", env_var),
        }),
    }
}

/// Parse duration strings like "500ms", "30s", "5m", "1h". Bare numbers are seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => s.split_at(idx),
        None => (s, "s"),
    };
    let value: u64 = digits.parse().ok()?;
    match unit {
        "ms" => Some(Duration::from_millis(value)),
        "s" => Some(Duration::from_secs(value)),
        "m" => Some(Duration::from_secs(value.checked_mul(60)?)),
        "h" => Some(Duration::from_secs(value.checked_mul(3600)?)),
        _ => None,
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(JobSearchError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| JobSearchError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Default configuration with environment overrides applied, validated like a loaded file
    pub fn from_env() -> Result<Self> {
        Self::defaults_with_overrides(std::env::vars())
    }

    fn defaults_with_overrides(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(vars);
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| JobSearchError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: JOBSEARCH_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    fn apply_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("JOBSEARCH_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "LLM__PROVIDER" => self.llm.provider = value.to_string(),
            "LLM__ENDPOINT" => self.llm.endpoint = value.to_string(),
            "LLM__MODEL" => self.llm.model = value.to_string(),
            "LLM__TEMPERATURE" => self.llm.temperature = parse_env(path, value)?,
            "LLM__TIMEOUT" => self.llm.timeout = value.to_string(),
            "ENGINE__URL" => self.engine.url = value.to_string(),
            "ENGINE__COLLECTION" => self.engine.collection = value.to_string(),
            "ENGINE__PREFETCH_LIMIT" => self.engine.prefetch_limit = parse_env(path, value)?,
            "ENGINE__TIMEOUT" => self.engine.timeout = value.to_string(),
            "SEARCH__DEFAULT_TOP" => self.search.default_top = parse_env(path, value)?,
            "SEARCH__MAX_TOP" => self.search.max_top = parse_env(path, value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            JobSearchError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("jobsearch").join("config.toml"))
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| JobSearchError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}'", value),
        })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
            },
            llm: LlmConfig {
                provider: "gemini".to_string(),
                endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                api_key_env: "GEMINI_API_KEY".to_string(),
                model: "gemini-2.5-flash".to_string(),
                temperature: 0.3,
                max_tokens: 10000,
                timeout: "30s".to_string(),
            },
            engine: EngineConfig {
                url: "http://localhost:6333".to_string(),
                api_key_env: "QDRANT_API_KEY".to_string(),
                collection: "hybrid_search".to_string(),
                sparse_model: "Qdrant/bm25".to_string(),
                dense_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
                prefetch_limit: 20,
                rrf_k: 60.0,
                timeout: "10s".to_string(),
            },
            search: SearchConfig::default(),
        }
    }
}
