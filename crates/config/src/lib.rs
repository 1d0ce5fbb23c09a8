//! Configuration loading, validation, and management for Parley.
//!
//! Loads configuration from `~/.parley/config.toml`, then a `.env` file in
//! the working directory, then environment variable overrides. Validates all
//! settings at load time; credential presence is checked separately by
//! [`AppConfig::require_generation_key`] and [`AppConfig::require_retrieval_key`]
//! because which credentials are needed depends on the persona.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.parley/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language-generation service settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Vector backend settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Agent loop limits
    #[serde(default)]
    pub agent: AgentSettings,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// "gemini" or "openai" (any OpenAI-compatible endpoint)
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Override the persona's default model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Override the persona's default temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_provider() -> String {
    "gemini".into()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            api_url: None,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Name of the pre-existing index
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Control-plane URL used to resolve the index host
    #[serde(default = "default_control_url")]
    pub control_url: String,

    /// Number of nearest records to request
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_index_name() -> String {
    "langchain-books-pure-v1".into()
}
fn default_control_url() -> String {
    "https://api.pinecone.io".into()
}
fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: default_index_name(),
            control_url: default_control_url(),
            top_k: default_top_k(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl std::fmt::Debug for RetrievalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalConfig")
            .field("api_key", &redact(&self.api_key))
            .field("index_name", &self.index_name)
            .field("control_url", &self.control_url)
            .field("top_k", &self.top_k)
            .field("embedding", &self.embedding)
            .finish()
    }
}

/// Where query embeddings come from. Must match the model the index was
/// built with (384-dim MiniLM for the book index).
#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible embeddings endpoint (e.g. a local TEI server)
    #[serde(default = "default_embedding_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,
}

fn default_embedding_url() -> String {
    "http://localhost:8080/v1".into()
}
fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".into()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_url: default_embedding_url(),
            api_key: None,
            model: default_embedding_model(),
        }
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Hard ceiling on reasoning requests per turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Timeout applied to every generation request and capability call
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Most recent transcript turns included in the reasoning context (0 = all)
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_max_iterations() -> u32 {
    8
}
fn default_call_timeout_secs() -> u64 {
    60
}
fn default_history_window() -> usize {
    40
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            call_timeout_secs: default_call_timeout_secs(),
            history_window: default_history_window(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.parley/config.toml),
    /// a `.env` file, and the process environment.
    ///
    /// Environment variables (highest priority):
    /// - `PARLEY_API_KEY`, then the provider's own key (`GOOGLE_API_KEY` / `OPENAI_API_KEY`)
    /// - `PINECONE_API_KEY`
    /// - `PARLEY_PROVIDER`, `PARLEY_MODEL`, `PARLEY_EMBEDDING_URL`
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("PARLEY_PROVIDER") {
            self.generation.provider = provider;
        }
        if let Some(model) = lookup("PARLEY_MODEL") {
            self.generation.model = Some(model);
        }

        // Environment wins over the file for secrets
        let generation_key =
            lookup("PARLEY_API_KEY").or_else(|| lookup(self.generation_key_var()));
        if generation_key.is_some() {
            self.generation.api_key = generation_key;
        }

        if let Some(key) = lookup("PINECONE_API_KEY") {
            self.retrieval.api_key = Some(key);
        }
        if let Some(url) = lookup("PARLEY_EMBEDDING_URL") {
            self.retrieval.embedding.api_url = url;
        }
    }

    /// The environment variable conventionally holding the generation key.
    pub fn generation_key_var(&self) -> &'static str {
        match self.generation.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            _ => "GOOGLE_API_KEY",
        }
    }

    /// The generation API key, or a fatal startup error naming the variable.
    pub fn require_generation_key(&self) -> Result<&str, ConfigError> {
        self.generation
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential {
                variable: self.generation_key_var(),
            })
    }

    /// The vector backend API key, or a fatal startup error.
    pub fn require_retrieval_key(&self) -> Result<&str, ConfigError> {
        self.retrieval
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential {
                variable: "PINECONE_API_KEY",
            })
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".parley")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.generation.temperature
            && !(0.0..=2.0).contains(&t)
        {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !matches!(self.generation.provider.as_str(), "gemini" | "openai") {
            return Err(ConfigError::ValidationError(format!(
                "generation.provider must be \"gemini\" or \"openai\", got \"{}\"",
                self.generation.provider
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.agent.call_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agent.call_timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `parley config --init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Error: {variable} environment variable not set.")]
    MissingCredential { variable: &'static str },
}
