//! Language-generation provider implementations for Parley.
//!
//! All providers implement the `parley_core::Provider` trait.
//! [`build_provider`] selects the backend named in configuration.

pub mod gemini;
pub mod openai_compat;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;

use std::sync::Arc;
use std::time::Duration;

use parley_config::{AppConfig, ConfigError};
use parley_core::provider::Provider;

/// Shared HTTP client settings for every provider.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Build the generation provider from configuration.
///
/// Fails with [`ConfigError::MissingCredential`] when no key is available
/// for the selected provider.
pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, ConfigError> {
    let api_key = config.require_generation_key()?;
    let api_url = config.generation.api_url.as_deref();

    let provider: Arc<dyn Provider> = match config.generation.provider.as_str() {
        "openai" => Arc::new(OpenAiCompatProvider::new(
            "openai",
            api_url.unwrap_or("https://api.openai.com/v1"),
            api_key,
        )),
        _ => match api_url {
            Some(url) => Arc::new(GeminiProvider::with_base_url(url, api_key)),
            None => Arc::new(GeminiProvider::new(api_key)),
        },
    };

    tracing::debug!(provider = provider.name(), "Generation provider ready");
    Ok(provider)
}

/// Build the provider that turns book-search queries into vectors.
///
/// Always an OpenAI-compatible `/embeddings` endpoint; a blank key is
/// allowed for local inference servers.
pub fn build_embedding_provider(config: &AppConfig) -> Arc<dyn Provider> {
    let embedding = &config.retrieval.embedding;
    Arc::new(OpenAiCompatProvider::new(
        "embeddings",
        embedding.api_url.as_str(),
        embedding.api_key.clone().unwrap_or_default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(provider: &str, key: Option<&str>) -> AppConfig {
        let mut config = AppConfig::default();
        config.generation.provider = provider.into();
        config.generation.api_key = key.map(String::from);
        config
    }

    #[test]
    fn gemini_is_the_default_backend() {
        let provider = build_provider(&config_with("gemini", Some("g-key"))).unwrap();
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn openai_backend_selected_by_name() {
        let provider = build_provider(&config_with("openai", Some("sk-key"))).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn missing_key_is_reported() {
        let err = build_provider(&config_with("gemini", None)).err().unwrap();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn embedding_provider_accepts_blank_key() {
        let provider = build_embedding_provider(&AppConfig::default());
        assert_eq!(provider.name(), "embeddings");
    }
}
