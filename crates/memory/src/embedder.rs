//! Query embeddings backed by a [`Provider`]'s `embed` endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::error::RetrievalError;
use parley_core::provider::{EmbeddingRequest, Provider};
use parley_core::retrieval::Embedder;

/// Embeds text with a fixed model through any provider that supports it.
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: texts.to_vec(),
            })
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        if response.embeddings.len() != texts.len() {
            return Err(RetrievalError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::error::ProviderError;
    use parley_core::message::Message;
    use parley_core::provider::{EmbeddingResponse, ProviderRequest, ProviderResponse};

    struct FixedProvider {
        dims: usize,
        drop_one: bool,
    }

    #[async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant(""),
                usage: None,
                model: request.model,
            })
        }

        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            let mut embeddings: Vec<Vec<f32>> =
                request.inputs.iter().map(|_| vec![0.5; self.dims]).collect();
            if self.drop_one {
                embeddings.pop();
            }
            Ok(EmbeddingResponse {
                embeddings,
                model: request.model,
            })
        }
    }

    struct NoEmbeddings;

    #[async_trait]
    impl Provider for NoEmbeddings {
        fn name(&self) -> &str {
            "chat_only"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant(""),
                usage: None,
                model: request.model,
            })
        }
    }

    #[tokio::test]
    async fn embeds_each_input() {
        let embedder = ProviderEmbedder::new(
            Arc::new(FixedProvider {
                dims: 384,
                drop_one: false,
            }),
            "sentence-transformers/all-MiniLM-L6-v2",
        );
        let vectors = embedder
            .embed(&["space".into(), "magic".into()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), 384);
    }

    #[tokio::test]
    async fn count_mismatch_is_an_error() {
        let embedder = ProviderEmbedder::new(
            Arc::new(FixedProvider {
                dims: 3,
                drop_one: true,
            }),
            "m",
        );
        let err = embedder.embed(&["a".into(), "b".into()]).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Embedding(_)));
    }

    #[tokio::test]
    async fn unsupported_provider_maps_to_embedding_error() {
        let embedder = ProviderEmbedder::new(Arc::new(NoEmbeddings), "m");
        let err = embedder.embed(&["a".into()]).await.unwrap_err();
        match err {
            RetrievalError::Embedding(msg) => assert!(msg.contains("chat_only")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
