//! Pinecone vector index over its REST API.
//!
//! Connecting resolves the index's data-plane host through the control plane
//! (`GET /indexes/{name}`); a missing index is reported as
//! [`RetrievalError::IndexNotFound`] so callers can fail before any
//! conversation starts. Queries embed the text locally and call `/query`.
//! Records are expected in the LangChain layout: page text under the `text`
//! metadata key, everything else as plain metadata.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parley_core::error::RetrievalError;
use parley_core::retrieval::{Embedder, RetrievedDocument, VectorIndex};
use serde::Deserialize;
use tracing::{debug, info, warn};

const API_VERSION: &str = "2024-07";
const TEXT_KEY: &str = "text";

/// A hosted Pinecone index.
pub struct PineconeIndex {
    name: String,
    host: String,
    api_key: String,
    namespace: String,
    embedder: Arc<dyn Embedder>,
    client: reqwest::Client,
}

impl PineconeIndex {
    /// Look up `index_name` on the control plane and bind to its host.
    pub async fn connect(
        api_key: impl Into<String>,
        control_url: &str,
        index_name: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrievalError> {
        let api_key = api_key.into();
        let name = index_name.into();
        let client = http_client();
        let url = format!("{}/indexes/{}", control_url.trim_end_matches('/'), name);

        debug!(index = %name, "Resolving Pinecone index host");

        let response = client
            .get(&url)
            .header("Api-Key", &api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        match status {
            200 => {}
            404 => return Err(RetrievalError::IndexNotFound(name)),
            401 | 403 => {
                return Err(RetrievalError::AuthenticationFailed(
                    "Invalid Pinecone API key".into(),
                ));
            }
            _ => {
                let message = response.text().await.unwrap_or_default();
                return Err(RetrievalError::Backend {
                    status_code: status,
                    message,
                });
            }
        }

        let description: IndexDescription =
            response.json().await.map_err(|e| RetrievalError::Backend {
                status_code: 200,
                message: format!("Failed to parse index description: {e}"),
            })?;

        info!(index = %name, host = %description.host, "Connected to Pinecone index");

        Ok(Self {
            name,
            host: normalize_host(&description.host),
            api_key,
            namespace: String::new(),
            embedder,
            client,
        })
    }

    /// Bind directly to a known data-plane host, skipping the control plane.
    pub fn with_host(
        api_key: impl Into<String>,
        host: &str,
        index_name: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            name: index_name.into(),
            host: normalize_host(host),
            api_key: api_key.into(),
            namespace: String::new(),
            embedder,
            client: http_client(),
        }
    }

    /// Query a specific namespace instead of the default one.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let vector = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Embedding("embedder returned no vector".into()))?;

        let body = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
            "namespace": self.namespace,
        });

        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(RetrievalError::AuthenticationFailed(
                "Invalid Pinecone API key".into(),
            ));
        }
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            warn!(status, index = %self.name, "Pinecone query failed");
            return Err(RetrievalError::Backend {
                status_code: status,
                message,
            });
        }

        let parsed: QueryResponse = response.json().await.map_err(|e| RetrievalError::Backend {
            status_code: 200,
            message: format!("Failed to parse query response: {e}"),
        })?;

        debug!(index = %self.name, matches = parsed.matches.len(), "Pinecone query complete");

        Ok(parsed.matches.into_iter().map(QueryMatch::into_document).collect())
    }
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// The control plane returns bare hostnames; tests and proxies pass full URLs.
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

// --- Pinecone API types (internal) ---

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl QueryMatch {
    fn into_document(self) -> RetrievedDocument {
        let mut metadata = self.metadata.unwrap_or_default();
        let content = match metadata.remove(TEXT_KEY) {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        RetrievedDocument {
            id: self.id,
            content,
            metadata,
            score: self.score,
        }
    }
}
