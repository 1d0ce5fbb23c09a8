//! Retrieval contracts: nearest-neighbour search over an existing index.
//!
//! The index itself (storage engine, ingestion) lives outside Parley. The
//! agent only needs "give me the k documents closest to this text".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A document returned by a similarity search, best match first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Backend identifier of the record
    pub id: String,

    /// The indexed text
    #[serde(default)]
    pub content: String,

    /// Free-form metadata stored alongside the vector (title, authors, ...)
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// Similarity to the query (cosine; higher is closer)
    #[serde(default)]
    pub score: f32,
}

impl RetrievedDocument {
    /// A metadata field rendered as text, if present and non-null.
    pub fn metadata_text(&self, key: &str) -> Option<String> {
        match self.metadata.get(key)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// A vector-similarity search backend.
///
/// Implementations: Pinecone (HTTP), in-memory (tests and offline use).
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The index name, for logs.
    fn name(&self) -> &str;

    /// Return up to `top_k` documents ranked by similarity to `text`.
    /// An empty result is a normal outcome, not an error.
    async fn query(&self, text: &str, top_k: usize)
    -> Result<Vec<RetrievedDocument>, RetrievalError>;
}

/// Turns text into dense vectors for similarity search.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed each input text, preserving order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError>;
}
