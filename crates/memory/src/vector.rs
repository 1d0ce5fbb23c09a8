//! Vector similarity search utilities.
//!
//! Pure-Rust cosine similarity plus [`InMemoryIndex`], a small brute-force
//! [`VectorIndex`] for tests and offline runs without a hosted backend.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::error::RetrievalError;
use parley_core::retrieval::{Embedder, RetrievedDocument, VectorIndex};
use tokio::sync::RwLock;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// A brute-force cosine index held in memory.
pub struct InMemoryIndex {
    name: String,
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<(Vec<f32>, RetrievedDocument)>>,
}

impl InMemoryIndex {
    pub fn new(name: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            name: name.into(),
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Embed each document's `content` and add it to the index.
    pub async fn add_documents(&self, docs: Vec<RetrievedDocument>) -> Result<(), RetrievalError> {
        if docs.is_empty() {
            return Ok(());
        }
        let texts: Vec<String> = docs.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != docs.len() {
            return Err(RetrievalError::Embedding(format!(
                "expected {} embeddings, got {}",
                docs.len(),
                embeddings.len()
            )));
        }

        self.entries
            .write()
            .await
            .extend(embeddings.into_iter().zip(docs));
        Ok(())
    }

    /// Add a document with a precomputed embedding.
    pub async fn insert(&self, embedding: Vec<f32>, doc: RetrievedDocument) {
        self.entries.write().await.push((embedding, doc));
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let query = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Embedding("embedder returned no vector".into()))?;

        let entries = self.entries.read().await;
        let mut scored: Vec<RetrievedDocument> = entries
            .iter()
            .map(|(embedding, doc)| {
                let mut d = doc.clone();
                d.score = cosine_similarity(embedding, &query);
                d
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}
