//! Book search: similarity search over an indexed book catalogue.
//!
//! Returns the top matches as plain text the model can quote from. An empty
//! result is a normal answer, not an error; backend failures are reported as
//! execution failures so the turn can recover.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::capability::Capability;
use parley_core::error::CapabilityError;
use parley_core::retrieval::{RetrievedDocument, VectorIndex};
use tracing::{info, warn};

pub const NAME: &str = "book_database_search";

const DESCRIPTION: &str = "Searches a vector database of books for relevant titles and authors based on a query. Use this to find inspiration, check for similar plot points, or understand character archetypes from existing works.";

/// Reply when the index has nothing close to the query.
pub const NO_RESULTS: &str = "No relevant books found in the database.";

const RESULTS_HEADER: &str = "Found the following relevant books in the database:\n";

pub struct BookSearchCapability {
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl BookSearchCapability {
    pub fn new(index: Arc<dyn VectorIndex>, top_k: usize) -> Self {
        Self { index, top_k }
    }
}

#[async_trait]
impl Capability for BookSearchCapability {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, query: &str) -> Result<String, CapabilityError> {
        info!(index = self.index.name(), query, "Searching book database");

        // Embedding endpoints reject blank input
        if query.trim().is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        let docs = self
            .index
            .query(query, self.top_k)
            .await
            .map_err(|e| {
                warn!(error = %e, "Book search failed");
                CapabilityError::ExecutionFailed {
                    name: NAME.into(),
                    reason: e.to_string(),
                }
            })?;

        Ok(format_results(&docs))
    }
}

/// Render documents as one `- Title: ..., Authors: ...` line each.
pub fn format_results(docs: &[RetrievedDocument]) -> String {
    if docs.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut out = String::from(RESULTS_HEADER);
    for doc in docs {
        let title = doc.metadata_text("title").unwrap_or_else(|| "N/A".into());
        let authors = doc.metadata_text("authors").unwrap_or_else(|| "N/A".into());
        out.push_str(&format!("- Title: {title}, Authors: {authors}\n"));
    }
    out
}
