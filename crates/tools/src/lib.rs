//! Built-in capability implementations for Parley.
//!
//! Capabilities give the agent something to consult mid-turn. Today that is
//! a single one: similarity search over a book index.

pub mod book_search;

use std::sync::Arc;

use parley_core::capability::CapabilityRegistry;
use parley_core::error::CapabilityError;
use parley_core::retrieval::VectorIndex;

pub use book_search::BookSearchCapability;

/// The registry for the creative-writing persona: book search only.
pub fn creative_registry(
    index: Arc<dyn VectorIndex>,
    top_k: usize,
) -> Result<CapabilityRegistry, CapabilityError> {
    CapabilityRegistry::from_capabilities(vec![Box::new(BookSearchCapability::new(index, top_k))])
}
