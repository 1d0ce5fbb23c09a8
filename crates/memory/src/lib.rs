//! Conversation state and retrieval backends for Parley.
//!
//! - [`session`]: per-conversation transcripts keyed by [`SessionKey`](parley_core::SessionKey)
//! - [`vector`]: cosine similarity and an in-memory [`VectorIndex`](parley_core::VectorIndex)
//! - [`pinecone`]: the hosted Pinecone index over HTTP
//! - [`embedder`]: query embeddings through any provider's `embed`

pub mod embedder;
pub mod pinecone;
pub mod session;
pub mod vector;

pub use embedder::ProviderEmbedder;
pub use pinecone::PineconeIndex;
pub use session::{Session, SessionStore};
pub use vector::{InMemoryIndex, cosine_similarity};
