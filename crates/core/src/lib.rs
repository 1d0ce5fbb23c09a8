//! # Parley Core
//!
//! Domain types, traits, and error definitions for the Parley
//! conversational-agent core. This crate has **no transport dependencies**:
//! it defines the model every other crate implements against.
//!
//! - [`message`]: sessions keys, transcript turns, and provider messages
//! - [`provider`]: the language-generation service contract
//! - [`capability`]: invocable side functions and their registry
//! - [`retrieval`]: vector-search and embedding contracts
//! - [`event`]: domain events published by the agent loop

pub mod capability;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod retrieval;

// Re-export key types at crate root for ergonomics
pub use capability::{Capability, CapabilityDescriptor, CapabilityRegistry};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, Role, SessionKey, Speaker, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use retrieval::{Embedder, RetrievedDocument, VectorIndex};
