//! Error types for the Parley domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum. [`Error`] is what a turn
//! returns to its caller: only failures the turn cannot absorb reach it.
//! Capability and retrieval failures are recovered inside the turn.

use thiserror::Error;

/// The error a turn returns to its caller.
#[derive(Debug, Error)]
pub enum Error {
    // --- Generation service errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Capability already registered: {0}")]
    Duplicate(String),

    #[error("Capability execution failed: {name} — {reason}")]
    ExecutionFailed { name: String, reason: String },

    #[error("Capability timed out: {name} after {timeout_secs}s")]
    Timeout { name: String, timeout_secs: u64 },
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Index '{0}' not found. Please run the data ingestion script first.")]
    IndexNotFound(String),

    #[error("Vector backend request failed: {message} (status: {status_code})")]
    Backend { status_code: u16, message: String },

    #[error("Vector backend authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Network error: {0}")]
    Network(String),
}
