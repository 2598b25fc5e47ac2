//! Error types for the RAG pipeline.

use thiserror::Error;

/// Result type alias for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors that can occur in the RAG pipeline.
#[derive(Error, Debug)]
pub enum RagError {
    /// Embedding provider error.
    #[error("embedding error: {0}")]
    Embedding(#[from] raglab_embeddings::EmbeddingError),

    /// Search engine error.
    #[error("search error: {0}")]
    Search(#[from] raglab_search::SearchError),

    /// Store error during ingestion.
    #[error("store error: {0}")]
    Store(#[from] raglab_search::StoreError),

    /// Chat client has no API key.
    #[error("chat client not configured")]
    ChatNotConfigured,

    /// Chat completions API request failed.
    #[error("chat API request failed: {0}")]
    ChatApi(String),

    /// Invalid response from the chat API.
    #[error("invalid chat response: {0}")]
    InvalidResponse(String),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
