//! Error types for the search engine.

use thiserror::Error;

use crate::store::StoreError;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur in the search engine.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Query vector length does not match the store dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A multi-vector query was given zero reference vectors.
    #[error("empty query set: at least one reference vector is required")]
    EmptyQuerySet,

    /// Store error, propagated verbatim.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Embedding math error.
    #[error("embedding error: {0}")]
    Embedding(#[from] raglab_embeddings::EmbeddingError),
}
