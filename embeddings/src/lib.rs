//! # Embeddings
//!
//! This crate provides embedding generation and the vector math shared by
//! the RAG lab exercises.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors via the OpenAI
//!   embeddings API
//! - **Vector Math**: Cosine similarity/distance and dimension checking
//! - **Caching**: Bounded in-memory cache to avoid re-embedding repeated text
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Embeddings System                      │
//! ├─────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► similarity math    │
//! │       │                                                 │
//! │       ▼                                                 │
//! │  CachedProvider ──► EmbeddingCache                      │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod error;
pub mod provider;
pub mod similarity;

pub use cache::{CachedProvider, EmbeddingCache};
pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OpenAiProvider};
pub use similarity::{cosine_distance, cosine_similarity};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings (varies by model).
pub const DEFAULT_DIMENSION: usize = 1536; // OpenAI text-embedding-3-small
