//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

/// Configuration for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Embedding settings.
    pub embedding: EmbeddingSettings,

    /// Retrieval settings.
    pub retrieval: RetrievalSettings,

    /// Chat completion settings.
    pub chat: ChatSettings,
}

impl RagConfig {
    /// Set the embedding settings.
    pub fn with_embedding(mut self, settings: EmbeddingSettings) -> Self {
        self.embedding = settings;
        self
    }

    /// Set the retrieval settings.
    pub fn with_retrieval(mut self, settings: RetrievalSettings) -> Self {
        self.retrieval = settings;
        self
    }

    /// Set the chat settings.
    pub fn with_chat(mut self, settings: ChatSettings) -> Self {
        self.chat = settings;
        self
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingSettings::default(),
            retrieval: RetrievalSettings::default(),
            chat: ChatSettings::default(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Model to embed with.
    pub model: String,

    /// Expected vector dimension.
    pub dimension: usize,

    /// Whether to cache embeddings during ingestion.
    pub cache_enabled: bool,

    /// Maximum cache size.
    pub cache_max_entries: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: raglab_embeddings::DEFAULT_DIMENSION,
            cache_enabled: true,
            cache_max_entries: 10000,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Maximum results for a plain search.
    pub limit: usize,

    /// Minimum similarity (exclusive) for retrieved documents.
    pub threshold: f32,

    /// How many documents feed the answer prompt.
    pub context_limit: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            limit: 5,
            threshold: 0.4,
            context_limit: 3,
        }
    }
}

/// Chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Chat model.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum completion tokens.
    pub max_tokens: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-nano".to_string(),
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}
