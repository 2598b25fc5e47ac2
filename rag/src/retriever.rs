//! Document retrieval: embed a question, search the store, keep what
//! clears the similarity threshold.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use raglab_embeddings::{EmbeddingProvider, EmbeddingRequest};
use raglab_search::SearchEngine;

use crate::config::RagConfig;
use crate::error::Result;

/// A retrieved document: the record label plus how similar it was to the
/// query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDoc {
    /// Label of the retrieved record.
    pub label: String,

    /// Similarity to the query embedding.
    pub similarity: f32,
}

/// Retrieves the most relevant records for a free-text query.
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    engine: SearchEngine,
    model: String,
    threshold: f32,
}

impl Retriever {
    /// Create a retriever over an embedding provider and a search engine.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        engine: SearchEngine,
        config: &RagConfig,
    ) -> Self {
        Self {
            provider,
            engine,
            model: config.embedding.model.clone(),
            threshold: config.retrieval.threshold,
        }
    }

    /// Embed `query` and return up to `limit` records above the similarity
    /// threshold, best first.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedDoc>> {
        debug!("Retrieving documents for query: {query}");

        let response = self
            .provider
            .embed(EmbeddingRequest::new(query).with_model(self.model.as_str()))
            .await?;

        let results = self
            .engine
            .find_above_threshold(&response.embedding, self.threshold, limit)
            .await?;

        debug!("Retrieved {} documents", results.len());

        Ok(results
            .into_iter()
            .map(|r| RetrievedDoc {
                label: r.label,
                similarity: r.similarity,
            })
            .collect())
    }

    /// The similarity threshold applied to retrieved documents.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use raglab_embeddings::{Embedding, EmbeddingError, EmbeddingResponse};
    use raglab_search::{InMemoryStore, VectorStore};

    struct FixedProvider {
        embedding: Embedding,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn default_model(&self) -> &str {
            "test-model"
        }

        fn default_dimension(&self) -> usize {
            self.embedding.len()
        }

        async fn embed(
            &self,
            _request: EmbeddingRequest,
        ) -> std::result::Result<EmbeddingResponse, EmbeddingError> {
            Ok(EmbeddingResponse {
                embedding: self.embedding.clone(),
                model: "test-model".to_string(),
                dimension: self.embedding.len(),
                tokens_used: None,
            })
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    async fn retriever_with(query_embedding: Embedding) -> Retriever {
        let store = InMemoryStore::new(3);
        store.insert("ski trip", vec![1.0, 0.0, 0.0]).await.unwrap();
        store
            .insert("beach trip", vec![0.0, 1.0, 0.0])
            .await
            .unwrap();
        store
            .insert("snow hike", vec![0.9, 0.1, 0.0])
            .await
            .unwrap();

        let engine = SearchEngine::new(Arc::new(store), 3);
        let provider = Arc::new(FixedProvider {
            embedding: query_embedding,
        });
        Retriever::new(provider, engine, &RagConfig::default())
    }

    #[tokio::test]
    async fn test_retrieve_applies_threshold_and_limit() {
        let retriever = retriever_with(vec![1.0, 0.0, 0.0]).await;

        let docs = retriever.retrieve("winter getaway", 5).await.unwrap();

        // "beach trip" scores 0.0, below the 0.4 default threshold.
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].label, "ski trip");
        assert_eq!(docs[1].label, "snow hike");

        let docs = retriever.retrieve("winter getaway", 1).await.unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_retrieve_can_come_back_empty() {
        // Orthogonal to every stored record: all similarities are 0.
        let retriever = retriever_with(vec![0.0, 0.0, 1.0]).await;

        let docs = retriever.retrieve("space travel", 5).await.unwrap();
        assert!(docs.is_empty());
    }
}
