//! Embedding cache.
//!
//! The lab datasets contain duplicate titles; caching keeps ingestion from
//! paying for the same embedding twice. The cache is memory-only.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::Embedding;
use crate::error::Result;
use crate::provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};

/// A cached embedding with its insertion sequence number.
#[derive(Debug, Clone)]
struct CacheEntry {
    embedding: Embedding,
    sequence: u64,
}

/// Bounded in-memory cache of (text, model) -> embedding.
pub struct EmbeddingCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    max_entries: usize,
    next_sequence: Arc<RwLock<u64>>,
}

impl EmbeddingCache {
    /// Create a new cache holding at most `max_entries` embeddings.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_entries,
            next_sequence: Arc::new(RwLock::new(0)),
        }
    }

    fn key(text: &str, model: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        model.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }

    /// Get a cached embedding.
    pub async fn get(&self, text: &str, model: &str) -> Option<Embedding> {
        let key = Self::key(text, model);
        let entries = self.entries.read().await;
        entries.get(&key).map(|e| e.embedding.clone())
    }

    /// Cache an embedding, evicting the oldest entry at capacity.
    ///
    /// A zero-capacity cache stores nothing, which disables caching.
    pub async fn put(&self, text: &str, model: &str, embedding: Embedding) {
        if self.max_entries == 0 {
            return;
        }

        let key = Self::key(text, model);

        let sequence = {
            let mut next = self.next_sequence.write().await;
            *next += 1;
            *next
        };

        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.sequence)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(key, CacheEntry { embedding, sequence });
        debug!("Cached embedding (model: {model})");
    }

    /// Check whether an embedding is cached.
    pub async fn contains(&self, text: &str, model: &str) -> bool {
        let key = Self::key(text, model);
        self.entries.read().await.contains_key(&key)
    }

    /// Number of cached embeddings.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop all cached embeddings.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// A provider wrapper that consults the cache before calling through.
pub struct CachedProvider<P> {
    provider: P,
    cache: EmbeddingCache,
}

impl<P> CachedProvider<P>
where
    P: EmbeddingProvider,
{
    /// Create a new cached provider.
    pub fn new(provider: P, cache: EmbeddingCache) -> Self {
        Self { provider, cache }
    }

    /// Generate an embedding, reusing a cached one when present.
    pub async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string());

        if let Some(embedding) = self.cache.get(&request.text, &model).await {
            debug!("Cache hit for embedding");
            let dimension = embedding.len();
            return Ok(EmbeddingResponse {
                embedding,
                model,
                dimension,
                tokens_used: None,
            });
        }

        let response = self.provider.embed(request.clone()).await?;
        self.cache
            .put(&request.text, &model, response.embedding.clone())
            .await;

        Ok(response)
    }

    /// Get the underlying cache.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Get the wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }
}
