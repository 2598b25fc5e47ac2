//! Vector store backing the search engine.
//!
//! Records are append-only: created at ingestion, immutable thereafter. Ids
//! are assigned sequentially so insertion order is recoverable, which the
//! engine relies on for tie-breaking.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use raglab_embeddings::Embedding;

/// Errors raised at the store boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or queried.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Inserted vector length does not match the store dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// A stored (id, label, embedding) record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier, assigned at insertion.
    pub id: u64,

    /// Display label.
    pub label: String,

    /// The embedding vector.
    pub embedding: Embedding,
}

/// Trait for vector stores.
///
/// The engine only reads; `insert` exists for ingestion. Implementations
/// must be safe for concurrent read access.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert a record and return its assigned id.
    async fn insert(&self, label: &str, embedding: Embedding) -> Result<u64, StoreError>;

    /// Snapshot of all records in insertion order.
    async fn records(&self) -> Result<Vec<Record>, StoreError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, StoreError>;
}

/// In-memory vector store.
///
/// Keeps records in a `Vec` so insertion order is the iteration order; ids
/// start at 1, mirroring the lab schema's serial primary key.
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<Record>>>,
    dimension: usize,
}

impl InMemoryStore {
    /// Create an empty store for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            dimension,
        }
    }

    /// The dimension this store accepts.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn insert(&self, label: &str, embedding: Embedding) -> Result<u64, StoreError> {
        if embedding.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let mut records = self.records.write().await;
        let id = records.len() as u64 + 1;
        records.push(Record {
            id,
            label: label.to_string(),
            embedding,
        });
        debug!("Inserted record {id}: {label}");

        Ok(id)
    }

    async fn records(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().await.len())
    }
}
