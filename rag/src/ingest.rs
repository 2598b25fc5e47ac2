//! Dataset ingestion.
//!
//! The lab datasets are JSON arrays of either bare labels (recipe titles)
//! or labels with precomputed embeddings (the travel-activity sample file).
//! Bare labels are embedded through the cached provider; everything is
//! inserted in file order so record ids follow the dataset.

use serde::Deserialize;
use tracing::info;

use raglab_embeddings::{CachedProvider, Embedding, EmbeddingProvider, EmbeddingRequest};
use raglab_search::VectorStore;

use crate::error::Result;

/// One dataset entry.
///
/// Accepts `"label"` plus the original labs' `"activity"` and `"title"`
/// field names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DatasetEntry {
    /// A label with a precomputed embedding.
    Embedded {
        /// Display label.
        #[serde(alias = "activity", alias = "title")]
        label: String,

        /// Precomputed embedding vector.
        embedding: Embedding,
    },

    /// A bare label; its embedding is generated at ingestion.
    Label(String),
}

impl DatasetEntry {
    /// The entry's label.
    pub fn label(&self) -> &str {
        match self {
            DatasetEntry::Embedded { label, .. } => label,
            DatasetEntry::Label(label) => label,
        }
    }

    /// The precomputed embedding, if the entry carries one.
    pub fn embedding(&self) -> Option<&Embedding> {
        match self {
            DatasetEntry::Embedded { embedding, .. } => Some(embedding),
            DatasetEntry::Label(_) => None,
        }
    }
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Records inserted into the store.
    pub inserted: usize,

    /// Entries that had to be embedded (no precomputed vector).
    pub embedded: usize,
}

/// Embed (where needed) and insert every entry, in order.
pub async fn ingest_dataset<P>(
    provider: &CachedProvider<P>,
    store: &dyn VectorStore,
    entries: Vec<DatasetEntry>,
    model: &str,
) -> Result<IngestReport>
where
    P: EmbeddingProvider,
{
    let mut report = IngestReport {
        inserted: 0,
        embedded: 0,
    };

    for entry in entries {
        let (label, embedding) = match entry {
            DatasetEntry::Embedded { label, embedding } => (label, embedding),
            DatasetEntry::Label(label) => {
                let response = provider
                    .embed(EmbeddingRequest::new(label.as_str()).with_model(model))
                    .await?;
                report.embedded += 1;
                (label, response.embedding)
            }
        };

        store.insert(&label, embedding).await?;
        report.inserted += 1;
    }

    info!(
        "Ingested {} records ({} embedded)",
        report.inserted, report.embedded
    );

    Ok(report)
}
