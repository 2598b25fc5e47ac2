//! Similarity search engine.
//!
//! Every operation scores the full candidate set with
//! `similarity = 1 - cosine_distance(query, record)` and returns at most `k`
//! results in descending similarity order. Ties keep insertion order: the
//! store snapshot is insertion-ordered and the sort is stable.
//!
//! The engine holds an injected store handle and is stateless per call. It
//! neither logs nor retries; store and provider failures pass through to the
//! caller untouched.

use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use raglab_embeddings::{Embedding, cosine_distance};

use crate::error::{Result, SearchError};
use crate::store::{Record, VectorStore};

/// A scored search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Id of the matched record.
    pub id: u64,

    /// Label of the matched record.
    pub label: String,

    /// Similarity score in [-1, 1]; larger is more similar.
    pub similarity: f32,
}

/// Compute the componentwise arithmetic mean of a set of embeddings.
///
/// This is the first half of the multi-reference search: average the
/// references, then run a plain single-vector search with the result.
/// All inputs must share one dimension; an empty input set is an error.
pub fn mean_embedding(embeddings: &[Embedding]) -> Result<Embedding> {
    let Some(first) = embeddings.first() else {
        return Err(SearchError::EmptyQuerySet);
    };

    let dim = first.len();
    for e in embeddings {
        if e.len() != dim {
            return Err(SearchError::DimensionMismatch {
                expected: dim,
                actual: e.len(),
            });
        }
    }

    let n = embeddings.len() as f32;
    let mut mean = vec![0.0f32; dim];
    for embedding in embeddings {
        for (slot, value) in mean.iter_mut().zip(embedding.iter()) {
            *slot += value;
        }
    }
    for slot in mean.iter_mut() {
        *slot /= n;
    }

    Ok(mean)
}

/// Similarity search over a vector store.
pub struct SearchEngine {
    /// Injected store handle; the engine only reads from it.
    store: Arc<dyn VectorStore>,

    /// Expected dimension of all vectors.
    dimension: usize,
}

impl SearchEngine {
    /// Create an engine over the given store, expecting vectors of
    /// `dimension` components.
    pub fn new(store: Arc<dyn VectorStore>, dimension: usize) -> Self {
        Self { store, dimension }
    }

    /// The dimension this engine expects.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Return the `k` most similar records to `query`.
    ///
    /// An empty store yields an empty result, not an error. Fails with a
    /// dimension mismatch before touching the store if the query has the
    /// wrong length.
    pub async fn find_top_k(&self, query: &Embedding, k: usize) -> Result<Vec<SearchResult>> {
        self.check_query(query)?;
        let records = self.store.records().await?;
        let mut ranked = rank(query, &records)?;
        ranked.truncate(k);
        Ok(ranked)
    }

    /// Like [`find_top_k`], keeping only results with
    /// `similarity > threshold` (strict).
    ///
    /// [`find_top_k`]: SearchEngine::find_top_k
    pub async fn find_above_threshold(
        &self,
        query: &Embedding,
        threshold: f32,
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        self.check_query(query)?;
        let records = self.store.records().await?;
        let mut ranked = rank(query, &records)?;
        ranked.retain(|r| r.similarity > threshold);
        ranked.truncate(k);
        Ok(ranked)
    }

    /// Like [`find_top_k`], restricted to records whose label contains any
    /// of `patterns` (case-insensitive substring, OR across patterns).
    ///
    /// The filter narrows eligibility only; scores are still computed
    /// against the original query. An empty pattern set admits no
    /// candidates.
    ///
    /// [`find_top_k`]: SearchEngine::find_top_k
    pub async fn find_with_text_filter(
        &self,
        query: &Embedding,
        patterns: &[String],
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        self.check_query(query)?;
        let lowered: Vec<String> = patterns.iter().map(|p| p.to_lowercase()).collect();

        let records = self.store.records().await?;
        let candidates: Vec<Record> = records
            .into_iter()
            .filter(|r| {
                let label = r.label.to_lowercase();
                lowered.iter().any(|p| label.contains(p.as_str()))
            })
            .collect();

        let mut ranked = rank(query, &candidates)?;
        ranked.truncate(k);
        Ok(ranked)
    }

    /// Return the `k` records most similar to the componentwise mean of
    /// several reference vectors.
    ///
    /// A single-element reference set behaves exactly like [`find_top_k`]
    /// on that vector. Zero references is an error.
    ///
    /// [`find_top_k`]: SearchEngine::find_top_k
    pub async fn find_similar_to_multiple(
        &self,
        queries: &[Embedding],
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        let composite = mean_embedding(queries)?;
        self.find_top_k(&composite, k).await
    }

    fn check_query(&self, query: &Embedding) -> Result<()> {
        if query.len() != self.dimension {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        Ok(())
    }
}

/// Score `candidates` against `query` and sort descending by similarity.
///
/// `sort_by` is stable, so equal scores keep the candidates' order.
fn rank(query: &Embedding, candidates: &[Record]) -> Result<Vec<SearchResult>> {
    let mut scored: Vec<(OrderedFloat<f32>, &Record)> = Vec::with_capacity(candidates.len());

    for record in candidates {
        let similarity = 1.0 - cosine_distance(query, &record.embedding)?;
        scored.push((OrderedFloat(similarity), record));
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(scored
        .into_iter()
        .map(|(score, record)| SearchResult {
            id: record.id,
            label: record.label.clone(),
            similarity: score.0,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use pretty_assertions::assert_eq;

    async fn trip_engine() -> SearchEngine {
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
        SearchEngine::new(Arc::new(store), 3)
    }

    #[tokio::test]
    async fn test_top_k_orders_descending() {
        let engine = trip_engine().await;

        let results = engine.find_top_k(&vec![1.0, 0.0, 0.0], 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "ski trip");
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
        assert_eq!(results[1].label, "snow hike");
        assert!((results[1].similarity - 0.993_88).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_top_k_is_a_hard_cap() {
        let engine = trip_engine().await;

        let results = engine.find_top_k(&vec![1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 3);

        let results = engine.find_top_k(&vec![1.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_no_duplicate_ids() {
        let engine = trip_engine().await;

        let results = engine.find_top_k(&vec![0.5, 0.5, 0.0], 3).await.unwrap();
        let mut ids: Vec<u64> = results.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = InMemoryStore::new(2);
        // Same direction, different labels: identical similarity to any query.
        store.insert("first", vec![1.0, 0.0]).await.unwrap();
        store.insert("second", vec![2.0, 0.0]).await.unwrap();
        store.insert("third", vec![3.0, 0.0]).await.unwrap();
        let engine = SearchEngine::new(Arc::new(store), 2);

        let results = engine.find_top_k(&vec![0.0, 1.0], 3).await.unwrap();
        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_empty_store_returns_empty() {
        let store = InMemoryStore::new(3);
        let engine = SearchEngine::new(Arc::new(store), 3);

        let results = engine.find_top_k(&vec![1.0, 0.0, 0.0], 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_fatal() {
        let engine = trip_engine().await;

        let err = engine.find_top_k(&vec![1.0, 0.0], 5).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_idempotent_queries() {
        let engine = trip_engine().await;
        let query = vec![0.7, 0.3, 0.0];

        let first = engine.find_top_k(&query, 3).await.unwrap();
        let second = engine.find_top_k(&query, 3).await.unwrap();

        let firsts: Vec<(u64, String)> =
            first.into_iter().map(|r| (r.id, r.label)).collect();
        let seconds: Vec<(u64, String)> =
            second.into_iter().map(|r| (r.id, r.label)).collect();
        assert_eq!(firsts, seconds);
    }

    #[tokio::test]
    async fn test_threshold_is_strict_and_monotone() {
        let engine = trip_engine().await;
        let query = vec![1.0, 0.0, 0.0];

        let all = engine.find_top_k(&query, 3).await.unwrap();
        let filtered = engine.find_above_threshold(&query, 0.5, 3).await.unwrap();

        // Subset of the unfiltered ranking, same order.
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].id, all[0].id);
        assert_eq!(filtered[1].id, all[1].id);
        assert!(filtered.iter().all(|r| r.similarity > 0.5));

        // Raising the threshold never adds results.
        let tighter = engine.find_above_threshold(&query, 0.995, 3).await.unwrap();
        assert!(tighter.len() <= filtered.len());
        assert_eq!(tighter.len(), 1);

        // The boundary is exclusive: a record at exactly the threshold drops.
        let exact = engine.find_above_threshold(&query, 1.0, 3).await.unwrap();
        assert!(exact.is_empty());
    }

    #[tokio::test]
    async fn test_text_filter_is_case_insensitive_or() {
        let store = InMemoryStore::new(2);
        store.insert("Snowshoe Trek", vec![1.0, 0.0]).await.unwrap();
        store.insert("surf lesson", vec![0.0, 1.0]).await.unwrap();
        store.insert("ice skating", vec![0.8, 0.2]).await.unwrap();
        let engine = SearchEngine::new(Arc::new(store), 2);

        let patterns = vec!["snow".to_string(), "ice".to_string()];
        let results = engine
            .find_with_text_filter(&vec![1.0, 0.0], &patterns, 5)
            .await
            .unwrap();

        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Snowshoe Trek", "ice skating"]);
    }

    #[tokio::test]
    async fn test_text_filter_does_not_change_scores() {
        let store = InMemoryStore::new(2);
        store.insert("snow hike", vec![0.8, 0.2]).await.unwrap();
        store.insert("beach day", vec![1.0, 0.0]).await.unwrap();
        let engine = SearchEngine::new(Arc::new(store), 2);

        let query = vec![1.0, 0.0];
        let unfiltered = engine.find_top_k(&query, 5).await.unwrap();
        let filtered = engine
            .find_with_text_filter(&query, &["snow".to_string()], 5)
            .await
            .unwrap();

        // "snow hike" scores the same with or without the filter, even
        // though the filter excludes the better-scoring "beach day".
        let snow = unfiltered.iter().find(|r| r.label == "snow hike").unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].similarity, snow.similarity);
    }

    #[tokio::test]
    async fn test_text_filter_empty_patterns_admit_nothing() {
        let engine = trip_engine().await;

        let results = engine
            .find_with_text_filter(&vec![1.0, 0.0, 0.0], &[], 5)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_multi_reference_single_vector_is_identity() {
        let engine = trip_engine().await;
        let query = vec![0.9, 0.1, 0.0];

        let direct = engine.find_top_k(&query, 3).await.unwrap();
        let multi = engine
            .find_similar_to_multiple(std::slice::from_ref(&query), 3)
            .await
            .unwrap();

        let direct_ids: Vec<u64> = direct.iter().map(|r| r.id).collect();
        let multi_ids: Vec<u64> = multi.iter().map(|r| r.id).collect();
        assert_eq!(direct_ids, multi_ids);
    }

    #[tokio::test]
    async fn test_multi_reference_empty_set_errors() {
        let engine = trip_engine().await;

        let err = engine.find_similar_to_multiple(&[], 3).await.unwrap_err();
        assert!(matches!(err, SearchError::EmptyQuerySet));
    }

    #[tokio::test]
    async fn test_multi_reference_ragged_dimensions_error() {
        let engine = trip_engine().await;

        let err = engine
            .find_similar_to_multiple(&[vec![1.0, 0.0, 0.0], vec![1.0, 0.0]], 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_mean_embedding_componentwise() {
        let mean = mean_embedding(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(mean, vec![0.5, 0.5]);

        let mean = mean_embedding(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(mean, vec![3.0, 4.0]);
    }

    #[test]
    fn test_mean_embedding_single_is_identity() {
        let mean = mean_embedding(&[vec![0.25, 0.75, 0.5]]).unwrap();
        assert_eq!(mean, vec![0.25, 0.75, 0.5]);
    }
}
