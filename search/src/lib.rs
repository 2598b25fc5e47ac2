//! # Search
//!
//! This crate provides the similarity search engine for the RAG labs:
//! rank stored records against one or more query embeddings, with optional
//! threshold and label filters.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Search Engine                        │
//! ├─────────────────────────────────────────────────────────┤
//! │                                                         │
//! │  query embedding(s) ──► SearchEngine ──► SearchResult   │
//! │                              │                          │
//! │                              ▼                          │
//! │                        VectorStore                      │
//! │                     (InMemoryStore, …)                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine is stateless per call and only ever reads from the store, so
//! concurrent queries against a shared store are safe.

pub mod engine;
pub mod error;
pub mod store;

pub use engine::{SearchEngine, SearchResult, mean_embedding};
pub use error::{Result, SearchError};
pub use store::{InMemoryStore, Record, StoreError, VectorStore};
