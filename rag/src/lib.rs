//! # RAG
//!
//! Retrieval-augmented answering over the lab datasets: embed a question,
//! retrieve the most similar records, fold them into a prompt, and ask a
//! chat model for the answer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Answer Pipeline                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  question ──► Retriever ──► RetrievedDoc list               │
//! │                  │                │                         │
//! │          EmbeddingProvider   compose_prompt                 │
//! │               SearchEngine        │                         │
//! │                                   ▼                         │
//! │                              ChatClient ──► answer          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod composer;
pub mod config;
pub mod error;
pub mod ingest;
pub mod retriever;

pub use composer::{AnswerPipeline, ChatClient, compose_prompt};
pub use config::RagConfig;
pub use error::{RagError, Result};
pub use ingest::{DatasetEntry, IngestReport, ingest_dataset};
pub use retriever::{RetrievedDoc, Retriever};
