//! Command-line runner for the RAG lab exercises.
//!
//! Loads a JSON dataset (bare labels, or labels with precomputed
//! embeddings) into an in-memory vector store, then runs similarity
//! searches or the full retrieval-augmented answer pipeline against it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use raglab_embeddings::{
    CachedProvider, Embedding, EmbeddingCache, EmbeddingRequest, OpenAiProvider,
};
use raglab_rag::{
    AnswerPipeline, ChatClient, DatasetEntry, RagConfig, Retriever, ingest_dataset,
};
use raglab_search::{InMemoryStore, SearchEngine, SearchResult, VectorStore};

/// Questions from the original recipe lab's demo run.
const DEMO_QUESTIONS: [&str; 4] = [
    "What are some meals with chicken?",
    "What are some low calorie meals?",
    "What are some vegetarian meals?",
    "What are some hot desserts?",
];

#[derive(Parser)]
#[command(name = "raglab", about = "RAG lab exercises over an in-memory vector store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a dataset and report how many records it holds
    Check {
        /// Path to the dataset JSON file
        #[arg(long)]
        data: PathBuf,
    },

    /// Run a similarity search against a dataset
    Search {
        /// Path to the dataset JSON file
        #[arg(long)]
        data: PathBuf,

        /// Free-text query, embedded via the API
        #[arg(long, conflicts_with = "index")]
        text: Option<String>,

        /// Query with the embedding of the dataset entry at this index
        #[arg(long)]
        index: Option<usize>,

        /// Average the embeddings of these dataset entries into one query
        #[arg(long = "ref-index")]
        ref_indices: Vec<usize>,

        /// Maximum number of results
        #[arg(long, default_value_t = 5)]
        limit: usize,

        /// Keep only results strictly above this similarity
        #[arg(long)]
        threshold: Option<f32>,

        /// Case-insensitive label substring filter; repeat for OR
        #[arg(long = "filter")]
        filters: Vec<String>,
    },

    /// Ask one question through the RAG pipeline
    Ask {
        /// Path to the dataset JSON file
        #[arg(long)]
        data: PathBuf,

        /// The question to answer
        question: String,
    },

    /// Run the lab's canned demo questions
    Demo {
        /// Path to the dataset JSON file
        #[arg(long)]
        data: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = RagConfig::default();

    match cli.command {
        Command::Check { data } => check(&data, &config).await,
        Command::Search {
            data,
            text,
            index,
            ref_indices,
            limit,
            threshold,
            filters,
        } => {
            search(
                &data,
                &config,
                text,
                index,
                &ref_indices,
                limit,
                threshold,
                &filters,
            )
            .await
        }
        Command::Ask { data, question } => {
            let answer = ask(&data, &config, &question).await?;
            println!("Question: {question}");
            println!("Answer: {answer}");
            Ok(())
        }
        Command::Demo { data } => {
            for question in DEMO_QUESTIONS {
                let answer = ask(&data, &config, question).await?;
                println!();
                println!("Question: {question}");
                println!("Answer: {answer}");
                println!("{}", "-".repeat(80));
            }
            Ok(())
        }
    }
}

async fn check(data: &Path, config: &RagConfig) -> Result<()> {
    let (store, _) = load_store(data, config).await?;
    let count = store.count().await?;
    println!("Found {count} records in dataset");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn search(
    data: &Path,
    config: &RagConfig,
    text: Option<String>,
    index: Option<usize>,
    ref_indices: &[usize],
    limit: usize,
    threshold: Option<f32>,
    filters: &[String],
) -> Result<()> {
    let entries = load_entries(data)?;
    let provider = cached_provider(config);
    let (store, dimension) = ingest(&entries, &provider, config).await?;
    let engine = SearchEngine::new(store, dimension);

    let results = if !ref_indices.is_empty() {
        if threshold.is_some() || !filters.is_empty() {
            bail!("--ref-index cannot be combined with --threshold or --filter");
        }
        let mut references = Vec::with_capacity(ref_indices.len());
        for &idx in ref_indices {
            references.push(entry_vector(&entries, idx, &provider, config).await?);
        }
        engine.find_similar_to_multiple(&references, limit).await?
    } else {
        let query = query_vector(&entries, text, index, &provider, config).await?;
        if !filters.is_empty() {
            if threshold.is_some() {
                bail!("--filter cannot be combined with --threshold");
            }
            engine.find_with_text_filter(&query, filters, limit).await?
        } else if let Some(threshold) = threshold {
            engine.find_above_threshold(&query, threshold, limit).await?
        } else {
            engine.find_top_k(&query, limit).await?
        }
    };

    print_results(&results);
    Ok(())
}

async fn ask(data: &Path, config: &RagConfig, question: &str) -> Result<String> {
    let (store, dimension) = load_store(data, config).await?;
    let engine = SearchEngine::new(store, dimension);

    let retriever = Retriever::new(Arc::new(OpenAiProvider::new()), engine, config);
    let chat = ChatClient::new(config);
    let pipeline = AnswerPipeline::new(retriever, chat, config);

    Ok(pipeline.answer(question).await?)
}

fn load_entries(data: &Path) -> Result<Vec<DatasetEntry>> {
    let raw = std::fs::read_to_string(data)
        .with_context(|| format!("failed to read dataset: {}", data.display()))?;
    let entries: Vec<DatasetEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse dataset: {}", data.display()))?;
    Ok(entries)
}

fn cached_provider(config: &RagConfig) -> CachedProvider<OpenAiProvider> {
    let cache_size = if config.embedding.cache_enabled {
        config.embedding.cache_max_entries
    } else {
        0
    };
    CachedProvider::new(OpenAiProvider::new(), EmbeddingCache::new(cache_size))
}

async fn load_store(data: &Path, config: &RagConfig) -> Result<(Arc<InMemoryStore>, usize)> {
    let entries = load_entries(data)?;
    let provider = cached_provider(config);
    ingest(&entries, &provider, config).await
}

async fn ingest(
    entries: &[DatasetEntry],
    provider: &CachedProvider<OpenAiProvider>,
    config: &RagConfig,
) -> Result<(Arc<InMemoryStore>, usize)> {
    // Precomputed vectors decide the dimension; all-text datasets use the
    // configured embedding dimension.
    let dimension = entries
        .iter()
        .find_map(|e| e.embedding().map(Vec::len))
        .unwrap_or(config.embedding.dimension);

    let store = Arc::new(InMemoryStore::new(dimension));
    let report = ingest_dataset(
        provider,
        store.as_ref(),
        entries.to_vec(),
        &config.embedding.model,
    )
    .await?;
    info!(
        "Loaded {} records ({} embedded via API)",
        report.inserted, report.embedded
    );

    Ok((store, dimension))
}

async fn query_vector(
    entries: &[DatasetEntry],
    text: Option<String>,
    index: Option<usize>,
    provider: &CachedProvider<OpenAiProvider>,
    config: &RagConfig,
) -> Result<Embedding> {
    match (text, index) {
        (Some(text), None) => {
            let response = provider
                .embed(EmbeddingRequest::new(text).with_model(config.embedding.model.as_str()))
                .await?;
            Ok(response.embedding)
        }
        (None, Some(index)) => entry_vector(entries, index, provider, config).await,
        _ => bail!("provide a query: --text, --index, or --ref-index"),
    }
}

async fn entry_vector(
    entries: &[DatasetEntry],
    index: usize,
    provider: &CachedProvider<OpenAiProvider>,
    config: &RagConfig,
) -> Result<Embedding> {
    let entry = entries
        .get(index)
        .with_context(|| format!("dataset has no entry at index {index}"))?;

    match entry.embedding() {
        Some(embedding) => Ok(embedding.clone()),
        None => {
            let response = provider
                .embed(EmbeddingRequest::new(entry.label()).with_model(config.embedding.model.as_str()))
                .await?;
            Ok(response.embedding)
        }
    }
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{:>3}. {} (similarity: {:.4})",
            rank + 1,
            result.label,
            result.similarity
        );
    }
}
