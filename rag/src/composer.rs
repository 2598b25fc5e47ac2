//! Answer composition: fold retrieved documents into a prompt and ask a
//! chat model.

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::retriever::{RetrievedDoc, Retriever};

/// Reply used when retrieval comes back empty; the chat model is not
/// consulted in that case.
pub const NO_CONTEXT_REPLY: &str =
    "I couldn't find any relevant recipes to answer your question.";

/// Build the answer prompt from a question and its retrieved context.
pub fn compose_prompt(question: &str, docs: &[RetrievedDoc]) -> String {
    let context = docs
        .iter()
        .map(|doc| format!("- {} (Similarity: {:.2})", doc.label, doc.similarity))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a helpful professional chef. Use the following relevant recipes to answer the user's question. If the recipes aren't relevant to the question, you can say so.\n\
         \n\
         Available Recipes:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Please provide a helpful response based on these recipes and your general knowledge about cooking."
    )
}

/// Chat completions client.
pub struct ChatClient {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatClient {
    /// Create a client from config, reading the key from `OPENAI_API_KEY`.
    pub fn new(config: &RagConfig) -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            model: config.chat.model.clone(),
            temperature: config.chat.temperature,
            max_tokens: config.chat.max_tokens,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Check if the client is usable.
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a single-turn completion request and return the reply text.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or(RagError::ChatNotConfigured)?;

        debug!("Requesting completion from model: {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::ChatApi(format!("API error: {error_text}")));
        }

        let completion: ChatCompletionResponse = response.json().await?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RagError::InvalidResponse("no choices in response".to_string()))?
            .message
            .content;

        Ok(content.unwrap_or_else(|| "No answer found".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// The full retrieve-compose-complete pipeline.
pub struct AnswerPipeline {
    retriever: Retriever,
    chat: ChatClient,
    context_limit: usize,
}

impl AnswerPipeline {
    /// Create a pipeline from its two halves.
    pub fn new(retriever: Retriever, chat: ChatClient, config: &RagConfig) -> Self {
        Self {
            retriever,
            chat,
            context_limit: config.retrieval.context_limit,
        }
    }

    /// Answer a question using retrieved context.
    ///
    /// If retrieval finds nothing above the threshold, a fixed reply is
    /// returned and the chat model is never called.
    pub async fn answer(&self, question: &str) -> Result<String> {
        let docs = self.retriever.retrieve(question, self.context_limit).await?;

        if docs.is_empty() {
            info!("No documents retrieved; skipping completion");
            return Ok(NO_CONTEXT_REPLY.to_string());
        }

        let prompt = compose_prompt(question, &docs);
        self.chat.complete(&prompt).await
    }
}
