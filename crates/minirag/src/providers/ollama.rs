//! Ollama-based providers for embeddings and chat
//!
//! Wraps the shared OllamaClient to implement the provider traits.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::generation::OllamaClient;
use crate::types::ChatMessage;

use super::embedding::EmbeddingProvider;
use super::llm::{ChatOptions, ChatStream, LlmProvider};

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
}

impl OllamaEmbedder {
    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama chat provider
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
}

impl OllamaLlm {
    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<ChatMessage> {
        self.client.chat(model, messages, options).await
    }

    async fn chat_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<ChatStream> {
        self.client.chat_stream(model, messages, options).await
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        self.client.list_models().await
    }

    async fn pull_model(&self, model: &str) -> Result<()> {
        self.client.pull_model(model).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Embedder and chat provider sharing one client
pub struct OllamaProvider {
    embedder: Arc<OllamaEmbedder>,
    llm: Arc<OllamaLlm>,
}

impl OllamaProvider {
    pub fn new(client: OllamaClient) -> Self {
        let client = Arc::new(client);
        Self {
            embedder: Arc::new(OllamaEmbedder::from_client(Arc::clone(&client))),
            llm: Arc::new(OllamaLlm::from_client(client)),
        }
    }

    /// Split into separate providers
    pub fn split(self) -> (Arc<OllamaEmbedder>, Arc<OllamaLlm>) {
        (self.embedder, self.llm)
    }
}
