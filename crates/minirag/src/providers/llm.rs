//! LLM provider trait for chat completion

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::ChatMessage;

/// Sampling parameters for one completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Lazy sequence of assistant deltas. Dropping it aborts the upstream request.
pub type ChatStream = BoxStream<'static, Result<ChatMessage>>;

/// Trait for chat-completion providers
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Single blocking completion
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<ChatMessage>;

    /// Start a streamed completion. An error here means the exchange never started.
    async fn chat_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<ChatStream>;

    /// Names of the installed models
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Install a model, returning once the pull has finished
    async fn pull_model(&self, model: &str) -> Result<()>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
