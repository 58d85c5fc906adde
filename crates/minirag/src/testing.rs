//! Deterministic collaborators for unit tests

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::llm::{ChatOptions, ChatStream};
use crate::providers::{EmbeddingProvider, LlmProvider, LocalVectorStore};
use crate::types::ChatMessage;

/// Maps each text onto lowercase letter counts
pub struct LetterEmbedder;

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0; 26];
        for c in text.to_ascii_lowercase().chars() {
            if c.is_ascii_lowercase() {
                v[(c as u8 - b'a') as usize] += 1.0;
            }
        }
        Ok(v)
    }

    fn name(&self) -> &str {
        "letters"
    }
}

/// Embedder that fails for any text containing `poison`
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains("poison") {
            return Err(Error::embedding("refused"));
        }
        LetterEmbedder.embed(text).await
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub fn letter_store() -> Arc<LocalVectorStore> {
    Arc::new(LocalVectorStore::new(Arc::new(LetterEmbedder)))
}

/// LLM that replays fixed deltas and records what it was asked
#[derive(Default)]
pub struct ScriptedLlm {
    pub deltas: Vec<String>,
    pub fail_start: bool,
    pub fail_after: Option<usize>,
    pub online: bool,
    pub installed: Mutex<Vec<String>>,
    pub pulled: Mutex<Vec<String>>,
    pub fail_pull: bool,
    pub prompts: Mutex<Vec<String>>,
    pub options: Mutex<Vec<ChatOptions>>,
}

impl ScriptedLlm {
    pub fn replying(deltas: &[&str]) -> Self {
        Self {
            deltas: deltas.iter().map(|d| d.to_string()).collect(),
            online: true,
            ..Default::default()
        }
    }

    fn record(&self, messages: &[ChatMessage], options: ChatOptions) {
        if let Some(last) = messages.last() {
            self.prompts.lock().push(last.content.clone());
        }
        self.options.lock().push(options);
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn chat(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<ChatMessage> {
        self.record(messages, options);
        if self.fail_start {
            return Err(Error::llm("connection refused"));
        }
        Ok(ChatMessage::assistant(self.deltas.concat()))
    }

    async fn chat_stream(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<ChatStream> {
        self.record(messages, options);
        if self.fail_start {
            return Err(Error::llm("connection refused"));
        }
        let mut items: Vec<Result<ChatMessage>> = self
            .deltas
            .iter()
            .map(|d| Ok(ChatMessage::assistant(d.clone())))
            .collect();
        if let Some(n) = self.fail_after {
            items.truncate(n);
            items.push(Err(Error::llm("stream broke")));
        }
        Ok(stream::iter(items).boxed())
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(self.installed.lock().clone())
    }

    async fn pull_model(&self, model: &str) -> Result<()> {
        if self.fail_pull {
            return Err(Error::ModelPull {
                model: model.to_string(),
                message: "manifest not found".to_string(),
            });
        }
        self.pulled.lock().push(model.to_string());
        self.installed.lock().push(model.to_string());
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.online)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Counts embedding calls, delegating to [`LetterEmbedder`]
#[derive(Default)]
pub struct CountingEmbedder {
    pub calls: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        LetterEmbedder.embed(text).await
    }

    fn name(&self) -> &str {
        "counting"
    }
}
