//! Ollama API client for embeddings and chat with retry logic

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::llm::{ChatOptions, ChatStream};
use crate::types::ChatMessage;

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// Client for bounded requests
    client: Client,
    /// Client without a total deadline, for streamed bodies
    stream_client: Client,
    /// Configuration
    config: LlmConfig,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatRequestOptions,
}

#[derive(Serialize)]
struct ChatRequestOptions {
    temperature: f32,
    num_predict: u32,
}

/// One `/api/chat` response object; streamed responses are a sequence of these
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    name: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct PullResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<String>,
}

/// True if `installed` satisfies `required`, allowing an implicit `:latest` tag
pub fn model_matches(installed: &str, required: &str) -> bool {
    if installed == required {
        return true;
    }
    let with_latest = |name: &str| {
        if name.contains(':') {
            name.to_string()
        } else {
            format!("{}:latest", name)
        }
    };
    with_latest(installed) == with_latest(required)
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let stream_client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            stream_client,
            config: config.clone(),
        })
    }

    /// Base URL of the Ollama server
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.config.max_retries;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if attempt < max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Request failed (attempt {}/{}): {}, retrying in {:?}",
                            attempt + 1,
                            max_retries + 1,
                            e,
                            delay
                        );
                        sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::llm("Unknown error")))
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        match self.client.get(self.url("/api/tags")).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Names of the locally installed models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = self.url("/api/tags");

        self.retry_request(|| {
            let url = &url;
            async move {
                let response = self
                    .client
                    .get(url.as_str())
                    .send()
                    .await
                    .map_err(|e| Error::llm(format!("Listing models failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(Error::llm(format!(
                        "Listing models failed: HTTP {}",
                        response.status()
                    )));
                }

                let tags: TagsResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::llm(format!("Failed to parse model list: {}", e)))?;

                Ok(tags.models.into_iter().map(|m| m.name).collect())
            }
        })
        .await
    }

    /// Pull a model and wait for the pull to finish
    pub async fn pull_model(&self, model: &str) -> Result<()> {
        let pull_error = |message: String| Error::ModelPull {
            model: model.to_string(),
            message,
        };

        let response = self
            .client
            .post(self.url("/api/pull"))
            .timeout(Duration::from_secs(self.config.pull_timeout_secs))
            .json(&PullRequest {
                model,
                name: model,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| pull_error(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(pull_error(format!("HTTP {} - {}", status, body)));
        }

        let pull: PullResponse = response
            .json()
            .await
            .map_err(|e| pull_error(format!("Failed to parse pull response: {}", e)))?;

        if let Some(message) = pull.error {
            return Err(pull_error(message));
        }
        if pull.status != "success" {
            return Err(pull_error(format!("unexpected status '{}'", pull.status)));
        }
        Ok(())
    }

    /// Generate an embedding using Ollama with retry
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.url("/api/embeddings");
        let model = self.config.embed_model.as_str();

        self.retry_request(|| {
            let url = &url;
            async move {
                let response = self
                    .client
                    .post(url.as_str())
                    .json(&EmbedRequest { model, prompt: text })
                    .send()
                    .await
                    .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(Error::embedding(format!(
                        "Embedding failed: HTTP {}",
                        response.status()
                    )));
                }

                let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                    Error::embedding(format!("Failed to parse embedding response: {}", e))
                })?;

                if embed_response.embedding.is_empty() {
                    return Err(Error::embedding(format!(
                        "Model '{}' returned an empty embedding",
                        model
                    )));
                }

                Ok(embed_response.embedding)
            }
        })
        .await
    }

    /// Single chat completion with retry logic
    pub async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<ChatMessage> {
        let url = self.url("/api/chat");
        tracing::info!("Generating answer with model: {}", model);

        self.retry_request(|| {
            let url = &url;
            async move {
                let response = self
                    .client
                    .post(url.as_str())
                    .json(&Self::chat_request(model, messages, options, false))
                    .send()
                    .await
                    .map_err(|e| Error::llm(format!("Chat request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::llm(format!("Chat failed: HTTP {} - {}", status, body)));
                }

                let chunk: ChatChunk = response
                    .json()
                    .await
                    .map_err(|e| Error::llm(format!("Failed to parse chat response: {}", e)))?;

                if let Some(message) = chunk.error {
                    return Err(Error::llm(message));
                }
                chunk
                    .message
                    .ok_or_else(|| Error::llm("Chat response carried no message"))
            }
        })
        .await
    }

    /// Start a streamed chat completion.
    ///
    /// Only the connection phase is bounded; the body may stream for as long
    /// as the model generates. Dropping the returned stream closes the
    /// connection, which makes Ollama stop generating.
    pub async fn chat_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<ChatStream> {
        let response = self
            .stream_client
            .post(self.url("/api/chat"))
            .json(&Self::chat_request(model, messages, options, true))
            .send()
            .await
            .map_err(|e| Error::llm(format!("Stream request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!("Stream failed: HTTP {} - {}", status, body)));
        }

        Ok(decode_chat_stream(response.bytes_stream()))
    }

    fn chat_request<'a>(
        model: &'a str,
        messages: &'a [ChatMessage],
        options: ChatOptions,
        stream: bool,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model,
            messages,
            stream,
            options: ChatRequestOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        }
    }
}

/// Splits a byte stream into lines, keeping partial lines between pushes
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every line completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
        lines
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

fn parse_stream_line(line: &str) -> Result<Option<ChatMessage>> {
    let chunk: ChatChunk = serde_json::from_str(line)
        .map_err(|e| Error::llm(format!("Malformed stream chunk: {}", e)))?;
    if let Some(message) = chunk.error {
        return Err(Error::llm(message));
    }
    Ok(chunk.message.or_else(|| {
        chunk
            .done
            .then(|| ChatMessage::assistant(String::new()))
    }))
}

struct DecodeState<S> {
    body: S,
    decoder: LineDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn an NDJSON `/api/chat` body into a stream of deltas, one per chunk
pub fn decode_chat_stream<S>(body: S) -> ChatStream
where
    S: futures::Stream<Item = reqwest::Result<Bytes>> + Send + Unpin + 'static,
{
    let state = DecodeState {
        body,
        decoder: LineDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.pending.pop_front() {
                match parse_stream_line(&line) {
                    Ok(Some(message)) => return Some((Ok(message), state)),
                    Ok(None) => continue,
                    Err(e) => {
                        state.finished = true;
                        state.pending.clear();
                        return Some((Err(e), state));
                    }
                }
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let lines = state.decoder.push(&bytes);
                    state.pending.extend(lines);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(Error::llm(format!("Stream error: {}", e))), state));
                }
                None => {
                    state.finished = true;
                    state.pending.extend(state.decoder.finish());
                }
            }
        }
    })
    .boxed()
}
