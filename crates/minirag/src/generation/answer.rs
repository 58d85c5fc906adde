//! Answer synthesis: retrieval, prompt construction and the streamed frame sequence

use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use crate::error::Result;
use crate::providers::llm::{ChatOptions, ChatStream};
use crate::providers::LlmProvider;
use crate::retrieval::Retriever;
use crate::types::{AnswerMeta, ChatMessage, ChatRequest, ChatResponse, MetaFrame, RetrievedPassage};

use super::prompt::PromptBuilder;

/// One frame of a streamed answer
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Provider delta, forwarded as received
    Delta(ChatMessage),
    /// Trailing provenance frame, emitted exactly once
    Meta(MetaFrame),
    /// End-of-stream marker
    Done,
}

/// Progress of a streamed exchange once the upstream call has started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    Streaming,
    MetaSent,
    Closed,
}

/// Retrieval and prompt, ready to be sent upstream
struct PreparedExchange {
    started: Instant,
    messages: Vec<ChatMessage>,
    options: ChatOptions,
    sources: Vec<RetrievedPassage>,
}

/// Drives retrieval and the language model for chat requests
pub struct AnswerSynthesizer {
    retriever: Retriever,
    llm: Arc<dyn LlmProvider>,
    model: String,
    defaults: ChatOptions,
    top_k: usize,
}

impl AnswerSynthesizer {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        defaults: ChatOptions,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            llm,
            model: model.into(),
            defaults,
            top_k,
        }
    }

    /// Chat model identifier
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn prepare(&self, request: &ChatRequest) -> Result<PreparedExchange> {
        let started = Instant::now();
        let sources = self.retriever.retrieve(&request.query, self.top_k).await?;
        let context = PromptBuilder::build_context(&sources);
        let prompt = PromptBuilder::build_chat_prompt(&request.query, &context);

        Ok(PreparedExchange {
            started,
            messages: vec![ChatMessage::user(prompt)],
            options: ChatOptions {
                temperature: request.temperature_or(self.defaults.temperature),
                max_tokens: request.max_tokens_or(self.defaults.max_tokens),
            },
            sources,
        })
    }

    /// Blocking variant: one completion, one JSON object
    pub async fn answer(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let exchange = self.prepare(request).await?;
        let reply = self
            .llm
            .chat(&self.model, &exchange.messages, exchange.options)
            .await?;

        Ok(ChatResponse {
            answer: reply.content,
            meta: AnswerMeta {
                sources: exchange.sources,
                model: self.model.clone(),
                processing_time_ms: elapsed_ms(exchange.started),
            },
        })
    }

    /// Streaming variant.
    ///
    /// Errors returned here happen before any frame exists; once a stream is
    /// returned it always ends with a meta frame followed by `Done`.
    pub async fn answer_stream(&self, request: &ChatRequest) -> Result<AnswerStream> {
        let exchange = self.prepare(request).await?;
        let upstream = self
            .llm
            .chat_stream(&self.model, &exchange.messages, exchange.options)
            .await?;

        tracing::debug!(
            "Streaming answer from {} with {} context passages",
            self.model,
            exchange.sources.len()
        );

        Ok(AnswerStream {
            phase: ExchangePhase::Streaming,
            upstream,
            sources: exchange.sources,
            model: self.model.clone(),
            started: exchange.started,
            deltas: 0,
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Frame sequence of one exchange: `Delta* Meta Done`.
///
/// Owns the upstream stream; dropping it early (client gone) drops the
/// upstream request with it.
pub struct AnswerStream {
    phase: ExchangePhase,
    upstream: ChatStream,
    sources: Vec<RetrievedPassage>,
    model: String,
    started: Instant,
    deltas: usize,
}

impl AnswerStream {
    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    fn meta_frame(&mut self) -> ChatEvent {
        self.phase = ExchangePhase::MetaSent;
        // release the upstream connection before the tail frames
        self.upstream = stream::empty().boxed();
        ChatEvent::Meta(MetaFrame::new(AnswerMeta {
            sources: std::mem::take(&mut self.sources),
            model: self.model.clone(),
            processing_time_ms: elapsed_ms(self.started),
        }))
    }
}

impl Stream for AnswerStream {
    type Item = ChatEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<ChatEvent>> {
        let this = self.get_mut();
        match this.phase {
            ExchangePhase::Streaming => match this.upstream.poll_next_unpin(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Some(Ok(delta))) => {
                    this.deltas += 1;
                    Poll::Ready(Some(ChatEvent::Delta(delta)))
                }
                Poll::Ready(Some(Err(e))) => {
                    tracing::warn!("Upstream stream failed after {} deltas: {}", this.deltas, e);
                    Poll::Ready(Some(this.meta_frame()))
                }
                Poll::Ready(None) => Poll::Ready(Some(this.meta_frame())),
            },
            ExchangePhase::MetaSent => {
                this.phase = ExchangePhase::Closed;
                tracing::debug!(
                    "Answer stream closed after {} deltas in {}ms",
                    this.deltas,
                    elapsed_ms(this.started)
                );
                Poll::Ready(Some(ChatEvent::Done))
            }
            ExchangePhase::Closed => Poll::Ready(None),
        }
    }
}

impl Drop for AnswerStream {
    fn drop(&mut self) {
        if self.phase != ExchangePhase::Closed {
            tracing::info!(
                "Client disconnected after {} deltas, cancelling generation",
                self.deltas
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::VectorStoreProvider;
    use crate::testing::{letter_store, ScriptedLlm};
    use crate::types::VectorDocument;

    const DEFAULTS: ChatOptions = ChatOptions {
        temperature: 0.7,
        max_tokens: 10000,
    };

    async fn synthesizer(llm: Arc<ScriptedLlm>, docs: &[(&str, &str)]) -> AnswerSynthesizer {
        let store = letter_store();
        store.create_collection("docs").await.unwrap();
        let docs = docs
            .iter()
            .map(|(id, content)| VectorDocument {
                id: id.to_string(),
                content: content.to_string(),
            })
            .collect();
        store.add_documents("docs", docs, 1).await.unwrap();
        AnswerSynthesizer::new(Retriever::new(store, "docs"), llm, "gemma3:12b", DEFAULTS, 10)
    }

    #[tokio::test]
    async fn test_frame_sequence() {
        let llm = Arc::new(ScriptedLlm::replying(&["Hel", "lo"]));
        let synth = synthesizer(llm.clone(), &[("a.md#chunk-0", "hello world")]).await;

        let events: Vec<ChatEvent> = synth
            .answer_stream(&ChatRequest::new("hello"))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 4);
        assert_eq!(events[0], ChatEvent::Delta(ChatMessage::assistant("Hel")));
        assert_eq!(events[1], ChatEvent::Delta(ChatMessage::assistant("lo")));
        match &events[2] {
            ChatEvent::Meta(frame) => {
                assert_eq!(frame.meta.model, "gemma3:12b");
                assert_eq!(frame.meta.sources.len(), 1);
                assert_eq!(frame.meta.sources[0].id, "a.md#chunk-0");
            }
            other => panic!("expected meta frame, got {:?}", other),
        }
        assert_eq!(events[3], ChatEvent::Done);

        let prompts = llm.prompts.lock();
        assert!(prompts[0].contains("Document a.md#chunk-0:\nhello world"));
        assert!(prompts[0].contains("User Question: hello"));
    }

    #[tokio::test]
    async fn test_empty_corpus_still_completes() {
        let llm = Arc::new(ScriptedLlm::replying(&["I don't know"]));
        let synth = synthesizer(llm, &[]).await;
        let events: Vec<ChatEvent> = synth
            .answer_stream(&ChatRequest::new("anything"))
            .await
            .unwrap()
            .collect()
            .await;

        assert!(matches!(&events[1], ChatEvent::Meta(f) if f.meta.sources.is_empty()));
        assert_eq!(events.last(), Some(&ChatEvent::Done));
    }

    #[tokio::test]
    async fn test_start_failure_emits_nothing() {
        let llm = Arc::new(ScriptedLlm {
            fail_start: true,
            ..ScriptedLlm::replying(&["x"])
        });
        let synth = synthesizer(llm, &[]).await;
        assert!(synth.answer_stream(&ChatRequest::new("q")).await.is_err());
    }

    #[tokio::test]
    async fn test_midstream_error_still_sends_meta() {
        let llm = Arc::new(ScriptedLlm {
            fail_after: Some(1),
            ..ScriptedLlm::replying(&["a", "b", "c"])
        });
        let synth = synthesizer(llm, &[]).await;
        let events: Vec<ChatEvent> = synth
            .answer_stream(&ChatRequest::new("q"))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], ChatEvent::Delta(_)));
        assert!(matches!(events[1], ChatEvent::Meta(_)));
        assert_eq!(events[2], ChatEvent::Done);
    }

    #[tokio::test]
    async fn test_phase_transitions() {
        let llm = Arc::new(ScriptedLlm::replying(&["only"]));
        let synth = synthesizer(llm, &[]).await;
        let mut stream = synth.answer_stream(&ChatRequest::new("q")).await.unwrap();

        assert_eq!(stream.phase(), ExchangePhase::Streaming);
        stream.next().await;
        assert_eq!(stream.phase(), ExchangePhase::Streaming);
        stream.next().await;
        assert_eq!(stream.phase(), ExchangePhase::MetaSent);
        assert_eq!(stream.next().await, Some(ChatEvent::Done));
        assert_eq!(stream.phase(), ExchangePhase::Closed);
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_blocking_answer_and_defaults() {
        let llm = Arc::new(ScriptedLlm::replying(&["forty", "-two"]));
        let synth = synthesizer(llm.clone(), &[("a#chunk-0", "abc")]).await;

        let mut request = ChatRequest::new("abc");
        request.temperature = Some(0.0);
        request.max_tokens = Some(128);
        let response = synth.answer(&request).await.unwrap();

        assert_eq!(response.answer, "forty-two");
        assert_eq!(response.meta.sources.len(), 1);
        let options = llm.options.lock()[0];
        assert_eq!(options.temperature, 0.7);
        assert_eq!(options.max_tokens, 128);
    }
}
