//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::generation::AnswerSynthesizer;
use crate::providers::{ChatOptions, LlmProvider, VectorStoreProvider};
use crate::retrieval::Retriever;
use crate::types::FingerprintSnapshot;

/// Shared application state, immutable once the server is up
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Vector store holding the indexed collection
    vector_store: Arc<dyn VectorStoreProvider>,
    /// Retrieval over the collection
    retriever: Retriever,
    /// Chat pipeline
    synthesizer: AnswerSynthesizer,
    /// Fingerprints produced by the startup indexing run
    snapshot: FingerprintSnapshot,
}

impl AppState {
    /// Assemble the state from the providers and the finished indexing run
    pub fn new(
        config: RagConfig,
        vector_store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
        snapshot: FingerprintSnapshot,
    ) -> Self {
        let retriever = Retriever::new(Arc::clone(&vector_store), config.indexing.collection.clone());
        let synthesizer = AnswerSynthesizer::new(
            retriever.clone(),
            llm,
            config.llm.chat_model.clone(),
            ChatOptions {
                temperature: config.llm.temperature,
                max_tokens: config.llm.max_tokens,
            },
            config.retrieval.chat_top_k,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                vector_store,
                retriever,
                synthesizer,
                snapshot,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the vector store
    pub fn vector_store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.inner.vector_store
    }

    /// Get the retriever
    pub fn retriever(&self) -> &Retriever {
        &self.inner.retriever
    }

    /// Get the answer synthesizer
    pub fn synthesizer(&self) -> &AnswerSynthesizer {
        &self.inner.synthesizer
    }

    /// Get the fingerprint snapshot
    pub fn snapshot(&self) -> &FingerprintSnapshot {
        &self.inner.snapshot
    }
}
