//! Provider abstractions for embeddings, chat and vector storage
//!
//! Trait-based seams so the pipeline can run against Ollama and the
//! in-process vector store, or against test doubles.

pub mod embedding;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::{ChatOptions, ChatStream, LlmProvider};
pub use local::LocalVectorStore;
pub use ollama::{OllamaEmbedder, OllamaLlm, OllamaProvider};
pub use vector_store::{CollectionInfo, VectorStoreProvider};
