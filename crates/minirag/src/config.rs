//! Configuration for the RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name of the fingerprint snapshot inside the data directory
pub const METADATA_FILE: &str = "metadata.json";
/// File name of the vector store export inside the data directory
pub const VECTOR_DB_FILE: &str = "vectordb.json";

/// Main RAG system configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Indexing configuration
    pub indexing: IndexingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, falling back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Check values that would make indexing or retrieval meaningless
    pub fn validate(&self) -> Result<()> {
        if self.indexing.chunk_size == 0 {
            return Err(Error::Config("indexing.chunk_size must be > 0".to_string()));
        }
        if self.indexing.collection.trim().is_empty() {
            return Err(Error::Config("indexing.collection must not be empty".to_string()));
        }
        if self.retrieval.query_top_k == 0 || self.retrieval.chat_top_k == 0 {
            return Err(Error::Config("retrieval top_k values must be >= 1".to_string()));
        }
        if self.llm.chat_model.trim().is_empty() || self.llm.embed_model.trim().is_empty() {
            return Err(Error::Config("llm model names must not be empty".to_string()));
        }
        Ok(())
    }

    /// Create the document and data directories if they do not exist yet
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.indexing.docs_dir, &self.indexing.data_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    Error::Config(format!("Failed to create directory {}: {}", dir.display(), e))
                })?;
            }
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl ServerConfig {
    /// Apply a listen address of the form `host:port` or `:port`
    pub fn set_listen_addr(&mut self, addr: &str) -> Result<()> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| Error::Config(format!("Invalid listen address '{}'", addr)))?;
        self.port = port
            .parse()
            .map_err(|_| Error::Config(format!("Invalid port in listen address '{}'", addr)))?;
        if !host.is_empty() {
            self.host = host.trim_start_matches('[').trim_end_matches(']').to_string();
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7492,
            enable_cors: true,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Chat model name
    pub chat_model: String,
    /// Embedding model name
    pub embed_model: String,
    /// Default temperature when a chat request does not set one
    pub temperature: f32,
    /// Default generation limit when a chat request does not set one
    pub max_tokens: u32,
    /// Deadline for non-streaming requests in seconds
    pub timeout_secs: u64,
    /// Connect deadline in seconds (streaming requests included)
    pub connect_timeout_secs: u64,
    /// Deadline for a model pull in seconds
    pub pull_timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            chat_model: "gemma3:12b".to_string(),
            embed_model: "nomic-embed-text:latest".to_string(),
            temperature: 0.7,
            max_tokens: 10000,
            timeout_secs: 120,
            connect_timeout_secs: 10,
            pull_timeout_secs: 1800, // large models take a while
            max_retries: 2,
        }
    }
}

/// Indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Root of the document corpus
    pub docs_dir: PathBuf,
    /// Directory holding the fingerprint snapshot and the vector store export
    pub data_dir: PathBuf,
    /// Vector store collection name
    pub collection: String,
    /// Maximum characters per chunk
    pub chunk_size: usize,
    /// Drop all index state and rebuild from scratch
    pub force_reindex: bool,
    /// Parallel embedding requests per file (default: CPU count)
    pub concurrency: Option<usize>,
    /// Forget files that disappeared from the document root
    pub prune_deleted: bool,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minirag");

        Self {
            docs_dir: PathBuf::from("./docs"),
            data_dir,
            collection: "docs".to_string(),
            chunk_size: 2000,
            force_reindex: false,
            concurrency: None,
            prune_deleted: true,
        }
    }
}

impl IndexingConfig {
    /// Path of the fingerprint snapshot
    pub fn metadata_file(&self) -> PathBuf {
        self.data_dir.join(METADATA_FILE)
    }

    /// Path of the vector store export
    pub fn db_file(&self) -> PathBuf {
        self.data_dir.join(VECTOR_DB_FILE)
    }

    /// Concurrency hint handed to the vector store
    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages returned by `/query`
    pub query_top_k: usize,
    /// Passages used as chat context
    pub chat_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            query_top_k: 5,
            chat_top_k: 10,
        }
    }
}
