//! Vector store provider trait for storing and searching chunks

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::types::{RetrievedPassage, VectorDocument};

/// Summary of an existing collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub count: usize,
}

/// Trait for a collection-oriented vector store
///
/// Documents are embedded by the store itself; callers only hand over
/// `{id, content}` pairs and free-text queries.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create an empty collection; an existing one is kept as is
    async fn create_collection(&self, name: &str) -> Result<CollectionInfo>;

    /// Look up a collection
    async fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>>;

    /// Drop a collection and all its documents; a missing one is not an error
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Embed and upsert documents, running at most `concurrency` embeddings at once
    async fn add_documents(
        &self,
        collection: &str,
        documents: Vec<VectorDocument>,
        concurrency: usize,
    ) -> Result<()>;

    /// Remove documents by id, returning how many existed
    async fn delete_documents(&self, collection: &str, ids: &[String]) -> Result<usize>;

    /// Return the `k` documents closest to `query`, most similar first.
    /// Fails if `k` exceeds the collection size.
    async fn query(&self, collection: &str, query: &str, k: usize) -> Result<Vec<RetrievedPassage>>;

    /// Number of documents in a collection
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Write a collection to `path`
    async fn export_to_file(&self, collection: &str, path: &Path) -> Result<()>;

    /// Load a collection previously written by `export_to_file`, replacing any
    /// collection of the same name
    async fn import_from_file(&self, path: &Path) -> Result<CollectionInfo>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
