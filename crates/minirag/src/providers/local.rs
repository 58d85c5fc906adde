//! In-process vector store with brute-force cosine similarity
//!
//! Collections live in memory and are persisted explicitly through
//! `export_to_file` / `import_from_file`.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{RetrievedPassage, VectorDocument};

use super::embedding::EmbeddingProvider;
use super::vector_store::{CollectionInfo, VectorStoreProvider};

/// A document together with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    id: String,
    content: String,
    embedding: Vec<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    name: String,
    documents: BTreeMap<String, StoredDocument>,
}

impl Collection {
    fn info(&self) -> CollectionInfo {
        CollectionInfo {
            name: self.name.clone(),
            count: self.documents.len(),
        }
    }
}

/// Local vector store backed by an embedding provider
pub struct LocalVectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    collections: RwLock<HashMap<String, Collection>>,
}

impl LocalVectorStore {
    /// Create an empty store
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Compute cosine similarity between two vectors.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }

    fn missing(name: &str) -> Error {
        Error::vector_db(format!("Collection '{}' does not exist", name))
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn create_collection(&self, name: &str) -> Result<CollectionInfo> {
        let mut collections = self.collections.write();
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Collection {
                name: name.to_string(),
                documents: BTreeMap::new(),
            });
        Ok(collection.info())
    }

    async fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>> {
        Ok(self.collections.read().get(name).map(Collection::info))
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections.write().remove(name);
        Ok(())
    }

    async fn add_documents(
        &self,
        collection: &str,
        documents: Vec<VectorDocument>,
        concurrency: usize,
    ) -> Result<()> {
        if !self.collections.read().contains_key(collection) {
            return Err(Self::missing(collection));
        }

        let embedder = &self.embedder;
        let embedded: Vec<StoredDocument> = stream::iter(documents)
            .map(|doc| async move {
                let embedding = embedder.embed(&doc.content).await?;
                Ok::<_, Error>(StoredDocument {
                    id: doc.id,
                    content: doc.content,
                    embedding,
                })
            })
            .buffer_unordered(concurrency.max(1))
            .try_collect()
            .await?;

        let mut collections = self.collections.write();
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| Self::missing(collection))?;
        for doc in embedded {
            target.documents.insert(doc.id.clone(), doc);
        }
        Ok(())
    }

    async fn delete_documents(&self, collection: &str, ids: &[String]) -> Result<usize> {
        let mut collections = self.collections.write();
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| Self::missing(collection))?;
        Ok(ids
            .iter()
            .filter(|id| target.documents.remove(id.as_str()).is_some())
            .count())
    }

    async fn query(&self, collection: &str, query: &str, k: usize) -> Result<Vec<RetrievedPassage>> {
        let count = self.count(collection).await?;
        if k == 0 || k > count {
            return Err(Error::vector_db(format!(
                "Requested {} results but collection '{}' holds {} documents",
                k, collection, count
            )));
        }

        let query_embedding = self.embedder.embed(query).await?;

        let collections = self.collections.read();
        let target = collections
            .get(collection)
            .ok_or_else(|| Self::missing(collection))?;

        let mut scored: Vec<RetrievedPassage> = target
            .documents
            .values()
            .map(|doc| RetrievedPassage {
                id: doc.id.clone(),
                content: doc.content.clone(),
                similarity: Self::cosine_similarity(&query_embedding, &doc.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.documents.len())
            .ok_or_else(|| Self::missing(collection))
    }

    async fn export_to_file(&self, collection: &str, path: &Path) -> Result<()> {
        let json = {
            let collections = self.collections.read();
            let target = collections
                .get(collection)
                .ok_or_else(|| Self::missing(collection))?;
            serde_json::to_vec(target)?
        };

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn import_from_file(&self, path: &Path) -> Result<CollectionInfo> {
        let bytes = tokio::fs::read(path).await?;
        let collection: Collection = serde_json::from_slice(&bytes).map_err(|e| {
            Error::vector_db(format!("Invalid export {}: {}", path.display(), e))
        })?;
        let info = collection.info();
        self.collections
            .write()
            .insert(collection.name.clone(), collection);
        Ok(info)
    }

    fn name(&self) -> &str {
        "local"
    }
}
