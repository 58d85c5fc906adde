//! Retrieval of relevant passages for a free-text query

use std::sync::Arc;

use crate::error::Result;
use crate::providers::VectorStoreProvider;
use crate::types::RetrievedPassage;

/// Query front-end over one vector store collection
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStoreProvider>,
    collection: String,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStoreProvider>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Collection queried by this retriever
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Return at most `min(k, corpus size)` passages in store order.
    ///
    /// An empty corpus yields no passages instead of an error.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>> {
        let count = self.store.count(&self.collection).await?;
        let k = k.min(count);
        if k == 0 {
            tracing::debug!("Skipping retrieval: k=0 against {} documents", count);
            return Ok(Vec::new());
        }

        let passages = self.store.query(&self.collection, query, k).await?;
        tracing::debug!("Retrieved {} passages for query", passages.len());
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::letter_store;
    use crate::types::VectorDocument;

    async fn retriever(docs: &[(&str, &str)]) -> Retriever {
        let store = letter_store();
        store.create_collection("docs").await.unwrap();
        let docs = docs
            .iter()
            .map(|(id, content)| VectorDocument {
                id: id.to_string(),
                content: content.to_string(),
            })
            .collect();
        store.add_documents("docs", docs, 2).await.unwrap();
        Retriever::new(store, "docs")
    }

    #[tokio::test]
    async fn test_k_is_clamped_to_corpus_size() {
        let retriever = retriever(&[("a", "apple"), ("b", "banana")]).await;
        let passages = retriever.retrieve("apple", 10).await.unwrap();
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].id, "a");
    }

    #[tokio::test]
    async fn test_empty_corpus_returns_nothing() {
        let retriever = retriever(&[]).await;
        assert!(retriever.retrieve("anything", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_collection_is_error() {
        let retriever = Retriever::new(letter_store(), "docs");
        assert!(retriever.retrieve("anything", 5).await.is_err());
    }
}
