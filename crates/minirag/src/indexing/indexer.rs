//! Incremental indexing of the document root
//!
//! A run walks the root in file-name order, re-indexes every supported file
//! whose fingerprint changed, and persists the vector export and the
//! fingerprint snapshot only after the whole walk succeeded. The first file
//! that fails aborts the run and leaves the durable state untouched.
//! Symbolic links are followed.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::config::IndexingConfig;
use crate::error::{Error, Result};
use crate::ingestion::{FileParser, TextChunker};
use crate::providers::VectorStoreProvider;
use crate::types::{Chunk, FileRecord, FileType, FingerprintSnapshot, RootCheck};

use super::change::detect_change;
use super::fingerprint::FingerprintStore;

/// Counters of one indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Regular files seen during the walk
    pub scanned: usize,
    /// Files (re-)indexed
    pub indexed: usize,
    /// Files whose fingerprint was unchanged
    pub skipped_unchanged: usize,
    /// Files with an extension outside the allow-list
    pub skipped_unsupported: usize,
    /// Chunks handed to the vector store
    pub chunks_submitted: usize,
    /// Records dropped because their file disappeared
    pub pruned: usize,
}

/// Drives change detection, extraction, chunking and the vector store
pub struct Indexer {
    config: IndexingConfig,
    root: PathBuf,
    store: Arc<dyn VectorStoreProvider>,
    fingerprints: FingerprintStore,
    chunker: TextChunker,
}

impl Indexer {
    /// Create an indexer for `config.docs_dir`, which must exist
    pub fn new(config: &IndexingConfig, store: Arc<dyn VectorStoreProvider>) -> Result<Self> {
        let root = std::fs::canonicalize(&config.docs_dir).map_err(|e| {
            Error::Config(format!(
                "Document directory {} is not accessible: {}",
                config.docs_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            fingerprints: FingerprintStore::new(config.metadata_file()),
            chunker: TextChunker::new(config.chunk_size),
            config: config.clone(),
            root,
            store,
        })
    }

    /// Canonical document root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load durable state from a previous run.
    ///
    /// A snapshot recorded against another root, or an export holding another
    /// collection, is discarded together with the vector export and the collection.
    pub async fn restore(&self) -> Result<FingerprintSnapshot> {
        let snapshot = self.fingerprints.load()?;
        let db_file = self.config.db_file();

        match snapshot.check_root(&self.root) {
            RootCheck::Matches if db_file.exists() => {
                let info = self.store.import_from_file(&db_file).await?;
                if info.name != self.config.collection {
                    tracing::warn!(
                        "Vector export holds collection '{}', not '{}'; discarding it",
                        info.name,
                        self.config.collection
                    );
                    self.store.delete_collection(&info.name).await?;
                    return self.discard().await;
                }
                tracing::info!(
                    "Restored {} files and {} chunks from {}",
                    snapshot.len(),
                    info.count,
                    self.config.data_dir.display()
                );
                Ok(snapshot)
            }
            RootCheck::Matches => {
                tracing::warn!(
                    "Vector export {} is missing, re-indexing all files",
                    db_file.display()
                );
                Ok(FingerprintSnapshot::default())
            }
            RootCheck::Fresh => {
                tracing::info!("No previous index found");
                Ok(snapshot)
            }
            RootCheck::InvalidationRequired { recorded } => {
                tracing::warn!(
                    "Index was built for {:?}, not {}; discarding it",
                    recorded,
                    self.root.display()
                );
                self.discard().await
            }
        }
    }

    /// Delete the snapshot, the vector export and the configured collection
    async fn discard(&self) -> Result<FingerprintSnapshot> {
        self.fingerprints.delete()?;
        match std::fs::remove_file(self.config.db_file()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.store.delete_collection(&self.config.collection).await?;
        Ok(FingerprintSnapshot::default())
    }

    /// Run one indexing pass, returning the updated snapshot
    pub async fn run(
        &self,
        mut snapshot: FingerprintSnapshot,
    ) -> Result<(FingerprintSnapshot, IndexReport)> {
        let collection = self.config.collection.as_str();

        if self.store.get_collection(collection).await?.is_none() {
            self.store.create_collection(collection).await?;
        }

        if self.config.force_reindex {
            tracing::info!("Force reindex: clearing metadata and collection '{}'", collection);
            snapshot.files.clear();
            self.store.delete_collection(collection).await?;
            self.store.create_collection(collection).await?;
        }

        tracing::info!(
            "Indexing {} ({} files recorded)",
            self.root.display(),
            snapshot.len()
        );

        let mut report = IndexReport::default();
        let mut seen = HashSet::new();

        for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Indexing {
                path: e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            report.scanned += 1;

            let rel = relative_path(&self.root, entry.path());
            if !FileType::from_path(entry.path()).is_supported() {
                tracing::debug!("Skipping unsupported file: {}", rel);
                report.skipped_unsupported += 1;
                continue;
            }
            seen.insert(rel.clone());

            let stat_error = |message: String| Error::Indexing {
                path: rel.clone(),
                message,
            };
            let metadata = entry.metadata().map_err(|e| stat_error(e.to_string()))?;
            let modified: DateTime<Utc> = metadata
                .modified()
                .map_err(|e| stat_error(e.to_string()))?
                .into();
            let size = metadata.len();

            let previous = snapshot.get(&rel);
            let Some(reason) =
                detect_change(previous, modified, size, self.config.force_reindex)
            else {
                tracing::debug!("Skipping unchanged file: {}", rel);
                report.skipped_unchanged += 1;
                continue;
            };
            let previous_chunks = previous.map(|r| r.chunk_count).unwrap_or(0);

            let chunk_count = self
                .index_file(&rel, entry.path(), previous_chunks)
                .await
                .map_err(|e| Error::indexing(&rel, &e))?;

            snapshot.insert(FileRecord {
                path: rel.clone(),
                last_modified: modified,
                size,
                chunk_count,
            });
            report.indexed += 1;
            report.chunks_submitted += chunk_count;
            tracing::info!("Indexed {} ({}, {} chunks)", rel, reason, chunk_count);
        }

        if self.config.prune_deleted {
            report.pruned = self.prune(&mut snapshot, &seen).await?;
        }

        snapshot.recorded_root = Some(self.root.clone());
        self.persist(&snapshot).await?;

        tracing::info!(
            "Indexing finished: {} scanned, {} indexed, {} unchanged, {} unsupported, {} chunks, {} pruned",
            report.scanned,
            report.indexed,
            report.skipped_unchanged,
            report.skipped_unsupported,
            report.chunks_submitted,
            report.pruned
        );

        Ok((snapshot, report))
    }

    /// Extract, chunk and submit one file; returns its chunk count
    async fn index_file(&self, rel: &str, path: &Path, previous_chunks: usize) -> Result<usize> {
        let owned = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || FileParser::extract(&owned))
            .await
            .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))??;

        let documents: Vec<_> = self
            .chunker
            .chunk(rel, &text)
            .into_iter()
            .map(Chunk::into_vector_document)
            .collect();
        let count = documents.len();

        if count > 0 {
            self.store
                .add_documents(&self.config.collection, documents, self.config.concurrency())
                .await?;
        }

        if previous_chunks > count {
            let stale: Vec<String> = (count..previous_chunks)
                .map(|i| Chunk::make_id(rel, i))
                .collect();
            let removed = self
                .store
                .delete_documents(&self.config.collection, &stale)
                .await?;
            tracing::debug!("Removed {} stale chunks of {}", removed, rel);
        }

        Ok(count)
    }

    /// Drop records (and chunks) of files that are gone from the root
    async fn prune(&self, snapshot: &mut FingerprintSnapshot, seen: &HashSet<String>) -> Result<usize> {
        let gone: Vec<String> = snapshot
            .files
            .keys()
            .filter(|path| !seen.contains(*path))
            .cloned()
            .collect();

        for path in &gone {
            if let Some(record) = snapshot.files.remove(path) {
                let ids: Vec<String> = (0..record.chunk_count)
                    .map(|i| Chunk::make_id(path, i))
                    .collect();
                if !ids.is_empty() {
                    self.store
                        .delete_documents(&self.config.collection, &ids)
                        .await?;
                }
                tracing::info!("Pruned deleted file: {}", path);
            }
        }

        Ok(gone.len())
    }

    /// Vector export first, then the snapshot
    async fn persist(&self, snapshot: &FingerprintSnapshot) -> Result<()> {
        self.store
            .export_to_file(&self.config.collection, &self.config.db_file())
            .await?;
        self.fingerprints.save(snapshot)
    }
}

/// Path of `path` below `root` with `/` separators
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
