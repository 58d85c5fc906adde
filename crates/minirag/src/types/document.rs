//! Document, chunk and passage types

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions indexed as plain text
pub const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "md", "rst", "csv", "log"];

/// Content kind of a file, resolved once from its extension
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// Read verbatim (.txt, .md, .rst, .csv, .log)
    PlainText,
    /// Page text extracted in page order
    Pdf,
    /// Anything else; silently left out of the corpus
    Unsupported,
}

impl FileType {
    /// Detect file type from extension (case-insensitive, no leading dot)
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        if ext == "pdf" {
            Self::Pdf
        } else if PLAIN_TEXT_EXTENSIONS.contains(&ext.as_str()) {
            Self::PlainText
        } else {
            Self::Unsupported
        }
    }

    /// Detect file type from a path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unsupported)
    }

    /// Check if this file type is indexed
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// A bounded slice of a document's extracted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `<relative path>#chunk-<index>`
    pub id: String,
    /// Relative path of the source file
    pub source_path: String,
    /// Position of the chunk within its file (0-based)
    pub chunk_index: usize,
    /// Chunk text
    pub content: String,
}

impl Chunk {
    /// Create a chunk; the id is derived from path and index
    pub fn new(source_path: impl Into<String>, chunk_index: usize, content: impl Into<String>) -> Self {
        let source_path = source_path.into();
        Self {
            id: Self::make_id(&source_path, chunk_index),
            source_path,
            chunk_index,
            content: content.into(),
        }
    }

    /// Deterministic chunk id
    pub fn make_id(source_path: &str, chunk_index: usize) -> String {
        format!("{}#chunk-{}", source_path, chunk_index)
    }

    /// Convert into the unit submitted to the vector store
    pub fn into_vector_document(self) -> VectorDocument {
        VectorDocument {
            id: self.id,
            content: self.content,
        }
    }
}

/// A document as handed to the vector store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorDocument {
    pub id: String,
    pub content: String,
}

/// A chunk returned by retrieval, annotated with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Chunk id
    pub id: String,
    /// Chunk text
    pub content: String,
    /// Similarity to the query (higher is closer)
    pub similarity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_path(Path::new("a/notes.md")), FileType::PlainText);
        assert_eq!(FileType::from_path(Path::new("server.LOG")), FileType::PlainText);
        assert_eq!(FileType::from_path(Path::new("report.PDF")), FileType::Pdf);
        assert_eq!(FileType::from_path(Path::new("image.png")), FileType::Unsupported);
        assert_eq!(FileType::from_path(Path::new("Makefile")), FileType::Unsupported);
        assert!(!FileType::Unsupported.is_supported());
    }

    #[test]
    fn test_chunk_id() {
        let chunk = Chunk::new("guides/setup.md", 2, "text");
        assert_eq!(chunk.id, "guides/setup.md#chunk-2");
        assert_eq!(chunk.clone().into_vector_document().id, chunk.id);
    }
}
