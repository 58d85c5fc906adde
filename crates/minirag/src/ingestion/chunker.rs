//! Fixed-size character windowing

use crate::types::Chunk;

/// Splits text into consecutive windows of at most `chunk_size` characters
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Maximum characters per chunk
    chunk_size: usize,
}

impl TextChunker {
    /// Create a new chunker; a size of 0 is treated as 1
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Split `text` into windows; no overlap, no boundary awareness
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        let mut start = 0;
        let mut count = 0;

        for (offset, _) in text.char_indices() {
            if count == self.chunk_size {
                pieces.push(&text[start..offset]);
                start = offset;
                count = 0;
            }
            count += 1;
        }
        if count > 0 {
            pieces.push(&text[start..]);
        }

        pieces
    }

    /// Split a file's text into identified chunks
    pub fn chunk(&self, source_path: &str, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(index, piece)| Chunk::new(source_path, index, piece))
            .collect()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(2000)
    }
}
