//! minirag: question answering over a local document directory
//!
//! The crate keeps a directory and a semantic index of it in sync across
//! restarts (fingerprint-based incremental indexing), and answers questions
//! by retrieving relevant chunks and streaming a model answer followed by
//! the sources it was grounded on.

pub mod config;
pub mod error;
pub mod generation;
pub mod indexing;
pub mod ingestion;
pub mod providers;
pub mod readiness;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, FileType, RetrievedPassage},
    file_record::{FileRecord, FingerprintSnapshot},
    query::{ChatRequest, QueryRequest},
};
