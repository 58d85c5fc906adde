//! Core types for the RAG system

pub mod document;
pub mod file_record;
pub mod query;
pub mod response;

pub use document::{Chunk, FileType, RetrievedPassage, VectorDocument, PLAIN_TEXT_EXTENSIONS};
pub use file_record::{FileRecord, FingerprintSnapshot, RootCheck};
pub use query::{ChatRequest, QueryRequest};
pub use response::{AnswerMeta, ChatMessage, ChatResponse, DebugConfig, DebugInfo, MetaFrame};
