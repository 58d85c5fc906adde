//! Passage retrieval

mod search;

pub use search::Retriever;
