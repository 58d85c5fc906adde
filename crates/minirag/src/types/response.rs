//! Response and stream frame types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::document::RetrievedPassage;
use super::file_record::FileRecord;

/// One chat message, also the shape of every streamed delta frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Provenance attached to every answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerMeta {
    /// Passages used as context, in retrieval order
    pub sources: Vec<RetrievedPassage>,
    /// Chat model identifier
    pub model: String,
    /// Wall-clock time since the request started
    pub processing_time_ms: u64,
}

/// Trailing frame of a streamed answer: `{"type":"meta","meta":{..}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    pub meta: AnswerMeta,
}

impl MetaFrame {
    pub fn new(meta: AnswerMeta) -> Self {
        Self {
            frame_type: "meta".to_string(),
            meta,
        }
    }
}

/// Non-streaming answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(flatten)]
    pub meta: AnswerMeta,
}

/// `GET /debug/db` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugInfo {
    pub collection_name: String,
    /// Number of indexed files
    pub document_count: usize,
    /// Number of chunks in the collection
    pub chunk_count: usize,
    pub metadata: BTreeMap<String, FileRecord>,
    pub config: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    pub provider_url: String,
    pub chat_model: String,
    pub embed_model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_frame_shape() {
        let frame = MetaFrame::new(AnswerMeta {
            sources: vec![],
            model: "gemma3:12b".to_string(),
            processing_time_ms: 12,
        });
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "meta");
        assert_eq!(value["meta"]["model"], "gemma3:12b");
        assert_eq!(value["meta"]["processing_time_ms"], 12);
        assert!(value["meta"]["sources"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_chat_response_is_flat() {
        let response = ChatResponse {
            answer: "42".to_string(),
            meta: AnswerMeta {
                sources: vec![],
                model: "m".to_string(),
                processing_time_ms: 1,
            },
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["answer"], "42");
        assert_eq!(value["model"], "m");
        assert!(value.get("meta").is_none());
    }
}
