//! Request types for the HTTP surface

use serde::{Deserialize, Serialize};

/// Body of `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Free-text query
    pub query: String,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user question
    pub query: String,
    /// Sampling temperature (absent or 0 means the configured default)
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Generation limit (absent or 0 means the configured default)
    #[serde(default, alias = "maxTokens")]
    pub max_tokens: Option<u32>,
    /// Stream the answer as server-sent events
    #[serde(default = "default_stream")]
    pub stream: bool,
}

fn default_stream() -> bool {
    true
}

impl ChatRequest {
    /// Create a streaming request with default parameters
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            temperature: None,
            max_tokens: None,
            stream: true,
        }
    }

    /// Temperature to send upstream
    pub fn temperature_or(&self, default: f32) -> f32 {
        match self.temperature {
            Some(t) if t != 0.0 => t,
            _ => default,
        }
    }

    /// Generation limit to send upstream
    pub fn max_tokens_or(&self, default: u32) -> u32 {
        match self.max_tokens {
            Some(n) if n != 0 => n,
            _ => default,
        }
    }
}
