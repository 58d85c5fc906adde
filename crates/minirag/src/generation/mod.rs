//! Answer generation with the chat model

pub mod answer;
pub mod ollama;
pub mod prompt;

pub use answer::{AnswerStream, AnswerSynthesizer, ChatEvent, ExchangePhase};
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
