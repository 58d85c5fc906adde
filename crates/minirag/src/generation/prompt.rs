//! Prompt templates for RAG generation

use crate::types::RetrievedPassage;

/// Prompt builder for chat queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Concatenate passages into a context block, each labeled by its chunk id
    pub fn build_context(passages: &[RetrievedPassage]) -> String {
        passages
            .iter()
            .map(|p| format!("\nDocument {}:\n{}\n", p.id, p.content))
            .collect()
    }

    /// Build the instruction-augmented prompt sent as the single user message
    pub fn build_chat_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are a helpful AI assistant. Your task is to provide detailed and informative answers based on the given context.

Instructions:
1. Read the context carefully
2. Provide a complete, well-structured answer
3. If the context doesn't contain enough information, acknowledge that and provide general guidance
4. Always write full sentences and complete thoughts
5. Use markdown formatting for better readability

Context:
{context}

User Question: {question}

Important: Provide a complete, detailed response. Never stop at single words or incomplete sentences.
IMPORTANT: ANSWER IN LANGUAGE OF THE USER QUESTION.
Response:"#
        )
    }
}
