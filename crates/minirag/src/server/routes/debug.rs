//! Index inspection endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{DebugConfig, DebugInfo};

/// GET /debug/db - Collection and fingerprint state
pub async fn debug_db(State(state): State<AppState>) -> Result<Json<DebugInfo>> {
    let config = state.config();
    let collection = &config.indexing.collection;
    let chunk_count = state.vector_store().count(collection).await?;
    let snapshot = state.snapshot();

    Ok(Json(DebugInfo {
        collection_name: collection.clone(),
        document_count: snapshot.len(),
        chunk_count,
        metadata: snapshot.files.clone(),
        config: DebugConfig {
            provider_url: config.llm.base_url.clone(),
            chat_model: config.llm.chat_model.clone(),
            embed_model: config.llm.embed_model.clone(),
        },
    }))
}
